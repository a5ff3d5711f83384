//! Where a to-do lives: a built-in list, a project, or an area.

use std::fmt;
use std::str::FromStr;

use crate::command::{require, ValidationError};
use crate::escape::quoted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedList {
    Inbox,
    Today,
    Anytime,
    Someday,
    Upcoming,
    Logbook,
}

impl NamedList {
    pub const ALL: [NamedList; 6] = [
        NamedList::Inbox,
        NamedList::Today,
        NamedList::Anytime,
        NamedList::Someday,
        NamedList::Upcoming,
        NamedList::Logbook,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NamedList::Inbox => "Inbox",
            NamedList::Today => "Today",
            NamedList::Anytime => "Anytime",
            NamedList::Someday => "Someday",
            NamedList::Upcoming => "Upcoming",
            NamedList::Logbook => "Logbook",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|list| list.as_str() == name)
    }
}

impl fmt::Display for NamedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamedList {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::lookup(value).ok_or_else(|| ValidationError::UnknownList(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    List(NamedList),
    ProjectId(String),
    ProjectName(String),
    AreaId(String),
    AreaName(String),
}

impl Container {
    /// The AppleScript object specifier, e.g. `project id "abc"`.
    pub fn specifier(&self) -> String {
        match self {
            Container::List(list) => format!("list {}", quoted(list.as_str())),
            Container::ProjectId(id) => format!("project id {}", quoted(id)),
            Container::ProjectName(name) => format!("project {}", quoted(name)),
            Container::AreaId(id) => format!("area id {}", quoted(id)),
            Container::AreaName(name) => format!("area {}", quoted(name)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Container::List(_) => "list",
            Container::ProjectId(_) => "project-id",
            Container::ProjectName(_) => "project",
            Container::AreaId(_) => "area-id",
            Container::AreaName(_) => "area",
        }
    }
}

/// One step of a lookup for a name that is not a built-in list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackLevel {
    ProjectById,
    ProjectByName,
    AreaById,
    AreaByName,
}

impl FallbackLevel {
    fn container(self, name: &str) -> Container {
        let name = name.to_string();
        match self {
            FallbackLevel::ProjectById => Container::ProjectId(name),
            FallbackLevel::ProjectByName => Container::ProjectName(name),
            FallbackLevel::AreaById => Container::AreaId(name),
            FallbackLevel::AreaByName => Container::AreaName(name),
        }
    }
}

/// Lookup order for plain and id listings.
pub const LIST_FALLBACK: [FallbackLevel; 4] = [
    FallbackLevel::ProjectById,
    FallbackLevel::ProjectByName,
    FallbackLevel::AreaById,
    FallbackLevel::AreaByName,
];

/// Lookup order for JSON listings. Skips the id levels that LIST_FALLBACK
/// tries; kept as-is until someone confirms which depth is intended.
pub const JSON_FALLBACK: [FallbackLevel; 2] =
    [FallbackLevel::ProjectByName, FallbackLevel::AreaByName];

/// Ordered containers to try for a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    primary: Container,
    fallbacks: Vec<Container>,
}

impl ResolutionPlan {
    pub fn new(name: &str, policy: &[FallbackLevel]) -> Result<Self, ValidationError> {
        let name = require("list name", name)?;
        if let Some(list) = NamedList::lookup(&name) {
            return Ok(Self {
                primary: Container::List(list),
                fallbacks: Vec::new(),
            });
        }
        let mut candidates = policy.iter().map(|level| level.container(&name));
        let primary = candidates
            .next()
            .unwrap_or_else(|| Container::ProjectName(name.clone()));
        Ok(Self {
            primary,
            fallbacks: candidates.collect(),
        })
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Container> {
        std::iter::once(&self.primary).chain(self.fallbacks.iter())
    }

    /// Runs `attempt` per candidate until one succeeds. When every candidate
    /// fails, the last failure is returned.
    pub fn resolve<T, E>(
        &self,
        mut attempt: impl FnMut(&Container) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut result = attempt(&self.primary);
        for next in &self.fallbacks {
            if result.is_ok() {
                break;
            }
            result = attempt(next);
        }
        result
    }
}

/// Raw target options for creating or moving a to-do.
#[derive(Debug, Clone, Default)]
pub struct TargetHints {
    pub list: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub area_id: Option<String>,
    pub area_name: Option<String>,
}

impl TargetHints {
    pub fn is_empty(&self) -> bool {
        self.list.is_none()
            && self.project_id.is_none()
            && self.project_name.is_none()
            && self.area_id.is_none()
            && self.area_name.is_none()
    }

    /// The single honored target: list > project id > project name > area id
    /// > area name. Lower-ranked hints are ignored.
    pub fn attachment(&self) -> Result<Option<Container>, ValidationError> {
        if let Some(list) = &self.list {
            return list.trim().parse::<NamedList>().map(|list| Some(Container::List(list)));
        }
        if let Some(id) = &self.project_id {
            return require("project id", id).map(|id| Some(Container::ProjectId(id)));
        }
        if let Some(name) = &self.project_name {
            return require("project name", name).map(|name| Some(Container::ProjectName(name)));
        }
        if let Some(id) = &self.area_id {
            return require("area id", id).map(|id| Some(Container::AreaId(id)));
        }
        if let Some(name) = &self.area_name {
            return require("area name", name).map(|name| Some(Container::AreaName(name)));
        }
        Ok(None)
    }
}
