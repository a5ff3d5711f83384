//! Typed operations. Each variant carries fields that already passed
//! validation, so rendering never has to reject anything.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::container::{Container, TargetHints};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("Invalid due date '{0}': expected YYYY-MM-DD")]
    InvalidDueDate(String),
    #[error("Invalid due date '{0}': not a calendar date")]
    InvalidCalendarDate(String),
    #[error("Unknown list '{0}'. Valid lists: Inbox, Today, Anytime, Someday, Upcoming, Logbook")]
    UnknownList(String),
    #[error("Nothing to update for to-do '{0}'")]
    NoChanges(String),
}

/// Trims `value` and rejects it when nothing is left.
pub fn require(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed.to_string())
}

fn due_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid due date regex"))
}

pub fn parse_due_date(value: &str) -> Result<NaiveDate, ValidationError> {
    if !due_date_regex().is_match(value) {
        return Err(ValidationError::InvalidDueDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidCalendarDate(value.to_string()))
}

/// Splits `a, b,c` into trimmed, non-empty tag names in the order given.
pub fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Caller input for `add`.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub due: Option<String>,
    pub target: TargetHints,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub due: Option<NaiveDate>,
    pub target: Option<Container>,
}

impl TryFrom<&TaskDraft> for NewTask {
    type Error = ValidationError;

    fn try_from(draft: &TaskDraft) -> Result<Self, Self::Error> {
        let title = require("title", &draft.title)?;
        let due = draft.due.as_deref().map(parse_due_date).transpose()?;
        let target = draft.target.attachment()?;
        Ok(NewTask {
            title,
            notes: non_blank(draft.notes.as_ref()),
            tags: draft.tags.as_deref().map(parse_tag_list).unwrap_or_default(),
            due,
            target,
        })
    }
}

/// Caller input for `update`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateDraft {
    pub id: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub due: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub no_project: bool,
    pub area_id: Option<String>,
    pub area_name: Option<String>,
    pub no_area: bool,
}

/// Change of project or area membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relink {
    Attach(Container),
    Detach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub id: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub due: Option<NaiveDate>,
    pub project: Option<Relink>,
    pub area: Option<Relink>,
}

impl TaskUpdate {
    pub fn is_noop(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.tags.is_none()
            && self.due.is_none()
            && self.project.is_none()
            && self.area.is_none()
    }
}

fn relink(
    detach: bool,
    id: Option<&String>,
    name: Option<&String>,
    id_field: &'static str,
    name_field: &'static str,
    by_id: fn(String) -> Container,
    by_name: fn(String) -> Container,
) -> Result<Option<Relink>, ValidationError> {
    if detach {
        return Ok(Some(Relink::Detach));
    }
    if let Some(id) = id {
        return Ok(Some(Relink::Attach(by_id(require(id_field, id)?))));
    }
    if let Some(name) = name {
        return Ok(Some(Relink::Attach(by_name(require(name_field, name)?))));
    }
    Ok(None)
}

impl TryFrom<&UpdateDraft> for TaskUpdate {
    type Error = ValidationError;

    fn try_from(draft: &UpdateDraft) -> Result<Self, Self::Error> {
        let id = require("id", &draft.id)?;
        let title = draft
            .title
            .as_deref()
            .map(|title| require("title", title))
            .transpose()?;
        let due = draft.due.as_deref().map(parse_due_date).transpose()?;
        let project = relink(
            draft.no_project,
            draft.project_id.as_ref(),
            draft.project_name.as_ref(),
            "project id",
            "project name",
            Container::ProjectId,
            Container::ProjectName,
        )?;
        let area = relink(
            draft.no_area,
            draft.area_id.as_ref(),
            draft.area_name.as_ref(),
            "area id",
            "area name",
            Container::AreaId,
            Container::AreaName,
        )?;
        let update = TaskUpdate {
            id,
            title,
            notes: draft.notes.clone(),
            tags: draft.tags.as_deref().map(parse_tag_list),
            due,
            project,
            area,
        };
        if update.is_noop() {
            return Err(ValidationError::NoChanges(update.id));
        }
        Ok(update)
    }
}

/// Caller input for `project add`.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub name: String,
    pub notes: Option<String>,
    pub area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub notes: Option<String>,
    pub area: Option<String>,
}

impl TryFrom<&ProjectDraft> for NewProject {
    type Error = ValidationError;

    fn try_from(draft: &ProjectDraft) -> Result<Self, Self::Error> {
        Ok(NewProject {
            name: require("project name", &draft.name)?,
            notes: non_blank(draft.notes.as_ref()),
            area: draft
                .area
                .as_deref()
                .map(|area| require("area name", area))
                .transpose()?,
        })
    }
}

/// One variant per operation sent to Things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddTask(NewTask),
    UpdateTask(TaskUpdate),
    CompleteTask { id: String },
    ListTasks { container: Container, with_ids: bool },
    ListTasksJson { container: Container },
    AddProject(NewProject),
    ListProjects { with_ids: bool },
    AddArea { name: String },
    ListAreas { with_ids: bool },
    AddTag { name: String },
    ListTags,
    QuickEntry { name: Option<String>, notes: Option<String> },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddTask(_) => "add-task",
            Command::UpdateTask(_) => "update-task",
            Command::CompleteTask { .. } => "complete-task",
            Command::ListTasks { .. } => "list-tasks",
            Command::ListTasksJson { .. } => "list-tasks-json",
            Command::AddProject(_) => "add-project",
            Command::ListProjects { .. } => "list-projects",
            Command::AddArea { .. } => "add-area",
            Command::ListAreas { .. } => "list-areas",
            Command::AddTag { .. } => "add-tag",
            Command::ListTags => "list-tags",
            Command::QuickEntry { .. } => "quick-entry",
        }
    }

    pub fn complete_task(id: &str) -> Result<Self, ValidationError> {
        Ok(Command::CompleteTask {
            id: require("id", id)?,
        })
    }

    pub fn add_area(name: &str) -> Result<Self, ValidationError> {
        Ok(Command::AddArea {
            name: require("area name", name)?,
        })
    }

    pub fn add_tag(name: &str) -> Result<Self, ValidationError> {
        Ok(Command::AddTag {
            name: require("tag name", name)?,
        })
    }

    pub fn quick_entry(name: Option<&str>, notes: Option<&str>) -> Self {
        let keep = |value: Option<&str>| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };
        Command::QuickEntry {
            name: keep(name),
            notes: keep(notes),
        }
    }
}
