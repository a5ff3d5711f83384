//! One call per operation: validate, render, run once, decode.

use thiserror::Error;
use tracing::debug;

use crate::command::{
    Command, NewProject, NewTask, ProjectDraft, TaskDraft, TaskUpdate, UpdateDraft,
    ValidationError,
};
use crate::container::{Container, ResolutionPlan, JSON_FALLBACK, LIST_FALLBACK};
use crate::decode::{decode_records, parse_listing, ListedItem, TaskRecord};
use crate::host_value::{self, HostValueError};
use crate::runner::{ExecError, ScriptRunner};
use crate::script::{render, Script, DEFAULT_APP_NAME};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Parse(#[from] HostValueError),
}

pub struct ThingsClient<R: ScriptRunner> {
    runner: R,
    app_name: String,
}

impl<R: ScriptRunner> ThingsClient<R> {
    pub fn new(runner: R) -> Self {
        Self::with_app_name(runner, DEFAULT_APP_NAME)
    }

    pub fn with_app_name(runner: R, app_name: impl Into<String>) -> Self {
        Self {
            runner,
            app_name: app_name.into(),
        }
    }

    pub fn script(&self, command: &Command) -> Script {
        render(command, &self.app_name)
    }

    fn execute(&self, command: &Command) -> Result<String, ExecError> {
        let script = self.script(command);
        debug!(operation = command.name(), "executing");
        self.runner.run(&script)
    }

    fn execute_text(&self, command: &Command) -> Result<String, ClientError> {
        let raw = self.execute(command)?;
        Ok(host_value::parse_text(&raw)?)
    }

    /// Creates a to-do and returns its id.
    pub fn add_task(&self, draft: &TaskDraft) -> Result<String, ClientError> {
        let task = NewTask::try_from(draft)?;
        self.execute_text(&Command::AddTask(task))
    }

    /// Applies the supplied changes and returns the to-do's id.
    pub fn update_task(&self, draft: &UpdateDraft) -> Result<String, ClientError> {
        let update = TaskUpdate::try_from(draft)?;
        self.execute_text(&Command::UpdateTask(update))
    }

    /// Marks a to-do completed and returns the name it had.
    pub fn complete_task(&self, id: &str) -> Result<String, ClientError> {
        let command = Command::complete_task(id)?;
        self.execute_text(&command)
    }

    /// Lists to-dos of a built-in list, or of the first project or area the
    /// name resolves to (ids before names).
    pub fn list(&self, name: &str, with_ids: bool) -> Result<Vec<ListedItem>, ClientError> {
        let plan = ResolutionPlan::new(name, &LIST_FALLBACK)?;
        let raw = plan.resolve(|container| {
            self.attempt(container, |container| Command::ListTasks {
                container,
                with_ids,
            })
        })?;
        Ok(parse_listing(&host_value::parse_text(&raw)?, with_ids))
    }

    /// Lists to-dos with full metadata. Only names are tried for projects
    /// and areas here.
    pub fn list_json(&self, name: &str) -> Result<Vec<TaskRecord>, ClientError> {
        let plan = ResolutionPlan::new(name, &JSON_FALLBACK)?;
        let raw = plan.resolve(|container| {
            self.attempt(container, |container| Command::ListTasksJson { container })
        })?;
        Ok(decode_records(&host_value::parse(&raw)?))
    }

    fn attempt(
        &self,
        container: &Container,
        build: impl FnOnce(Container) -> Command,
    ) -> Result<String, ExecError> {
        debug!(kind = container.kind(), "trying container");
        let result = self.execute(&build(container.clone()));
        if let Err(err) = &result {
            debug!(kind = container.kind(), error = %err, "container lookup failed");
        }
        result
    }

    pub fn add_project(&self, draft: &ProjectDraft) -> Result<String, ClientError> {
        let project = NewProject::try_from(draft)?;
        self.execute_text(&Command::AddProject(project))
    }

    pub fn list_projects(&self, with_ids: bool) -> Result<Vec<ListedItem>, ClientError> {
        let text = self.execute_text(&Command::ListProjects { with_ids })?;
        Ok(parse_listing(&text, with_ids))
    }

    pub fn add_area(&self, name: &str) -> Result<String, ClientError> {
        let command = Command::add_area(name)?;
        self.execute_text(&command)
    }

    pub fn list_areas(&self, with_ids: bool) -> Result<Vec<ListedItem>, ClientError> {
        let text = self.execute_text(&Command::ListAreas { with_ids })?;
        Ok(parse_listing(&text, with_ids))
    }

    pub fn add_tag(&self, name: &str) -> Result<String, ClientError> {
        let command = Command::add_tag(name)?;
        self.execute_text(&command)
    }

    pub fn list_tags(&self) -> Result<Vec<String>, ClientError> {
        let text = self.execute_text(&Command::ListTags)?;
        Ok(parse_listing(&text, false)
            .into_iter()
            .map(|item| item.name)
            .collect())
    }

    pub fn quick_entry(&self, name: Option<&str>, notes: Option<&str>) -> Result<(), ClientError> {
        self.execute(&Command::quick_entry(name, notes))?;
        Ok(())
    }
}
