//! AppleScript rendering for [`Command`]. Every quoting and ordering rule
//! lives here.

use std::fmt;

use crate::command::{Command, NewProject, NewTask, Relink, TaskUpdate};
use crate::container::Container;
use crate::dates::date_statements;
use crate::decode::join_tags;
use crate::escape::quoted;

pub const DEFAULT_APP_NAME: &str = "Things3";

const INDENT: &str = "    ";
const DUE_DATE_VAR: &str = "dueDate";

/// Script text for one operation. Built once, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script(String);

impl Script {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional task fields substituted with the `null` sentinel when Things
/// cannot produce them.
const OPTIONAL_DATE_FIELDS: [(&str, &str); 4] = [
    ("dueDate", "due date"),
    ("activationDate", "activation date"),
    ("completionDate", "completion date"),
    ("cancellationDate", "cancellation date"),
];

const OPTIONAL_NAME_FIELDS: [(&str, &str); 2] = [("project", "project"), ("area", "area")];

struct ScriptWriter {
    lines: Vec<String>,
    depth: usize,
}

impl ScriptWriter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", INDENT.repeat(self.depth), text.as_ref()));
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn finish(self) -> Script {
        Script(self.lines.join("\n") + "\n")
    }
}

/// Renders `command` as a script addressed to `app_name`.
pub fn render(command: &Command, app_name: &str) -> Script {
    let mut w = ScriptWriter::new();
    w.open(format!("tell application {}", quoted(app_name)));
    match command {
        Command::AddTask(task) => add_task(&mut w, task),
        Command::UpdateTask(update) => update_task(&mut w, update),
        Command::CompleteTask { id } => {
            w.line(format!("set theToDo to to do id {}", quoted(id)));
            w.line("set toDoName to name of theToDo");
            w.line("set status of theToDo to completed");
            w.line("return toDoName");
        }
        Command::ListTasks {
            container,
            with_ids,
        } => {
            let item = if *with_ids {
                "(id of theToDo) & tab & (name of theToDo)"
            } else {
                "name of theToDo"
            };
            list_lines(
                &mut w,
                "theToDo",
                &format!("to dos of {}", container.specifier()),
                item,
            );
        }
        Command::ListTasksJson { container } => list_records(&mut w, container),
        Command::AddProject(project) => add_project(&mut w, project),
        Command::ListProjects { with_ids } => {
            let item = if *with_ids {
                "(id of theProject) & tab & (name of theProject)"
            } else {
                "name of theProject"
            };
            list_lines(&mut w, "theProject", "projects", item);
        }
        Command::AddArea { name } => {
            w.line(format!(
                "set newArea to make new area with properties {{name:{}}}",
                quoted(name)
            ));
            w.line("return id of newArea");
        }
        Command::ListAreas { with_ids } => {
            let item = if *with_ids {
                "(id of theArea) & tab & (name of theArea)"
            } else {
                "name of theArea"
            };
            list_lines(&mut w, "theArea", "areas", item);
        }
        Command::AddTag { name } => {
            w.line(format!(
                "set newTag to make new tag with properties {{name:{}}}",
                quoted(name)
            ));
            w.line("return name of newTag");
        }
        Command::ListTags => list_lines(&mut w, "theTag", "tags", "name of theTag"),
        Command::QuickEntry { name, notes } => {
            let mut props = Vec::new();
            if let Some(name) = name {
                props.push(format!("name:{}", quoted(name)));
            }
            if let Some(notes) = notes {
                props.push(format!("notes:{}", quoted(notes)));
            }
            if props.is_empty() {
                w.line("show quick entry panel");
            } else {
                w.line(format!(
                    "show quick entry panel with properties {{{}}}",
                    props.join(", ")
                ));
            }
        }
    }
    w.close("end tell");
    w.finish()
}

fn add_task(w: &mut ScriptWriter, task: &NewTask) {
    let mut props = vec![format!("name:{}", quoted(&task.title))];
    if let Some(notes) = &task.notes {
        props.push(format!("notes:{}", quoted(notes)));
    }
    if !task.tags.is_empty() {
        props.push(format!("tag names:{}", quoted(&join_tags(&task.tags))));
    }
    let mut statement = format!(
        "set newToDo to make new to do with properties {{{}}}",
        props.join(", ")
    );
    if let Some(target) = &task.target {
        statement.push_str(&format!(" at beginning of {}", target.specifier()));
    }
    w.line(statement);
    // Things rejects due date inside the creation properties.
    if let Some(due) = task.due {
        for line in date_statements(DUE_DATE_VAR, due) {
            w.line(line);
        }
        w.line(format!("set due date of newToDo to {}", DUE_DATE_VAR));
    }
    w.line("return id of newToDo");
}

fn update_task(w: &mut ScriptWriter, update: &TaskUpdate) {
    w.line(format!("set theToDo to to do id {}", quoted(&update.id)));
    if let Some(title) = &update.title {
        w.line(format!("set name of theToDo to {}", quoted(title)));
    }
    if let Some(notes) = &update.notes {
        w.line(format!("set notes of theToDo to {}", quoted(notes)));
    }
    if let Some(tags) = &update.tags {
        w.line(format!(
            "set tag names of theToDo to {}",
            quoted(&join_tags(tags))
        ));
    }
    if let Some(due) = update.due {
        for line in date_statements(DUE_DATE_VAR, due) {
            w.line(line);
        }
        w.line(format!("set due date of theToDo to {}", DUE_DATE_VAR));
    }
    relink(w, "project", update.project.as_ref());
    relink(w, "area", update.area.as_ref());
    w.line("return id of theToDo");
}

fn relink(w: &mut ScriptWriter, property: &str, change: Option<&Relink>) {
    match change {
        Some(Relink::Detach) => w.line(format!("delete {} of theToDo", property)),
        Some(Relink::Attach(target)) => w.line(format!(
            "set {} of theToDo to {}",
            property,
            target.specifier()
        )),
        None => {}
    }
}

fn add_project(w: &mut ScriptWriter, project: &NewProject) {
    let mut props = vec![format!("name:{}", quoted(&project.name))];
    if let Some(notes) = &project.notes {
        props.push(format!("notes:{}", quoted(notes)));
    }
    w.line(format!(
        "set newProject to make new project with properties {{{}}}",
        props.join(", ")
    ));
    if let Some(area) = &project.area {
        w.line(format!(
            "set area of newProject to {}",
            Container::AreaName(area.clone()).specifier()
        ));
    }
    w.line("return id of newProject");
}

/// Collects one line per item and returns them joined by linefeeds.
fn list_lines(w: &mut ScriptWriter, var: &str, source: &str, item: &str) {
    w.line("set output to {}");
    w.open(format!("repeat with {} in {}", var, source));
    w.line(format!("set end of output to {}", item));
    w.close("end repeat");
    w.line("set AppleScript's text item delimiters to linefeed");
    w.line("set outputText to output as text");
    w.line("set AppleScript's text item delimiters to \"\"");
    w.line("return outputText");
}

fn list_records(w: &mut ScriptWriter, container: &Container) {
    w.line("set output to {}");
    w.open(format!("repeat with theToDo in to dos of {}", container.specifier()));
    for (label, property) in OPTIONAL_DATE_FIELDS {
        guarded(w, label, &format!("({} of theToDo) as string", property));
    }
    for (label, property) in OPTIONAL_NAME_FIELDS {
        guarded(w, label, &format!("name of {} of theToDo", property));
    }
    let mut fields = vec![
        "id:(id of theToDo)".to_string(),
        "name:(name of theToDo)".to_string(),
        "notes:(notes of theToDo)".to_string(),
        "status:((status of theToDo) as string)".to_string(),
        "tagNames:(tag names of theToDo)".to_string(),
        "creationDate:((creation date of theToDo) as string)".to_string(),
        "modificationDate:((modification date of theToDo) as string)".to_string(),
    ];
    for (label, _) in OPTIONAL_DATE_FIELDS.iter().chain(OPTIONAL_NAME_FIELDS.iter()) {
        fields.push(format!("{}:{}Value", label, label));
    }
    w.line(format!("set end of output to {{{}}}", fields.join(", ")));
    w.close("end repeat");
    w.line("return output");
}

/// `<label>Value` defaults to "null" and keeps that value if `expr` fails.
fn guarded(w: &mut ScriptWriter, label: &str, expr: &str) {
    w.line(format!("set {}Value to \"null\"", label));
    w.open("try");
    w.line(format!("set {}Value to {}", label, expr));
    w.close("end try");
}
