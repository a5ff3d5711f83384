#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use things_core::runner::ExecError;
use things_core::script::Script;

/// Stands in for Things: records every script and answers from a queue.
/// An exhausted queue answers with empty output.
pub struct FakeHost {
    scripts: RefCell<Vec<String>>,
    replies: RefCell<VecDeque<Result<String, ExecError>>>,
}

impl FakeHost {
    pub fn new(replies: Vec<Result<String, ExecError>>) -> Self {
        Self {
            scripts: RefCell::new(Vec::new()),
            replies: RefCell::new(replies.into()),
        }
    }

    pub fn runner(&self) -> impl Fn(&Script) -> Result<String, ExecError> + '_ {
        move |script: &Script| {
            self.scripts.borrow_mut().push(script.to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }
}

pub fn not_found(what: &str) -> Result<String, ExecError> {
    Err(ExecError::NotFound(format!("Can’t get {what}. not found")))
}

/// Script lines without indentation or the surrounding tell block.
pub fn body(script: &str) -> Vec<String> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("tell application") && *line != "end tell")
        .map(str::to_string)
        .collect()
}
