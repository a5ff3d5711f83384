//! Running scripts against Things.

use std::collections::HashMap;
use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::script::{Script, DEFAULT_APP_NAME};

pub const OSASCRIPT_CMD_ENV: &str = "THINGS_OSASCRIPT_CMD";

const NOT_RUNNING_MARKERS: [&str; 3] = [
    "Application isn't running",
    "Application isn’t running",
    "(-600)",
];

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Things is not running. Launch it and try again. ({0})")]
    AppNotRunning(String),
    #[error("Things reported an error: {0}")]
    App(String),
    #[error("{0}")]
    Other(String),
    #[error("osascript not found. Set THINGS_OSASCRIPT_CMD or osascript_cmd in the config file.")]
    MissingOsascript,
    #[error("Failed to run osascript: {0}")]
    Launch(#[from] std::io::Error),
}

/// Sorts a raw failure message into a coarse category by substring.
pub fn classify_failure(message: &str, app_name: &str) -> ExecError {
    let message = message.trim().to_string();
    if message.contains("not found") {
        return ExecError::NotFound(message);
    }
    if NOT_RUNNING_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
    {
        return ExecError::AppNotRunning(message);
    }
    if !app_name.is_empty() && message.contains(app_name) {
        return ExecError::App(message);
    }
    ExecError::Other(message)
}

/// Executes script text and returns the host's raw textual result.
pub trait ScriptRunner {
    fn run(&self, script: &Script) -> Result<String, ExecError>;
}

impl<F> ScriptRunner for F
where
    F: Fn(&Script) -> Result<String, ExecError>,
{
    fn run(&self, script: &Script) -> Result<String, ExecError> {
        self(script)
    }
}

/// Pipes scripts to `osascript -s s`.
#[derive(Debug, Clone)]
pub struct OsascriptRunner {
    command: Vec<String>,
    app_name: String,
}

impl OsascriptRunner {
    pub fn new(command: Vec<String>, app_name: impl Into<String>) -> Self {
        Self {
            command: ensure_source_output(command),
            app_name: app_name.into(),
        }
    }

    /// Picks the command from, in order: `cmd`, `THINGS_OSASCRIPT_CMD`, and
    /// `osascript` on PATH.
    pub fn resolve(
        cmd: Option<&str>,
        app_name: Option<&str>,
        env_map: Option<HashMap<String, String>>,
    ) -> Result<Self, ExecError> {
        let app_name = app_name.unwrap_or(DEFAULT_APP_NAME);
        let env_map = env_map.unwrap_or_else(|| env::vars().collect());
        let configured = env_map
            .get(OSASCRIPT_CMD_ENV)
            .map(String::as_str)
            .or(cmd)
            .filter(|value| !value.trim().is_empty());
        if let Some(configured) = configured {
            let parts = shell_words::split(configured).map_err(|_| ExecError::MissingOsascript)?;
            if parts.is_empty() {
                return Err(ExecError::MissingOsascript);
            }
            return Ok(Self::new(parts, app_name));
        }
        let osascript = which::which("osascript").map_err(|_| ExecError::MissingOsascript)?;
        Ok(Self::new(
            vec![osascript.to_string_lossy().to_string()],
            app_name,
        ))
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl ScriptRunner for OsascriptRunner {
    fn run(&self, script: &Script) -> Result<String, ExecError> {
        debug!(command = ?self.command, bytes = script.as_str().len(), "running script");
        let mut process = Command::new(&self.command[0])
            .args(&self.command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = process.stdin.take() {
            stdin.write_all(script.as_str().as_bytes())?;
        }

        let output = process.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("osascript exited with {}", output.status)
            } else {
                stderr
            };
            return Err(classify_failure(&message, &self.app_name));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn ensure_source_output(args: Vec<String>) -> Vec<String> {
    let mut next = args;
    if !next.iter().any(|arg| arg == "-s") {
        next.push("-s".to_string());
        next.push("s".to_string());
    }
    next
}
