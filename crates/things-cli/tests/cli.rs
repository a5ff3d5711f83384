use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_things"));
    cmd.env("THINGS_CLI_HOME", home)
        .env_remove("THINGS_CLI_CONFIG")
        .env_remove("THINGS_OSASCRIPT_CMD")
        .env_remove("THINGS_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn dry_run_add_prints_the_script() {
    let temp = TempDir::new().expect("tempdir");
    let output = bin(temp.path())
        .args([
            "--dry-run",
            "add",
            "Buy milk",
            "--list",
            "Today",
            "--tags",
            "Home,Urgent",
            "--due",
            "2024-01-15",
        ])
        .output()
        .expect("add");
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.starts_with("tell application \"Things3\"\n"));
    assert!(text.contains(
        r#"set newToDo to make new to do with properties {name:"Buy milk", tag names:"Home, Urgent"} at beginning of list "Today""#
    ));
    assert!(text.contains(
        "tell dueDate to set {its day, its year, its month, its day} to {1, 2024, 1, 15}"
    ));
    assert!(text.trim_end().ends_with("end tell"));
    assert!(!text.contains("Created to-do"));
}

#[test]
fn invalid_input_exits_non_zero() {
    let temp = TempDir::new().expect("tempdir");

    let output = bin(temp.path())
        .args(["--dry-run", "add", "Pay rent", "--due", "2024-13-01"])
        .output()
        .expect("add");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid due date '2024-13-01'"));
    assert!(stdout(&output).is_empty());

    let output = bin(temp.path())
        .args(["--dry-run", "add", "Pay rent", "--list", "Tomorrow"])
        .output()
        .expect("add");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown list 'Tomorrow'"));
}

#[test]
fn dry_run_list_shows_the_first_attempt_only() {
    let temp = TempDir::new().expect("tempdir");

    let output = bin(temp.path())
        .args(["--dry-run", "list", "Today", "--ids"])
        .output()
        .expect("list");
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains(r#"to dos of list "Today""#));
    assert_eq!(text.matches("tell application").count(), 1);

    let output = bin(temp.path())
        .args(["--dry-run", "list", "Groceries"])
        .output()
        .expect("list");
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains(r#"to dos of project id "Groceries""#));

    let output = bin(temp.path())
        .args(["--dry-run", "list", "Groceries", "--json"])
        .output()
        .expect("list json");
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains(r#"to dos of project "Groceries""#));
}

#[test]
fn config_set_and_show() {
    let temp = TempDir::new().expect("tempdir");

    let output = bin(temp.path())
        .args(["config", "set", "default_list", "Someday"])
        .output()
        .expect("config set");
    assert!(output.status.success(), "{}", stderr(&output));
    let body = fs::read_to_string(temp.path().join("config.toml")).expect("config file");
    assert!(body.contains("default_list = \"Someday\""));

    let output = bin(temp.path())
        .args(["config", "show"])
        .output()
        .expect("config show");
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("app_name = \"Things3\""));
    assert!(text.contains("default_list = \"Someday\""));

    let output = bin(temp.path())
        .args(["config", "set", "default_list", "Tomorrow"])
        .output()
        .expect("config set");
    assert!(!output.status.success());

    let output = bin(temp.path())
        .args(["config", "set", "colour", "blue"])
        .output()
        .expect("config set");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown config key 'colour'"));
}

#[test]
fn config_drives_default_list_and_app_name() {
    let temp = TempDir::new().expect("tempdir");
    let config = temp.path().join("custom.toml");
    fs::write(
        &config,
        "app_name = \"Things3 Beta\"\ndefault_list = \"Inbox\"\n",
    )
    .expect("write config");

    let output = bin(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--dry-run", "add", "Water plants"])
        .output()
        .expect("add");
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("tell application \"Things3 Beta\""));
    assert!(text.contains(r#"at beginning of list "Inbox""#));

    let output = bin(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--dry-run", "add", "Water plants", "--area", "Home"])
        .output()
        .expect("add");
    assert!(stdout(&output).contains(r#"at beginning of area "Home""#));
    assert!(!stdout(&output).contains("Inbox"));
}

#[test]
fn runs_scripts_through_the_configured_command() {
    let temp = TempDir::new().expect("tempdir");
    let output = bin(temp.path())
        .env(
            "THINGS_OSASCRIPT_CMD",
            r#"sh -c "cat >/dev/null; printf '\"T1\"'""#,
        )
        .args(["add", "Buy milk"])
        .output()
        .expect("add");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Created to-do T1");
}

#[test]
fn host_failures_are_reported() {
    let temp = TempDir::new().expect("tempdir");
    let output = bin(temp.path())
        .env(
            "THINGS_OSASCRIPT_CMD",
            r#"sh -c "cat >/dev/null; echo 'execution error: Things3 got an error (-600)' >&2; exit 1""#,
        )
        .args(["complete", "T1"])
        .output()
        .expect("complete");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Things is not running"));
}

#[test]
fn version_prints_package_version() {
    let temp = TempDir::new().expect("tempdir");
    let output = bin(temp.path()).arg("version").output().expect("version");
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("things {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn version_ignores_a_broken_config() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(temp.path().join("config.toml"), "app_name = [").expect("write config");

    let output = bin(temp.path()).arg("version").output().expect("version");
    assert!(output.status.success(), "{}", stderr(&output));

    let output = bin(temp.path())
        .args(["--dry-run", "list", "Today"])
        .output()
        .expect("list");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("load config"));
}

#[test]
fn config_show_prints_valid_toml() {
    let temp = TempDir::new().expect("tempdir");
    let command = r#"C:\tools\osascript "beta""#;
    let output = bin(temp.path())
        .args(["config", "set", "osascript_cmd", command])
        .output()
        .expect("config set");
    assert!(output.status.success(), "{}", stderr(&output));

    let output = bin(temp.path())
        .args(["config", "show"])
        .output()
        .expect("config show");
    assert!(output.status.success());
    let shown: toml::Table = toml::from_str(&stdout(&output)).expect("toml");
    assert_eq!(shown["osascript_cmd"].as_str(), Some(command));
    assert_eq!(shown["app_name"].as_str(), Some("Things3"));
}
