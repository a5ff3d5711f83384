mod common;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use things_core::client::{ClientError, ThingsClient};
use things_core::dates::to_iso;
use things_core::decode::{ListedItem, TaskStatus};
use things_core::runner::ExecError;

use common::{not_found, FakeHost};

fn repeat_line(script: &str) -> String {
    script
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("repeat with"))
        .unwrap_or_default()
        .to_string()
}

#[test]
fn named_list_is_fetched_directly() {
    let host = FakeHost::new(vec![Ok(r#""A1\tMilk\nA2\tBread""#.to_string())]);
    let client = ThingsClient::new(host.runner());
    let items = client.list("Today", true).expect("list");
    assert_eq!(
        items,
        vec![
            ListedItem {
                id: Some("A1".to_string()),
                name: "Milk".to_string()
            },
            ListedItem {
                id: Some("A2".to_string()),
                name: "Bread".to_string()
            },
        ]
    );
    let scripts = host.scripts();
    assert_eq!(scripts.len(), 1);
    assert_eq!(
        repeat_line(&scripts[0]),
        r#"repeat with theToDo in to dos of list "Today""#
    );
}

#[test]
fn named_list_failure_does_not_fall_back() {
    let host = FakeHost::new(vec![not_found("list")]);
    let client = ThingsClient::new(host.runner());
    assert!(matches!(
        client.list("Today", false),
        Err(ClientError::Exec(ExecError::NotFound(_)))
    ));
    assert_eq!(host.scripts().len(), 1);
}

#[test]
fn unknown_name_falls_back_in_order_and_stops_on_success() {
    let host = FakeHost::new(vec![
        not_found("project id"),
        not_found("project"),
        Ok(r#""Weed beds""#.to_string()),
        Ok(r#""should not run""#.to_string()),
    ]);
    let client = ThingsClient::new(host.runner());
    let items = client.list("Garden", false).expect("list");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Weed beds");

    let tried: Vec<String> = host
        .scripts()
        .iter()
        .map(|script| repeat_line(script))
        .collect();
    assert_eq!(
        tried,
        vec![
            r#"repeat with theToDo in to dos of project id "Garden""#,
            r#"repeat with theToDo in to dos of project "Garden""#,
            r#"repeat with theToDo in to dos of area id "Garden""#,
        ]
    );
}

#[test]
fn exhausted_fallback_returns_last_failure() {
    let host = FakeHost::new(vec![
        not_found("project id"),
        not_found("project"),
        not_found("area id"),
        Err(ExecError::App("Things3 got an error: area \"Garden\"".to_string())),
    ]);
    let client = ThingsClient::new(host.runner());
    match client.list("Garden", true) {
        Err(ClientError::Exec(ExecError::App(message))) => assert!(message.contains("area")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(host.scripts().len(), 4);
}

#[test]
fn json_listing_skips_id_levels() {
    let host = FakeHost::new(vec![not_found("project"), not_found("area")]);
    let client = ThingsClient::new(host.runner());
    assert!(client.list_json("Garden").is_err());

    let tried: Vec<String> = host
        .scripts()
        .iter()
        .map(|script| repeat_line(script))
        .collect();
    assert_eq!(
        tried,
        vec![
            r#"repeat with theToDo in to dos of project "Garden""#,
            r#"repeat with theToDo in to dos of area "Garden""#,
        ]
    );
}

#[test]
fn json_listing_decodes_host_records() {
    let output = concat!(
        r#"{{id:"T1", name:"Ship \"v2\"", notes:"", status:"open", tagNames:"Work, Urgent", "#,
        r#"creationDate:"Wednesday 6 August 2025 at 20:45:46", "#,
        r#"modificationDate:"Wednesday 6 August 2025 at 21:00:00", "#,
        r#"dueDate:"missing value", activationDate:"null", completionDate:"null", "#,
        r#"cancellationDate:"null", project:"Launch", area:"null"}}"#,
        "\n"
    );
    let host = FakeHost::new(vec![Ok(output.to_string())]);
    let client = ThingsClient::new(host.runner());
    let records = client.list_json("Anytime").expect("list json");
    assert_eq!(records.len(), 1);
    let record = &records[0];

    let created = NaiveDate::from_ymd_opt(2025, 8, 6)
        .and_then(|date| date.and_hms_opt(20, 45, 46))
        .expect("datetime");
    let expected = Local
        .from_local_datetime(&created)
        .earliest()
        .expect("local time")
        .with_timezone(&Utc);

    assert_eq!(record.id, "T1");
    assert_eq!(record.name, "Ship \"v2\"");
    assert_eq!(record.status, Some(TaskStatus::Open));
    assert_eq!(record.tags, vec!["Work", "Urgent"]);
    assert_eq!(record.creation_date, Some(to_iso(&expected)));
    assert_eq!(record.due_date, None);
    assert_eq!(record.project.as_deref(), Some("Launch"));
    assert_eq!(record.area, None);

    let value = serde_json::to_value(record).expect("json");
    assert_eq!(value["dueDate"], json!(null));
    assert_eq!(value["tags"], json!(["Work", "Urgent"]));
}

#[test]
fn empty_json_listing_is_empty_sequence() {
    let host = FakeHost::new(vec![Ok("{}\n".to_string()), Ok(String::new())]);
    let client = ThingsClient::new(host.runner());
    assert!(client.list_json("Inbox").expect("first").is_empty());
    assert!(client.list_json("Inbox").expect("second").is_empty());
}

#[test]
fn projects_areas_and_tags_list_lines() {
    let host = FakeHost::new(vec![
        Ok(r#""P1\tGarden\nP2\tHouse""#.to_string()),
        Ok(r#""Home\nWork""#.to_string()),
        Ok(r#""Errand\nUrgent""#.to_string()),
    ]);
    let client = ThingsClient::new(host.runner());
    let projects = client.list_projects(true).expect("projects");
    assert_eq!(projects[1].id.as_deref(), Some("P2"));
    let areas = client.list_areas(false).expect("areas");
    assert_eq!(areas[0].name, "Home");
    assert_eq!(client.list_tags().expect("tags"), vec!["Errand", "Urgent"]);

    let scripts = host.scripts();
    assert!(scripts[0].contains("repeat with theProject in projects"));
    assert!(scripts[1].contains("repeat with theArea in areas"));
    assert!(scripts[2].contains("repeat with theTag in tags"));
}

#[test]
fn unreadable_output_is_a_parse_error() {
    let host = FakeHost::new(vec![Ok("{id:\"T1\"".to_string())]);
    let client = ThingsClient::new(host.runner());
    assert!(matches!(
        client.list_json("Inbox"),
        Err(ClientError::Parse(_))
    ));
}
