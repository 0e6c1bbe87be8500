use crate::features::world::{cell_value, DmvcWorld};
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use serde_json::{json, Value};

#[given(expr = "a DMVC server without authentication")]
async fn given_open_server(world: &mut DmvcWorld) {
    world.start_server(true).await.expect("server should start");
}

#[given(expr = "a DMVC server with bearer authentication")]
async fn given_secured_server(world: &mut DmvcWorld) {
    world.start_server(false).await.expect("server should start");
}

#[given(expr = "a todo {string} titled {string}")]
async fn given_todo(world: &mut DmvcWorld, todo: String, title: String) {
    world.request_expecting("POST", "/todos", Some(json!({ "todo": todo, "title": title })), 201).await;
}

/// Creates one todo per table row; the header row names the fields
#[given(expr = "the following todos exist:")]
async fn given_todos(world: &mut DmvcWorld, step: &Step) {
    let table = step.table.as_ref().expect("a data table");
    let (header, rows) = table.rows.split_first().expect("a header row");
    for row in rows {
        let todo: serde_json::Map<String, Value> =
            header.iter().zip(row).map(|(field, raw)| (field.clone(), cell_value(raw))).collect();
        world.request_expecting("POST", "/todos", Some(Value::Object(todo)), 201).await;
    }
}

#[when(expr = "I send a {word} request to {string}")]
async fn when_request(world: &mut DmvcWorld, method: String, path: String) {
    world.request(&method, &path, None).await.expect("request should be sent");
}

#[when(expr = "I send a {word} request to {string} with body:")]
async fn when_request_with_body(world: &mut DmvcWorld, method: String, path: String, step: &Step) {
    let raw = step.docstring.as_deref().expect("a JSON docstring");
    let body: Value = serde_json::from_str(raw).expect("docstring should be JSON");
    world.request(&method, &path, Some(body)).await.expect("request should be sent");
}

#[then(expr = "the response status should be {int}")]
async fn then_status(world: &mut DmvcWorld, status: u16) {
    assert_eq!(world.last_status, Some(status), "body: {}", world.last_body);
}

#[then(expr = "the response field {string} should be {string}")]
async fn then_field(world: &mut DmvcWorld, field: String, expected: String) {
    assert_eq!(world.last_body.get(&field), Some(&cell_value(&expected)), "body: {}", world.last_body);
}

#[then(expr = "the response should not have the field {string}")]
async fn then_no_field(world: &mut DmvcWorld, field: String) {
    assert!(world.last_body.get(&field).is_none(), "body: {}", world.last_body);
}

#[then(expr = "the response should report an issue on {string}")]
async fn then_issue(world: &mut DmvcWorld, path: String) {
    let issues = world.last_body.get("issues").and_then(Value::as_array).cloned().unwrap_or_default();
    assert!(
        issues.iter().any(|issue| issue.get("path") == Some(&Value::String(path.clone()))),
        "no issue on {}: {}",
        path,
        world.last_body
    );
}
