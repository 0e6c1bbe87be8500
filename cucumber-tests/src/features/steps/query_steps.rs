use crate::features::world::DmvcWorld;
use cucumber::then;
use serde_json::Value;

#[then(expr = "the response should contain {int} todo(s)")]
async fn then_item_count(world: &mut DmvcWorld, count: usize) {
    assert_eq!(world.items().len(), count, "body: {}", world.last_body);
}

#[then(expr = "the todo titles should be {string}")]
async fn then_titles(world: &mut DmvcWorld, titles: String) {
    let expected: Vec<&str> = titles.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
    let items = world.items();
    let actual: Vec<&str> = items.iter().filter_map(|item| item.get("title").and_then(Value::as_str)).collect();
    assert_eq!(actual, expected);
}

#[then(expr = "the next cursor should be {string}")]
async fn then_cursor(world: &mut DmvcWorld, cursor: String) {
    assert_eq!(world.last_body.get("cursor").and_then(Value::as_str), Some(cursor.as_str()));
}

#[then(expr = "there should be no next cursor")]
async fn then_no_cursor(world: &mut DmvcWorld) {
    let cursor = world.last_body.get("cursor").filter(|c| !c.is_null());
    assert!(cursor.is_none(), "unexpected cursor: {:?}", cursor);
}

#[then(expr = "the total should be {int}")]
async fn then_total(world: &mut DmvcWorld, total: u64) {
    assert_eq!(world.last_body.get("total").and_then(Value::as_u64), Some(total), "body: {}", world.last_body);
}
