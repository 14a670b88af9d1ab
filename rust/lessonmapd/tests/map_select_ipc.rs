mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, sample_course, spawn_sidecar, temp_dir};

fn position(result: &serde_json::Value) -> Option<String> {
    result
        .get("playerPositionId")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[test]
fn selection_moves_player_only_onto_playable_lessons() {
    let workspace = temp_dir("lessonmap-select");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.put",
        json!({ "courseId": "spanish", "course": sample_course() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "map.load",
        json!({ "courseId": "spanish" }),
    );

    let locked = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "map.select",
        json!({ "lessonId": "u1-l3" }),
    );
    assert_eq!(locked.get("accepted").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(position(&locked).as_deref(), Some("u1-l2"));

    let done = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "map.select",
        json!({ "lessonId": "u1-l1" }),
    );
    assert_eq!(done.get("accepted").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(position(&done).as_deref(), Some("u1-l1"));
    let lesson = done.get("lesson").expect("lesson");
    assert_eq!(lesson.get("zoneId").and_then(|v| v.as_str()), Some("u1"));
    assert_eq!(lesson.get("title").and_then(|v| v.as_str()), Some("Hola"));

    let view = request_ok(&mut stdin, &mut reader, "6", "map.view", json!({}));
    let map = view.get("map").expect("map");
    assert_eq!(position(map).as_deref(), Some("u1-l1"));
    let players = map
        .get("zones")
        .and_then(|v| v.as_array())
        .map(|zones| {
            zones
                .iter()
                .flat_map(|z| {
                    z.get("nodes")
                        .and_then(|n| n.as_array())
                        .cloned()
                        .unwrap_or_default()
                })
                .filter(|n| n.get("isPlayerHere").and_then(|v| v.as_bool()) == Some(true))
                .count()
        })
        .unwrap_or(0);
    assert_eq!(players, 1);

    // Reloading re-runs the resolver; the confirmed choice is reported alongside.
    let reloaded = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "map.load",
        json!({ "courseId": "spanish" }),
    );
    assert_eq!(
        reloaded.get("lastConfirmedPositionId").and_then(|v| v.as_str()),
        Some("u1-l1")
    );
    assert_eq!(
        reloaded.get("map").and_then(position).as_deref(),
        Some("u1-l2")
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "map.select",
        json!({ "lessonId": "nope" }),
    );
    assert_eq!(code, "not_found");
}

#[test]
fn unconfirmed_selection_rolls_back() {
    let workspace = temp_dir("lessonmap-select-rollback");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    // The lesson service has never heard of this course, so confirmation fails.
    let mut course = sample_course();
    course["id"] = json!("unregistered");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "map.load",
        json!({ "course": course }),
    );

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "map.select",
        json!({ "lessonId": "u1-l1" }),
    );
    assert_eq!(res.get("accepted").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(res.get("rolledBack").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(position(&res).as_deref(), Some("u1-l2"));

    // Without an id there is no course to confirm against.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "map.load",
        json!({ "course": sample_course() }),
    );
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "map.select",
        json!({ "lessonId": "u1-l1" }),
    );
    assert_eq!(res.get("accepted").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(position(&res).as_deref(), Some("u1-l1"));
}

#[test]
fn selection_without_workspace_is_local_only() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "map.select",
        json!({ "lessonId": "u1-l1" }),
    );
    assert_eq!(code, "no_map");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "map.load",
        json!({ "course": sample_course() }),
    );
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "map.select",
        json!({ "lessonId": "u1-l1" }),
    );
    assert_eq!(res.get("accepted").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(position(&res).as_deref(), Some("u1-l1"));
}

#[test]
fn closing_the_map_unmounts_it() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "map.load",
        json!({ "course": sample_course() }),
    );
    let closed = request_ok(&mut stdin, &mut reader, "2", "map.close", json!({}));
    assert_eq!(closed.get("closed").and_then(|v| v.as_bool()), Some(true));

    let view = request_ok(&mut stdin, &mut reader, "3", "map.view", json!({}));
    let map = view.get("map").expect("map");
    assert_eq!(map.get("loaded").and_then(|v| v.as_bool()), Some(false));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "map.select",
        json!({ "lessonId": "u1-l1" }),
    );
    assert_eq!(code, "no_map");

    let again = request_ok(&mut stdin, &mut reader, "5", "map.close", json!({}));
    assert_eq!(again.get("closed").and_then(|v| v.as_bool()), Some(false));
}
