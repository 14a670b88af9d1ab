use crate::course::CourseTree;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, parse_opt_string, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

fn handle_courses_put(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(raw) = req.params.get("course") else {
        return err(&req.id, "bad_params", "missing course", None);
    };
    let mut tree: CourseTree = match serde_json::from_value(raw.clone()) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "bad_params", format!("course: {}", e), None),
    };
    let explicit_id = match parse_opt_string(req.params.get("courseId")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("courseId {}", m), None),
    };
    // Reject trees the map could not load.
    if let Err(e) = tree.clone().into_course() {
        return err(&req.id, "bad_params", e.to_string(), None);
    }

    let course_id = explicit_id
        .or_else(|| tree.id.clone().filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    tree.id = Some(course_id.clone());
    if let Err(e) = db::course_put(conn, &course_id, &tree) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    info!(course = %course_id, zones = tree.zones.len(), "course stored");
    ok(&req.id, json!({ "courseId": course_id }))
}

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let rows = match db::courses_list(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let courses: Vec<serde_json::Value> = rows
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "title": r.title,
                "zoneCount": r.tree.zones.len(),
                "lessonCount": r.tree.lesson_count(),
                "updatedAt": r.updated_at,
            })
        })
        .collect();
    ok(&req.id, json!({ "courses": courses }))
}

fn handle_courses_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::course_get(conn, &course_id) {
        Ok(Some(row)) => ok(
            &req.id,
            json!({ "course": row.tree, "updatedAt": row.updated_at }),
        ),
        Ok(None) => err(&req.id, "not_found", "course not found", None),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_lessons_set_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let lesson_id = match required_str(req, "lessonId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let raw_status = match parse_opt_string(req.params.get("rawStatus")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("rawStatus {}", m), None),
    };

    let mut row = match db::course_get(conn, &course_id) {
        Ok(Some(r)) => r,
        Ok(None) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if !row.tree.set_raw_status(&lesson_id, raw_status) {
        return err(&req.id, "not_found", "lesson not found", None);
    }
    if let Err(e) = db::course_put(conn, &course_id, &row.tree) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.put" => Some(handle_courses_put(state, req)),
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.open" => Some(handle_courses_open(state, req)),
        "courses.lessons.setStatus" => Some(handle_lessons_set_status(state, req)),
        _ => None,
    }
}
