use crate::course::CourseTree;
use crate::db;
use crate::ipc::error::{err, map_err, ok};
use crate::ipc::helpers::{load_geometry, parse_opt_string, required_str, user_id_param};
use crate::ipc::types::{AppState, Request};
use crate::map::{CompanionDescriptor, LessonMap, MapView, SelectOutcome};
use serde_json::json;
use tracing::{error, info, warn};

/// Load failures leave the map empty; the caller renders its empty state.
fn load_failed(req: &Request, code: &str, message: String) -> serde_json::Value {
    error!(code, message = %message, "course map load failed");
    err(&req.id, code, message, None)
}

fn handle_map_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    // Unmount whatever was showing before looking at the request; a failed
    // load leaves the session empty.
    state.map = None;

    let user_id = match user_id_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let course_id = match parse_opt_string(req.params.get("courseId")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("courseId {}", m), None),
    };
    let inline_companion: Option<Option<CompanionDescriptor>> = match req.params.get("companion") {
        None => None,
        Some(v) if v.is_null() => Some(None),
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(c) => Some(Some(c)),
            Err(e) => {
                warn!(error = %e, "malformed companion; using placeholder");
                Some(None)
            }
        },
    };

    let tree: CourseTree = if let Some(raw) = req.params.get("course") {
        match serde_json::from_value(raw.clone()) {
            Ok(t) => t,
            Err(e) => return load_failed(req, "load_failed", format!("course: {}", e)),
        }
    } else if let Some(course_id) = course_id {
        let Some(conn) = state.db.as_ref() else {
            return err(&req.id, "no_workspace", "select a workspace first", None);
        };
        match db::course_get(conn, &course_id) {
            Ok(Some(row)) => row.tree,
            Ok(None) => {
                return load_failed(req, "not_found", format!("course not found: {}", course_id))
            }
            Err(e) => return load_failed(req, "load_failed", format!("{e:#}")),
        }
    } else {
        return err(&req.id, "bad_params", "missing courseId or course", None);
    };

    let course = match tree.into_course() {
        Ok(c) => c,
        Err(e) => return load_failed(req, "bad_params", e.to_string()),
    };

    let conn = state.db.as_ref();
    let companion = match inline_companion {
        Some(c) => c,
        None => conn.and_then(|c| match db::companion_get(c, &user_id) {
            Ok(v) => v,
            Err(e) => {
                warn!(user = %user_id, error = %e, "companion unavailable; using placeholder");
                None
            }
        }),
    };
    let last_confirmed = match (conn, course.id.as_deref()) {
        (Some(c), Some(cid)) => db::player_position_get(c, cid, &user_id).ok().flatten(),
        _ => None,
    };
    let geometry = load_geometry(conn);

    let map = LessonMap::new(course, geometry, user_id, companion.as_ref());
    let view = map.view();
    state.map = Some(map);
    ok(
        &req.id,
        json!({ "map": view, "lastConfirmedPositionId": last_confirmed }),
    )
}

fn handle_map_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match state.map.as_ref() {
        Some(map) => map.view(),
        None => MapView::empty(load_geometry(state.db.as_ref())),
    };
    ok(&req.id, json!({ "map": view }))
}

fn handle_map_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let lesson_id = match required_str(req, "lessonId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(map) = state.map.as_mut() else {
        return err(&req.id, "no_map", "load a course map first", None);
    };
    let conn = state.db.as_ref();
    let course_id = map.course_id().map(str::to_string);
    let user_id = map.user_id().to_string();

    // Without a workspace there is no lesson service to confirm against.
    let outcome = map.select(&lesson_id, |lid| match (conn, course_id.as_deref()) {
        (Some(c), Some(cid)) => db::player_position_confirm(c, cid, &user_id, lid),
        _ => Ok(()),
    });
    let position = map.player_position().map(str::to_string);
    match outcome {
        Ok(SelectOutcome::Accepted(lesson)) => ok(
            &req.id,
            json!({ "accepted": true, "playerPositionId": position, "lesson": lesson }),
        ),
        Ok(SelectOutcome::IgnoredLocked) => ok(
            &req.id,
            json!({ "accepted": false, "playerPositionId": position }),
        ),
        Ok(SelectOutcome::RolledBack(reason)) => ok(
            &req.id,
            json!({
                "accepted": false,
                "rolledBack": true,
                "reason": reason,
                "playerPositionId": position,
            }),
        ),
        Err(e) => map_err(&req.id, e),
    }
}

fn handle_map_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let closed = state.map.take().is_some();
    if closed {
        info!("course map closed");
    }
    ok(&req.id, json!({ "closed": closed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "map.load" => Some(handle_map_load(state, req)),
        "map.view" => Some(handle_map_view(state, req)),
        "map.select" => Some(handle_map_select(state, req)),
        "map.close" => Some(handle_map_close(state, req)),
        _ => None,
    }
}
