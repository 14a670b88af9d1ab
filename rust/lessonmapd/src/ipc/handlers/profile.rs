use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, parse_opt_string, user_id_param};
use crate::ipc::types::{AppState, Request};
use crate::map::{CompanionDescriptor, PlayerMarker};
use serde_json::json;

fn handle_companion_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match user_id_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::companion_get(conn, &user_id) {
        Ok(companion) => ok(
            &req.id,
            json!({
                "userId": user_id,
                "companion": companion,
                "marker": PlayerMarker::from_companion(companion.as_ref()),
            }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

/// `companion: null` unequips.
fn handle_companion_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match user_id_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let companion = match req.params.get("companion") {
        None => return err(&req.id, "bad_params", "missing companion", None),
        Some(v) if v.is_null() => None,
        Some(v) => match parse_opt_string(v.get("animationAssetUrl")) {
            Ok(url) => Some(CompanionDescriptor {
                animation_asset_url: url,
            }),
            Err(m) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("companion.animationAssetUrl {}", m),
                    None,
                )
            }
        },
    };
    if let Err(e) = db::companion_set(conn, &user_id, companion.as_ref()) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(
        &req.id,
        json!({ "marker": PlayerMarker::from_companion(companion.as_ref()) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.companion.get" => Some(handle_companion_get(state, req)),
        "profile.companion.set" => Some(handle_companion_set(state, req)),
        _ => None,
    }
}
