use crate::ipc::error::{err, map_err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::viewport::VisibilityEntry;
use serde_json::json;

fn handle_subscribe(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(map) = state.map.as_mut() else {
        return err(&req.id, "no_map", "load a course map first", None);
    };
    let tracker = map.subscribe_viewport();
    ok(&req.id, json!(tracker.snapshot()))
}

fn handle_observe(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subscription_id = match required_str(req, "subscriptionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let entries: Vec<VisibilityEntry> = match req.params.get("entries") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(e) => e,
            Err(e) => return err(&req.id, "bad_params", format!("entries: {}", e), None),
        },
        None => return err(&req.id, "bad_params", "missing entries", None),
    };
    let Some(map) = state.map.as_mut() else {
        return err(&req.id, "no_subscription", "no course map is mounted", None);
    };
    let tracker = match map.tracker_mut(&subscription_id) {
        Ok(t) => t,
        Err(e) => return map_err(&req.id, e),
    };
    let changed = tracker.observe(&entries);
    let mut result = json!(tracker.snapshot());
    result["changed"] = json!(changed);
    ok(&req.id, result)
}

fn handle_unsubscribe(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subscription_id = match required_str(req, "subscriptionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(map) = state.map.as_mut() else {
        return err(&req.id, "no_subscription", "no course map is mounted", None);
    };
    match map.unsubscribe_viewport(&subscription_id) {
        Ok(()) => ok(&req.id, json!({ "released": true })),
        Err(e) => map_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "viewport.subscribe" => Some(handle_subscribe(state, req)),
        "viewport.observe" => Some(handle_observe(state, req)),
        "viewport.unsubscribe" => Some(handle_unsubscribe(state, req)),
        _ => None,
    }
}
