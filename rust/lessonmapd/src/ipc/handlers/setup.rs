use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{load_geometry, SETUP_MAP_KEY};
use crate::ipc::types::{AppState, Request};
use crate::layout::MapGeometry;
use serde_json::{json, Map, Value};

const MAX_LENGTH: f64 = 4096.0;

#[derive(Clone, Copy)]
enum SetupSection {
    Map,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "map" => Some(Self::Map),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Map => SETUP_MAP_KEY,
        }
    }
}

fn parse_length(v: &Value, key: &str) -> Result<f64, String> {
    let n = v
        .as_f64()
        .ok_or_else(|| format!("{} must be a number", key))?;
    if !(0.0..=MAX_LENGTH).contains(&n) {
        return Err(format!("{} must be in 0..={}", key, MAX_LENGTH));
    }
    Ok(n)
}

fn merge_map_patch(current: &mut MapGeometry, patch: &Map<String, Value>) -> Result<(), String> {
    for (k, v) in patch {
        let n = parse_length(v, k)?;
        match k.as_str() {
            "nodeDiameter" => current.node_diameter = n,
            "gap" => current.gap = n,
            "containerWidth" => current.container_width = n,
            "horizontalAmplitude" => current.horizontal_amplitude = n,
            "controlOffset" => current.control_offset = n,
            _ => return Err(format!("unknown map field: {}", k)),
        }
    }
    current.validate()
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, json!({ "map": load_geometry(Some(conn)) }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = load_geometry(Some(conn));
    if let Err(msg) = merge_map_patch(&mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    let value = match serde_json::to_value(current) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_update_failed", e.to_string(), None),
    };
    if let Err(e) = db::settings_set_json(conn, section.key(), &value) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    // Layout of an already mounted map is fixed; new geometry applies on the next load.
    ok(&req.id, json!({ "ok": true, "map": value }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
