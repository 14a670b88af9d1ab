use crate::db;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::layout::MapGeometry;
use rusqlite::Connection;
use serde_json::Value as JsonValue;

pub const SETUP_MAP_KEY: &str = "setup.map";
pub const DEFAULT_USER_ID: &str = "local";

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, JsonValue> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, JsonValue> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn parse_opt_string(v: Option<&JsonValue>) -> Result<Option<String>, &'static str> {
    match v {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let s = v.as_str().ok_or("must be string or null")?.trim().to_string();
            if s.is_empty() {
                Ok(None)
            } else {
                Ok(Some(s))
            }
        }
    }
}

pub fn user_id_param(req: &Request) -> Result<String, JsonValue> {
    parse_opt_string(req.params.get("userId"))
        .map(|v| v.unwrap_or_else(|| DEFAULT_USER_ID.to_string()))
        .map_err(|m| err(&req.id, "bad_params", format!("userId {}", m), None))
}

/// Geometry in effect: the workspace's `setup.map` section, or defaults.
pub fn load_geometry(conn: Option<&Connection>) -> MapGeometry {
    conn.and_then(|c| db::settings_get_json(c, SETUP_MAP_KEY).ok().flatten())
        .and_then(|v| v.as_object().cloned())
        .map(|obj| MapGeometry::from_setup(&obj))
        .unwrap_or_default()
}
