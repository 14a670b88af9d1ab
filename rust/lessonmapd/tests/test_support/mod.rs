#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_lessonmapd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn lessonmapd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(json!({}))
}

/// Returns the error code of a failed request.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Two-unit course used across the map tests.
pub fn sample_course() -> serde_json::Value {
    json!({
        "title": "Spanish Basics",
        "zones": [
            {
                "id": "u2",
                "title": "Food",
                "order": 2,
                "backgroundDescriptor": "linear-gradient(180deg, #fde68a, #f59e0b)",
                "lessons": [
                    { "id": "u2-l1", "title": "Fruit", "order": 1, "rawStatus": "locked" },
                ]
            },
            {
                "id": "u1",
                "title": "Greetings",
                "order": 1,
                "backgroundDescriptor": "https://cdn.example.com/maps/greetings.png",
                "lessons": [
                    { "id": "u1-l3", "title": "Gracias", "order": 3, "rawStatus": "locked" },
                    { "id": "u1-l1", "title": "Hola", "order": 1, "rawStatus": "finished" },
                    { "id": "u1-l2", "title": "Adios", "order": 2, "rawStatus": " ACTIVE " },
                ]
            }
        ]
    })
}

pub fn zone<'a>(map: &'a serde_json::Value, zone_id: &str) -> &'a serde_json::Value {
    map.get("zones")
        .and_then(|v| v.as_array())
        .and_then(|zones| {
            zones
                .iter()
                .find(|z| z.get("id").and_then(|v| v.as_str()) == Some(zone_id))
        })
        .expect("zone present")
}

pub fn node_field<'a>(zone: &'a serde_json::Value, field: &str) -> Vec<&'a serde_json::Value> {
    zone.get("nodes")
        .and_then(|v| v.as_array())
        .map(|nodes| nodes.iter().filter_map(|n| n.get(field)).collect())
        .unwrap_or_default()
}
