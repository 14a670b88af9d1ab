mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("lessonmap-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("mapLoaded").and_then(|v| v.as_bool()), Some(false));

    let methods = [
        ("workspace.select", json!({ "path": workspace.to_string_lossy() })),
        ("setup.get", json!({})),
        ("courses.list", json!({})),
        ("profile.companion.get", json!({})),
        ("map.view", json!({})),
        ("map.close", json!({})),
        ("viewport.subscribe", json!({})),
    ];
    for (i, (method, params)) in methods.iter().enumerate() {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("m{}", i),
            method,
            params.clone(),
        );
        let code = resp
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str());
        assert_ne!(code, Some("not_implemented"), "{} not routed", method);
    }

    let unknown = request(&mut stdin, &mut reader, "u", "planner.units.list", json!({}));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json reply");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("reply json");
    assert_eq!(
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_json")
    );

    drop(stdin);
    let status = child.wait().expect("wait for exit");
    assert!(status.success());
}
