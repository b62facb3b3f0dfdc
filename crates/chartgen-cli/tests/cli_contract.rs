//! Exit-code and stdout contract of the CLI binary: exactly one JSON object
//! on stdout for every invocation, non-zero exit only for bad arguments or
//! internal failures.

use std::io::Write;
use std::process::Command;

fn chartgen(args: &[&str]) -> (i32, serde_json::Value) {
    let out = Command::new(env!("CARGO_BIN_EXE_chartgen-cli"))
        .args(args)
        .output()
        .expect("binary should run");
    let code = out.status.code().expect("no exit code");
    let stdout = String::from_utf8(out.stdout).expect("stdout not utf-8");
    let json = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout was not JSON ({e}): {stdout:?}"));
    (code, json)
}

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

#[test]
fn wrong_arity_emits_json_error_and_exits_nonzero() {
    for args in [&[][..], &["only-one"][..], &["a", "b"][..], &["a", "b", "c", "d"][..]] {
        let (code, json) = chartgen(args);
        assert_eq!(code, 1, "args: {args:?}");
        assert_eq!(
            json["error"], "Invalid arguments. Expected: file_path query session_id",
            "args: {args:?}"
        );
    }
}

#[test]
fn successful_run_prints_envelope_and_exits_zero() {
    let f = write_csv("region,sales\nA,10\nB,20\nA,15\nC,5\n");
    let path = f.path().to_str().unwrap().to_string();
    let (code, json) = chartgen(&[&path, "bar chart of sales by region", "cli-test-1"]);
    assert_eq!(code, 0, "{json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["session_id"], "cli-test-1");
    assert_eq!(json["chart_type"], "bar_chart");
    assert!(!json["image"].as_str().unwrap().is_empty());
}

#[test]
fn clarification_still_exits_zero() {
    let f = write_csv("region,sales\nA,10\nB,20\n");
    let path = f.path().to_str().unwrap().to_string();
    let (code, json) = chartgen(&[&path, "hi", "cli-test-2"]);
    assert_eq!(code, 0, "{json}");
    assert_eq!(json["success"], false);
    assert_eq!(json["is_chatbot_response"], true);
    assert!(json.get("image").is_none());
}

#[test]
fn quality_rejection_still_exits_zero() {
    let f = write_csv("price\n10\n20\nabc\n30\nxyz\n");
    let path = f.path().to_str().unwrap().to_string();
    let (code, json) = chartgen(&[&path, "histogram of price", "cli-test-3"]);
    assert_eq!(code, 0, "{json}");
    assert_eq!(json["success"], false);
    assert_eq!(json["error_type"], "data_quality");
}

#[test]
fn missing_file_exits_nonzero_with_json() {
    let (code, json) = chartgen(&["/nonexistent/input.csv", "bar chart", "cli-test-4"]);
    assert_eq!(code, 1, "{json}");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "InputError");
}
