//! End-to-end tests for the ur-tool binary
//!
//! Wallet and device exchange parts through files, the way the two sides of
//! an air gap exchange QR frames.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"max_fragment_len": 100}"#).unwrap();
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ur-tool"))
            .args(args)
            .arg("--config")
            .arg(&self.config)
            .env("NO_COLOR", "1")
            .env_remove("UR_TOOL_MAX_FRAGMENT_LEN")
            .output()
            .expect("Failed to execute ur-tool")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_cli_help() {
    let ws = Workspace::new();
    let output = ws.run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["request", "sign", "decode", "match"] {
        assert!(text.contains(command), "help should mention '{}'", command);
    }
}

#[test]
fn test_request_sign_match_round_trip() {
    let ws = Workspace::new();
    let request_file = ws.path("request.txt");
    let signature_file = ws.path("signature.txt");

    let output = ws.run(&[
        "request",
        "--random",
        "500",
        "--origin",
        "cli-test",
        "--out",
        request_file.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "request failed: {:?}", output);
    let request_parts = lines(&request_file);
    assert!(request_parts.len() > 1);
    assert!(request_parts[0].starts_with("ur:tron-sign-request/1-"));

    let output = ws.run(&[
        "sign",
        "--yes",
        "--input",
        request_file.to_str().unwrap(),
        "--out",
        signature_file.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "sign failed: {:?}", output);
    let signature_parts = lines(&signature_file);
    assert_eq!(signature_parts.len(), 1);
    assert!(signature_parts[0].starts_with("ur:tron-signature/"));

    let output = ws.run(&[
        "match",
        "--request",
        request_file.to_str().unwrap(),
        "--signature",
        signature_file.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "match failed: {:?}", output);
    assert!(stdout(&output).contains("Signature answers the request"));
}

#[test]
fn test_match_rejects_foreign_signature() {
    let ws = Workspace::new();
    let first = ws.path("first.txt");
    let second = ws.path("second.txt");
    let answer = ws.path("answer.txt");

    for file in [&first, &second] {
        let output = ws.run(&["request", "--random", "32", "--out", file.to_str().unwrap()]);
        assert!(output.status.success());
    }
    let output = ws.run(&[
        "sign",
        "-y",
        "-i",
        second.to_str().unwrap(),
        "-o",
        answer.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let output = ws.run(&[
        "match",
        "--request",
        first.to_str().unwrap(),
        "--signature",
        answer.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_decode_json_and_uppercase_parts() {
    let ws = Workspace::new();
    let parts_file = ws.path("parts.txt");
    let output = ws.run(&[
        "request",
        "--sign-data",
        "0a02abcd",
        "--request-id",
        "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
        "--data-type",
        "message",
        "--out",
        parts_file.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let upper: Vec<String> = lines(&parts_file)
        .iter()
        .map(|p| p.to_ascii_uppercase())
        .collect();
    let mut args = vec!["decode", "--json"];
    args.extend(upper.iter().map(String::as_str));
    let output = ws.run(&args);
    assert!(output.status.success(), "decode failed: {:?}", output);

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["type"], "tron-sign-request");
    assert_eq!(value["request_id"], "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d");
    assert_eq!(value["sign_data"], "0a02abcd");
    assert_eq!(value["data_type"], "message");
}

#[test]
fn test_max_fragment_len_override() {
    let ws = Workspace::new();
    let parts_file = ws.path("parts.txt");
    let output = ws.run(&[
        "request",
        "--random",
        "300",
        "--max-fragment-len",
        "1000",
        "--out",
        parts_file.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert_eq!(lines(&parts_file).len(), 1);

    let output = ws.run(&["request", "--random", "10", "--max-fragment-len", "0"]);
    assert!(!output.status.success());
}
