// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SUBTRACT: &str = r#"[{"leaf":{"name":"a"}},{"leaf":{"name":"b"}},"subtract"]"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// `combtool` pointed at a private preferences file.
    fn tool(&self) -> Command {
        let mut cmd = Command::cargo_bin("combtool").unwrap();
        cmd.env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path("prefs.json"));
        cmd
    }

    fn encode(&self, json: &str) -> PathBuf {
        let input = self.write("tree.json", json);
        let output = self.path("tree.bin");
        self.tool()
            .arg("encode")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success();
        output
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn encode_then_decode_round_trips_json() {
    let ws = Workspace::new();
    let record = ws.encode(SUBTRACT);
    assert_eq!(
        fs::read(&record).unwrap(),
        [0, 0, 2, 6, 3, 2, b'a', 0, 0xff, b'b', 0, 0xff, 1, 1, 4]
    );
    ws.tool()
        .args(["decode", arg(&record)])
        .assert()
        .success()
        .stdout(format!("{SUBTRACT}\n"));
}

#[test]
fn empty_tree_is_empty_list() {
    let ws = Workspace::new();
    let record = ws.encode("[]");
    assert_eq!(fs::read(&record).unwrap(), [0, 0, 0, 0, 0, 0]);
    ws.tool()
        .args(["decode", arg(&record)])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn inspect_reports_layout_and_tree() {
    let ws = Workspace::new();
    let record = ws.encode(SUBTRACT);
    ws.tool()
        .args(["inspect", arg(&record)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("8-bit (code 0)")
                .and(predicate::str::contains("postfix"))
                .and(predicate::str::contains("010104"))
                .and(predicate::str::contains("tree: a - b")),
        );
}

#[test]
fn transform_places_every_leaf() {
    let ws = Workspace::new();
    let input = ws.write("leaf.json", r#"[{"leaf":{"name":"a"}}]"#);
    ws.tool()
        .args(["transform", arg(&input), "--translate", "1", "-2", "3"])
        .assert()
        .success()
        .stdout(
            "[{\"leaf\":{\"name\":\"a\",\"matrix\":\
             [1.0,0.0,0.0,1.0,0.0,1.0,0.0,-2.0,0.0,0.0,1.0,3.0,0.0,0.0,0.0,1.0]}}]\n",
        );
}

#[test]
fn identity_transform_leaves_tree_alone() {
    let ws = Workspace::new();
    let input = ws.write("tree.json", SUBTRACT);
    ws.tool()
        .args(["transform", arg(&input), "--scale", "1"])
        .assert()
        .success()
        .stdout(format!("{SUBTRACT}\n"));
}

#[test]
fn count_prints_figures() {
    let ws = Workspace::new();
    let input = ws.write("tree.json", SUBTRACT);
    ws.tool()
        .args(["count", arg(&input)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"n_leaf\": 2")
                .and(predicate::str::contains("\"non_union_seen\": true"))
                .and(predicate::str::contains("\"max_stack_depth\": 2")),
        );
}

#[test]
fn corrupt_record_fails_with_context() {
    let ws = Workspace::new();
    let bad = ws.write("bad.bin", [0u8, 0, 1, 3, 0, 1, b'a', 0]);
    ws.tool()
        .args(["decode", arg(&bad)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("decode"));
}

#[test]
fn stack_ceiling_flag_bounds_decoder() {
    let ws = Workspace::new();
    let record = ws.encode(SUBTRACT);
    ws.tool()
        .args(["--stack-ceiling", "1", "decode", arg(&record)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack overflow"));
}

#[test]
fn saved_prefs_are_read_back() {
    let ws = Workspace::new();
    ws.tool()
        .args(["--stack-ceiling", "1", "prefs", "--save"])
        .assert()
        .success();
    assert!(ws.path("prefs.json").exists());

    ws.tool()
        .arg("prefs")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stack_ceiling\": 1,"));

    let record = ws.encode(SUBTRACT);
    ws.tool()
        .args(["decode", arg(&record)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack overflow"));
}

#[test]
fn malformed_json_is_reported() {
    let ws = Workspace::new();
    let input = ws.write("tree.json", r#"[{"leaf":"#);
    ws.tool()
        .args(["count", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse"));

    let input = ws.write("tree.json", r#"[{"leaf":{"name":"a"}},"subtract"]"#);
    ws.tool()
        .args(["count", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing an operand"));
}

/// Left-leaning subtract chain: `base - c0 - c1 - ...`.
fn subtract_chain(depth: usize) -> String {
    let mut tokens = vec![r#"{"leaf":{"name":"base"}}"#.to_owned()];
    for i in 0..depth {
        tokens.push(format!(r#"{{"leaf":{{"name":"c{i}"}}}},"subtract""#));
    }
    format!("[{}]", tokens.join(","))
}

#[test]
fn deep_subtract_chain_reencodes_from_decoded_json() {
    let ws = Workspace::new();
    let record = ws.encode(&subtract_chain(200));
    let original = fs::read(&record).unwrap();

    let decoded = ws
        .tool()
        .args(["decode", arg(&record)])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let again = ws.write("again.json", &decoded);
    let output = ws.path("again.bin");
    ws.tool()
        .arg("encode")
        .arg(&again)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    assert_eq!(fs::read(&output).unwrap(), original);
}

#[test]
fn very_deep_complement_chain_decodes_and_prints() {
    const DEPTH: usize = 100_000;
    let ws = Workspace::new();
    let json = format!(r#"[{{"leaf":{{"name":"core"}}}}{}]"#, r#","not""#.repeat(DEPTH));
    let record = ws.encode(&json);

    ws.tool()
        .args(["--stack-ceiling", "200000", "decode", arg(&record)])
        .assert()
        .success()
        .stdout(format!("{json}\n"));
    ws.tool()
        .args(["--stack-ceiling", "200000", "inspect", arg(&record)])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("tree: {}core", "!".repeat(DEPTH))));
}
