//! Integration tests for the `llmsa` binary.
//!
//! Each test works in a fresh temporary directory, drives the binary via
//! `assert_cmd`, and checks outputs and the structured exit codes.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn llmsa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("llmsa").expect("llmsa binary not found");
    cmd.current_dir(dir);
    cmd
}

/// Write the prompt collector fixture into `dir` and return the config
/// path relative to it.
fn write_prompt_fixture(dir: &Path) -> String {
    std::fs::create_dir_all(dir.join("templates")).expect("mkdir");
    std::fs::create_dir_all(dir.join("tools")).expect("mkdir");
    std::fs::write(dir.join("system.txt"), "You are helpful.").expect("write");
    std::fs::write(dir.join("safety.yaml"), "rules: []").expect("write");
    std::fs::write(dir.join("templates/greet.tmpl"), "Hello {{name}}").expect("write");
    std::fs::write(dir.join("tools/search.json"), "{}").expect("write");
    std::fs::write(
        dir.join("prompt.yaml"),
        "system_prompt: system.txt\ntemplates_dir: templates\ntool_schemas_dir: tools\nsafety_policy: safety.yaml\n",
    )
    .expect("write config");
    "prompt.yaml".to_owned()
}

fn find_statement(dir: &Path) -> PathBuf {
    for entry in std::fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("entry").path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name.starts_with("statement_") && name.ends_with(".json") {
            return path;
        }
    }
    panic!("no statement file in {}", dir.display());
}

#[test]
fn init_creates_config_key_and_schemas() {
    let tmp = tempfile::tempdir().expect("tempdir");

    llmsa(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized llmsa"));

    assert!(tmp.path().join("llmsa.yaml").exists());
    assert!(tmp.path().join("policy/examples/mvp-gates.yaml").exists());
    assert!(tmp.path().join("schemas/v1/statement.schema.json").exists());
    assert!(tmp.path().join("schemas/v1/prompt_attestation.schema.json").exists());
    assert!(tmp.path().join(".llmsa/dev_ed25519.pem").exists());
    assert!(tmp.path().join(".llmsa/attestations").is_dir());
}

#[test]
fn init_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    llmsa(tmp.path()).arg("init").assert().success();

    let key_before =
        std::fs::read(tmp.path().join(".llmsa/dev_ed25519.pem")).expect("read key");
    llmsa(tmp.path()).arg("init").assert().success();
    let key_after =
        std::fs::read(tmp.path().join(".llmsa/dev_ed25519.pem")).expect("read key");
    assert_eq!(key_before, key_after, "existing key must not be replaced");
}

#[test]
fn attest_sign_verify_pipeline() {
    let tmp = tempfile::tempdir().expect("tempdir");
    llmsa(tmp.path()).arg("init").assert().success();
    let config = write_prompt_fixture(tmp.path());

    llmsa(tmp.path())
        .args([
            "attest",
            "create",
            "--type",
            "prompt_attestation",
            "--config",
            &config,
            "--out",
            "atts",
            "--determinism-check",
            "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("statement_prompt_attestation"));

    let statement = find_statement(&tmp.path().join("atts"));
    llmsa(tmp.path())
        .args([
            "sign",
            "--in",
            statement.to_str().unwrap(),
            "--provider",
            "pem",
            "--key",
            ".llmsa/dev_ed25519.pem",
            "--out",
            "atts",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(".bundle.json"));

    llmsa(tmp.path())
        .args([
            "verify",
            "--source",
            "local",
            "--attestations",
            "atts",
            "--schema-dir",
            "schemas/v1",
            "--format",
            "json",
            "--out",
            "verify.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("verify.json"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join("verify.json")).unwrap())
            .unwrap();
    assert_eq!(report["passed"], serde_json::json!(true));
    assert_eq!(report["exit_code"], serde_json::json!(0));

    llmsa(tmp.path())
        .args(["report", "--in", "verify.json", "--out", "verify.md"])
        .assert()
        .success();
    let md = std::fs::read_to_string(tmp.path().join("verify.md")).expect("read md");
    assert!(md.contains("# LLM Supply-Chain Verification Report"));
    assert!(md.contains("- Status: **PASS**"));
}

#[test]
fn tampered_subject_exits_with_digest_mismatch() {
    let tmp = tempfile::tempdir().expect("tempdir");
    llmsa(tmp.path()).arg("init").assert().success();
    let config = write_prompt_fixture(tmp.path());

    llmsa(tmp.path())
        .args([
            "attest", "create", "--type", "prompt_attestation", "--config", &config, "--out",
            "atts",
        ])
        .assert()
        .success();
    let statement = find_statement(&tmp.path().join("atts"));
    llmsa(tmp.path())
        .args([
            "sign",
            "--in",
            statement.to_str().unwrap(),
            "--provider",
            "pem",
            "--key",
            ".llmsa/dev_ed25519.pem",
            "--out",
            "atts",
        ])
        .assert()
        .success();

    std::fs::write(tmp.path().join("system.txt"), "tampered").expect("rewrite");

    llmsa(tmp.path())
        .args([
            "verify",
            "--attestations",
            "atts",
            "--schema-dir",
            "schemas/v1",
            "--out",
            "verify.json",
        ])
        .assert()
        .failure()
        .code(12)
        .stderr(predicate::str::contains("verification failed"));
}

#[test]
fn tampered_signature_exits_with_signature_fail() {
    let tmp = tempfile::tempdir().expect("tempdir");
    llmsa(tmp.path()).arg("init").assert().success();
    let config = write_prompt_fixture(tmp.path());

    llmsa(tmp.path())
        .args([
            "attest", "create", "--type", "prompt_attestation", "--config", &config, "--out",
            "atts",
        ])
        .assert()
        .success();
    let statement = find_statement(&tmp.path().join("atts"));
    llmsa(tmp.path())
        .args([
            "sign",
            "--in",
            statement.to_str().unwrap(),
            "--provider",
            "pem",
            "--key",
            ".llmsa/dev_ed25519.pem",
            "--out",
            "atts",
        ])
        .assert()
        .success();

    // Replace the signature in the emitted bundle.
    let bundle_path = std::fs::read_dir(tmp.path().join("atts"))
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.to_string_lossy().ends_with(".bundle.json"))
        .expect("bundle file");
    let mut bundle: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&bundle_path).unwrap()).unwrap();
    bundle["envelope"]["signatures"][0]["sig"] = serde_json::json!("AAAA");
    std::fs::write(&bundle_path, serde_json::to_string_pretty(&bundle).unwrap()).unwrap();

    llmsa(tmp.path())
        .args([
            "verify",
            "--attestations",
            "atts",
            "--schema-dir",
            "schemas/v1",
            "--out",
            "verify.json",
        ])
        .assert()
        .failure()
        .code(11);
}

#[test]
fn gate_blocks_unlisted_plaintext_statement() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join("atts")).expect("mkdir");
    std::fs::write(
        tmp.path().join("atts/statement_prompt.json"),
        serde_json::json!({
            "attestation_type": "prompt_attestation",
            "statement_id": "loud-statement",
            "privacy": { "mode": "plaintext_explicit" }
        })
        .to_string(),
    )
    .expect("write statement");
    std::fs::write(
        tmp.path().join("policy.yaml"),
        "version: 1\nplaintext_allowlist: []\ngates: []\n",
    )
    .expect("write policy");

    llmsa(tmp.path())
        .args(["gate", "--policy", "policy.yaml", "--attestations", "atts"])
        .assert()
        .failure()
        .code(13)
        .stdout(predicate::str::contains(
            "Sensitive payload exposure blocked by policy.",
        ));
}

#[test]
fn gate_passes_allowlisted_plaintext() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join("atts")).expect("mkdir");
    std::fs::write(
        tmp.path().join("atts/statement_prompt.json"),
        serde_json::json!({
            "attestation_type": "prompt_attestation",
            "statement_id": "loud-statement",
            "privacy": { "mode": "plaintext_explicit" }
        })
        .to_string(),
    )
    .expect("write statement");
    std::fs::write(
        tmp.path().join("policy.yaml"),
        "version: 1\nplaintext_allowlist: [loud-statement]\ngates: []\n",
    )
    .expect("write policy");

    llmsa(tmp.path())
        .args(["gate", "--policy", "policy.yaml", "--attestations", "atts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("policy gate passed"));
}

#[test]
fn gate_rejects_rego_engine() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join("atts")).expect("mkdir");
    std::fs::write(tmp.path().join("policy.yaml"), "version: 1\ngates: []\n").expect("write");

    llmsa(tmp.path())
        .args([
            "gate",
            "--policy",
            "policy.yaml",
            "--attestations",
            "atts",
            "--engine",
            "rego",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported policy engine"));
}

#[test]
fn sign_rejects_kms_provider() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(tmp.path().join("statement.json"), "{}").expect("write");

    llmsa(tmp.path())
        .args([
            "sign",
            "--in",
            "statement.json",
            "--provider",
            "kms",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kms provider is not implemented"));
}

#[test]
fn verify_missing_source_exits_with_missing_code() {
    let tmp = tempfile::tempdir().expect("tempdir");
    llmsa(tmp.path()).arg("init").assert().success();

    llmsa(tmp.path())
        .args([
            "verify",
            "--attestations",
            "nonexistent-dir",
            "--schema-dir",
            "schemas/v1",
            "--out",
            "verify.json",
        ])
        .assert()
        .failure()
        .code(10);
}
