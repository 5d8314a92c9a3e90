//! Verification report model and structured exit codes.

use serde::{Deserialize, Serialize};

/// Everything verified.
pub const EXIT_PASS: i32 = 0;
/// Missing input, unreadable bundle, or empty source.
pub const EXIT_MISSING: i32 = 10;
/// Signature verification failed.
pub const EXIT_SIGNATURE_FAIL: i32 = 11;
/// A subject digest did not match the artifact on disk.
pub const EXIT_DIGEST_MISMATCH: i32 = 12;
/// A policy gate reported violations.
pub const EXIT_POLICY_FAIL: i32 = 13;
/// Schema validation or chain-graph validation failed.
pub const EXIT_SCHEMA_FAIL: i32 = 14;

/// Outcome of one check on one bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub bundle: String,
    pub check: String,
    pub passed: bool,
    pub message: String,
}

/// Summary of one decoded statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementSummary {
    pub attestation_type: String,
    pub statement_id: String,
    pub privacy_mode: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generated_at: String,
}

/// A statement node in the provenance-chain graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainNode {
    pub bundle: String,
    pub statement_id: String,
    pub attestation_type: String,
    pub generated_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// A dependency edge in the provenance-chain graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEdge {
    pub from_statement_id: String,
    pub from_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to_statement_id: String,
    pub to_type: String,
    pub satisfied: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

/// The provenance-chain validation result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ChainNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<ChainEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

/// Aggregated result of a verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub passed: bool,
    pub exit_code: i32,
    pub bundle_count: usize,
    pub checks: Vec<CheckResult>,
    pub violations: Vec<String>,
    pub statements: Vec<StatementSummary>,
    pub chain: ChainReport,
}

impl Report {
    /// A passing report with no checks yet.
    pub fn new() -> Self {
        Report {
            passed: true,
            exit_code: EXIT_PASS,
            bundle_count: 0,
            checks: Vec::new(),
            violations: Vec::new(),
            statements: Vec::new(),
            chain: ChainReport::default(),
        }
    }

    /// Record a passed check.
    pub fn add_pass(&mut self, bundle: &str, check: &str) {
        self.checks.push(CheckResult {
            bundle: bundle.to_owned(),
            check: check.to_owned(),
            passed: true,
            message: "ok".to_owned(),
        });
    }

    /// Record a failed check, escalating the exit code monotonically.
    pub fn add_failure(&mut self, bundle: &str, check: &str, exit: i32, message: &str) {
        self.passed = false;
        if self.exit_code == EXIT_PASS || exit > self.exit_code {
            self.exit_code = exit;
        }
        self.checks.push(CheckResult {
            bundle: bundle.to_owned(),
            check: check.to_owned(),
            passed: false,
            message: message.to_owned(),
        });
        self.violations.push(format!("{check}: {message}"));
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}
