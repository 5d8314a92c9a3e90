//! Report emission as JSON and Markdown.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::VerifyError;
use crate::report::Report;

/// Write a report as pretty-printed JSON.
pub fn write_json(path: &Path, report: &Report) -> Result<(), VerifyError> {
    let raw = serde_json::to_vec_pretty(report)?;
    std::fs::write(path, raw)
        .map_err(|e| VerifyError::io(format!("write report {}", path.display()), e))
}

/// Write a report as Markdown.
pub fn write_markdown(path: &Path, report: &Report) -> Result<(), VerifyError> {
    std::fs::write(path, build_markdown(report))
        .map_err(|e| VerifyError::io(format!("write report {}", path.display()), e))
}

/// Render a report as a Markdown document.
pub fn build_markdown(report: &Report) -> String {
    let status = if report.passed { "PASS" } else { "FAIL" };
    let mut out = String::new();

    out.push_str("# LLM Supply-Chain Verification Report\n\n");
    let _ = writeln!(out, "- Status: **{status}**");
    let _ = writeln!(out, "- Exit Code: `{}`", report.exit_code);
    let _ = writeln!(out, "- Bundles Checked: `{}`\n", report.bundle_count);

    out.push_str("## Checks\n\n");
    out.push_str("| Bundle | Check | Passed | Message |\n");
    out.push_str("|---|---|---:|---|\n");
    for check in &report.checks {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            check.bundle,
            check.check,
            check.passed,
            check.message.replace('|', "\\|")
        );
    }

    if !report.violations.is_empty() {
        out.push_str("\n## Violations\n\n");
        for violation in &report.violations {
            let _ = writeln!(out, "- {violation}");
        }
    }

    if !report.statements.is_empty() {
        out.push_str("\n## Statements\n\n");
        out.push_str("| Type | Statement ID | Privacy | Depends On |\n");
        out.push_str("|---|---|---|---|\n");
        for st in &report.statements {
            let deps = if st.depends_on.is_empty() {
                "-".to_owned()
            } else {
                st.depends_on.join(", ")
            };
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                st.attestation_type, st.statement_id, st.privacy_mode, deps
            );
        }
    }

    out.push_str("\n## Provenance Chain\n\n");
    let _ = writeln!(out, "- Valid: **{}**", report.chain.valid);
    let _ = writeln!(out, "- Nodes: `{}`", report.chain.nodes.len());
    let _ = writeln!(out, "- Edges: `{}`", report.chain.edges.len());

    if !report.chain.edges.is_empty() {
        out.push_str(
            "\n| From Statement | From Type | To Type | To Statement | Satisfied | Detail |\n",
        );
        out.push_str("|---|---|---|---|---:|---|\n");
        for edge in &report.chain.edges {
            let to_id = if edge.to_statement_id.is_empty() {
                "-"
            } else {
                &edge.to_statement_id
            };
            let detail = if edge.detail.is_empty() {
                "ok"
            } else {
                &edge.detail
            };
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                edge.from_statement_id,
                edge.from_type,
                edge.to_type,
                to_id,
                edge.satisfied,
                detail
            );
        }
    }

    if !report.chain.violations.is_empty() {
        out.push_str("\n### Chain Violations\n\n");
        for violation in &report.chain.violations {
            let _ = writeln!(out, "- {violation}");
        }
    }

    out
}
