//! Schema validation of decoded statements.

use std::path::Path;

use llmsa_core::schema;

use crate::error::VerifyError;

/// Validate a decoded statement against the base statement schema and its
/// predicate against the kind-specific schema
/// (`<schema_dir>/<attestation_type>.schema.json`).
pub fn verify_schemas(
    schema_dir: &Path,
    statement: &serde_json::Value,
) -> Result<(), VerifyError> {
    let base_schema = schema_dir.join("statement.schema.json");
    let errors = schema::validate(&base_schema, statement)?;
    if !errors.is_empty() {
        return Err(VerifyError::Schema(format!(
            "statement schema invalid: {}",
            errors.join("; ")
        )));
    }

    let att_type = statement
        .get("attestation_type")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let predicate = statement.get("predicate").filter(|p| p.is_object());
    let (att_type, predicate) = match (att_type, predicate) {
        ("", _) | (_, None) => {
            return Err(VerifyError::Schema(
                "statement missing attestation_type or predicate".to_owned(),
            ))
        }
        (t, Some(p)) => (t, p),
    };

    let predicate_schema = schema_dir.join(format!("{att_type}.schema.json"));
    let errors = schema::validate(&predicate_schema, predicate)?;
    if !errors.is_empty() {
        return Err(VerifyError::Schema(format!(
            "predicate schema invalid: {}",
            errors.join("; ")
        )));
    }
    Ok(())
}
