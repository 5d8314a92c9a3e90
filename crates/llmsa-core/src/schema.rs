//! Structural validation of documents against named JSON schemas.

use std::path::Path;

use crate::error::CoreError;

/// Validate `doc` against the schema file at `schema_path`.
///
/// Returns the list of validation error messages; an empty list means the
/// document is valid. Failure to load or compile the schema itself is a
/// [`CoreError::Schema`].
pub fn validate(schema_path: &Path, doc: &serde_json::Value) -> Result<Vec<String>, CoreError> {
    let raw = std::fs::read_to_string(schema_path)
        .map_err(|e| CoreError::io(format!("read schema {}", schema_path.display()), e))?;
    let schema: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| CoreError::Schema(format!("parse {}: {e}", schema_path.display())))?;

    let compiled = jsonschema::JSONSchema::compile(&schema)
        .map_err(|e| CoreError::Schema(format!("compile {}: {e}", schema_path.display())))?;

    let result = match compiled.validate(doc) {
        Ok(()) => Ok(Vec::new()),
        Err(errors) => Ok(errors.map(|e| e.to_string()).collect()),
    };
    result
}
