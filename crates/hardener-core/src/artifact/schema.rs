//! JSON Schema validation for artifact structure.
//!
//! Artifacts are checked against schema/openapi-structure.schema.json. The
//! schema only pins down the shape of the top-level sections; whether the
//! document is a *good* API description is the assessor's call.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded structure schema (loaded at compile time).
const STRUCTURE_SCHEMA_JSON: &str = include_str!("../../schema/openapi-structure.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(STRUCTURE_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a document (as JSON) against the structure schema.
///
/// Returns every violation, formatted as `"<message> at <instance path>"`.
pub fn validate_structure(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_passes() {
        let value = serde_json::json!({ "openapi": "3.0.3" });
        assert!(validate_structure(&value).is_ok());
    }

    #[test]
    fn test_missing_openapi_fails() {
        let value = serde_json::json!({ "info": { "title": "x" } });
        let errors = validate_structure(&value).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_paths_must_map_to_objects() {
        let value = serde_json::json!({
            "openapi": "3.0.3",
            "paths": { "/orders": "not an object" }
        });
        assert!(validate_structure(&value).is_err());
    }

    #[test]
    fn test_server_without_url_fails() {
        let value = serde_json::json!({
            "openapi": "3.0.3",
            "servers": [{ "description": "nowhere" }]
        });
        assert!(validate_structure(&value).is_err());
    }

    #[test]
    fn test_full_document_passes() {
        let value = serde_json::json!({
            "openapi": "3.0.3",
            "info": { "title": "Orders", "version": "1.0.0", "contact": { "name": "x" } },
            "servers": [{ "url": "https://api.example.com" }],
            "paths": { "/orders": { "get": { "responses": { "200": { "description": "ok" } } } } },
            "components": {
                "schemas": { "Order": { "type": "object" } },
                "securitySchemes": { "apiKeyAuth": { "type": "apiKey", "in": "header", "name": "X-API-Key" } }
            },
            "security": [{ "apiKeyAuth": [] }]
        });
        assert!(validate_structure(&value).is_ok());
    }
}
