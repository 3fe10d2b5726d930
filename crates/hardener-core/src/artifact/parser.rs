//! Artifact parsing from YAML.

use serde_yaml::Value;
use thiserror::Error;

use super::schema::validate_structure;

/// A candidate document failed structural validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("artifact validation failed: {reason}")]
pub struct ValidationError {
    /// Why the document was rejected
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for ValidationError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::new(format!("invalid YAML: {}", err))
    }
}

/// An immutable, versioned snapshot of a validated document.
///
/// Artifacts are never edited in place. A correction produces a new
/// artifact through [`Artifact::revise`] or [`Artifact::from_document`],
/// both of which bump the version.
#[derive(Debug, Clone)]
pub struct Artifact {
    version: u32,
    text: String,
    document: Value,
}

impl Artifact {
    /// Validate `text` as the next version of this artifact.
    pub fn revise(&self, text: &str) -> Result<Self, ValidationError> {
        let document: Value = serde_yaml::from_str(text)?;
        Self::build(self.version + 1, document)
    }

    /// Build the next version of this artifact from an already-parsed document.
    pub fn from_document(&self, document: Value) -> Result<Self, ValidationError> {
        Self::build(self.version + 1, document)
    }

    fn build(version: u32, document: Value) -> Result<Self, ValidationError> {
        if !document.is_mapping() {
            return Err(ValidationError::new("document root must be a mapping"));
        }

        let json = serde_json::to_value(&document).map_err(|e| {
            ValidationError::new(format!("document is not representable as JSON: {}", e))
        })?;
        validate_structure(&json).map_err(|errors| ValidationError::new(errors.join("; ")))?;

        let text = canonicalize(&document)?;

        Ok(Self {
            version,
            text,
            document,
        })
    }

    /// Monotonic version index, 0 for the initial artifact.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Canonical YAML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parsed document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Whether two artifacts hold the same document, regardless of version.
    pub fn content_eq(&self, other: &Artifact) -> bool {
        self.text == other.text
    }
}

/// Validate document text and return it as the initial artifact (version 0).
///
/// Fails when the text is not YAML, when the root is not a mapping, when the
/// document violates the structural schema, or when re-serializing and
/// re-parsing it does not reproduce the same document.
pub fn validate(text: &str) -> Result<Artifact, ValidationError> {
    let document: Value = serde_yaml::from_str(text)?;
    Artifact::build(0, document)
}

/// Re-serialize a document and check it parses back to itself.
fn canonicalize(document: &Value) -> Result<String, ValidationError> {
    let text = serde_yaml::to_string(document)?;
    let reparsed: Value = serde_yaml::from_str(&text)?;

    if &reparsed != document {
        return Err(ValidationError::new(
            "document does not round-trip through canonical serialization",
        ));
    }

    Ok(text)
}
