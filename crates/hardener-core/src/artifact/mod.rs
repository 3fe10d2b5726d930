//! Artifact parsing and validation.
//!
//! An artifact is an OpenAPI document in YAML. Every artifact the loop sees
//! has been parsed, checked against a structural JSON Schema and shown to
//! round-trip through canonical re-serialization.

mod fences;
mod parser;
mod schema;

pub use fences::strip_code_fences;
pub use parser::{validate, Artifact, ValidationError};
pub use schema::validate_structure;
