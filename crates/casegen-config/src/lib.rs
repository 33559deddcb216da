//! Constraint configuration contracts and validation.
//!
//! A configuration document declares the constraint tree the engine builds:
//! ids, character sets, embedded children and references by id. This crate
//! owns the serde model, its JSON Schema, structural and semantic
//! validation, and the TOML generator settings.

pub mod errors;
pub mod model;
pub mod schema;
pub mod settings;
pub mod validate;

pub use errors::{ConfigError, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use model::{
    ChildSpec, ConstraintConfig, ConstraintKind, ConstraintSpec, FieldSpec, MandatorySpec,
    ReferenceSpec,
};
pub use schema::config_json_schema;
pub use settings::{GeneratorSettings, load_indexed_fields, load_settings, parse_indexed_fields};
pub use validate::{
    ValidatedConfig, load_config, validate_config, validate_config_json, validate_config_semantics,
};
