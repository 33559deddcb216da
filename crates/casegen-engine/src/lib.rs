//! Constraint-tree test-data generation engine for casegen.
//!
//! A [`Generator`] owns a [`ConstraintFactory`] holding the constraint
//! nodes built from a configuration document. Each node produces one field
//! value for a requested [`FieldCase`], caches it for the current pass when
//! stateful, honours fixed-value overrides and takes part in the
//! case-enumeration protocol used for boundary-value coverage runs.

pub mod constraints;
pub mod engine;
pub mod errors;
pub mod factory;
pub mod fields;
pub mod generator;
pub mod model;
pub mod output;

pub use casegen_core::FieldCase;
pub use constraints::{ChildRef, Constraint, FixedValue, Mandatory, NodeIdentity, fixed_value};
pub use engine::{GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use factory::ConstraintFactory;
pub use generator::{Generator, GeneratorOptions};
pub use model::{GenerateOptions, GenerationMode, GenerationReport};
