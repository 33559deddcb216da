//! Core contracts and helpers for casegen.
//!
//! This crate defines the evaluation cases, the fair binary chooser, the
//! data set abstraction, character sets and the reference-graph ordering
//! shared by the configuration layer, the engine and the CLI.

pub mod case;
pub mod charset;
pub mod choice;
pub mod dataset;
pub mod error;
pub mod graph;

pub use case::FieldCase;
pub use charset::{CharacterSet, CharacterSets, DEFAULT_CHARSET_ID};
pub use choice::FairChoice;
pub use dataset::{DataSet, InMemoryDataSet};
pub use error::{CoreError, Result};
pub use graph::{ReferenceGraphReport, ReferenceGraphSummary, build_reference_report};

/// Current contract version for constraint configuration documents.
pub const CONFIG_VERSION: &str = "0.1";
