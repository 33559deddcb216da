use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use casegen_core::FieldCase;

/// How data sets are produced in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GenerationMode {
    /// A fixed number of data sets, all generated with the same case.
    Random { data_sets: u64, case: FieldCase },
    /// Case enumeration until every root reports exhaustion, capped at `limit`.
    Cases { limit: u64 },
}

impl Default for GenerationMode {
    fn default() -> Self {
        GenerationMode::Random {
            data_sets: 10,
            case: FieldCase::Normal,
        }
    }
}

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory where run artifacts are written.
    pub out_dir: PathBuf,
    pub mode: GenerationMode,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            mode: GenerationMode::default(),
        }
    }
}

/// Structured generation issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_id: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            constraint_id: None,
        }
    }

    pub fn with_constraint(mut self, id: &str) -> Self {
        self.constraint_id = Some(id.to_string());
        self
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub mode: GenerationMode,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// SHA-256 over the canonical JSON of the resolved configuration.
    pub config_fingerprint: String,
    pub seed: u64,
    pub constraints: usize,
    pub roots: usize,
    pub cases_counted: u64,
    pub data_sets_generated: u64,
    pub null_values: BTreeMap<String, u64>,
    pub tokens_issued: i64,
    pub bytes_written: u64,
    pub duration_ms: u64,
    pub warnings: Vec<GenerationIssue>,
}

impl GenerationReport {
    pub fn new(run_id: String, mode: GenerationMode, config_fingerprint: String) -> Self {
        Self {
            run_id,
            mode,
            status: "running".to_string(),
            error: None,
            config_fingerprint,
            seed: 0,
            constraints: 0,
            roots: 0,
            cases_counted: 0,
            data_sets_generated: 0,
            null_values: BTreeMap::new(),
            tokens_issued: 0,
            bytes_written: 0,
            duration_ms: 0,
            warnings: Vec::new(),
        }
    }

    pub fn record_null(&mut self, id: &str) {
        *self.null_values.entry(id.to_string()).or_insert(0) += 1;
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        self.warnings.push(issue);
    }

    pub fn record_failure(&mut self, message: String) {
        self.status = "failed".to_string();
        self.error = Some(message);
    }
}
