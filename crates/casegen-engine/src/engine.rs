use std::any::Any;
use std::path::PathBuf;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use casegen_config::{ConstraintConfig, GeneratorSettings};
use casegen_core::{DataSet, InMemoryDataSet};

use crate::errors::GenerationError;
use crate::generator::{Generator, GeneratorOptions};
use crate::model::{GenerateOptions, GenerationIssue, GenerationMode, GenerationReport};
use crate::output::csv::write_data_sets_csv;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub run_dir: PathBuf,
    pub report: GenerationReport,
    pub data_sets: Vec<InMemoryDataSet>,
}

/// Runs a configuration end to end and writes the run artifacts.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn run(
        &self,
        config: &ConstraintConfig,
        settings: &GeneratorSettings,
    ) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
        let run_dir = self
            .options
            .out_dir
            .join(format!("{timestamp}__run_{run_id}"));
        std::fs::create_dir_all(&run_dir)?;

        let config_path = run_dir.join("resolved_config.json");
        std::fs::write(&config_path, serde_json::to_vec_pretty(config)?)?;

        let mode = self.options.mode;
        let mut report = GenerationReport::new(run_id.clone(), mode, config_fingerprint(config)?);
        let options = GeneratorOptions::from_settings(settings)?;

        info!(
            run_id = %run_id,
            constraints = config.constraints.len(),
            mode = ?mode,
            "generation started"
        );

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(
            || -> Result<Vec<InMemoryDataSet>, GenerationError> {
                let generator = Generator::from_config(config, options)?;
                report.seed = generator.seed();
                report.constraints = generator.constraint_ids().len();
                report.roots = generator.root_ids().len();
                report.cases_counted = generator.count_cases()?;

                for id in generator.indexed_fields() {
                    if !generator.root_ids().contains(id) {
                        report.record_warning(
                            GenerationIssue::warning(
                                "indexed_field_not_root",
                                "indexed field is not a top-level constraint",
                            )
                            .with_constraint(id),
                        );
                    }
                }

                let data_sets = match mode {
                    GenerationMode::Random { data_sets, case } => {
                        let mut generated = Vec::with_capacity(data_sets as usize);
                        for _ in 0..data_sets {
                            let mut data_set = InMemoryDataSet::new();
                            generator.generate(&mut data_set, case)?;
                            generated.push(data_set);
                        }
                        generated
                    }
                    GenerationMode::Cases { limit } => {
                        let generated = generator.enumerate_cases(limit)?;
                        if generator.has_next_case()? {
                            report.record_warning(GenerationIssue::warning(
                                "case_limit_reached",
                                format!("case enumeration stopped after {limit} data sets"),
                            ));
                        }
                        generated
                    }
                };

                for data_set in &data_sets {
                    for id in generator.root_ids() {
                        if data_set.value(id).is_none() {
                            report.record_null(id);
                        }
                    }
                }

                let csv_path = run_dir.join("data_sets.csv");
                report.bytes_written =
                    write_data_sets_csv(&csv_path, generator.root_ids(), &data_sets)?;
                report.data_sets_generated = data_sets.len() as u64;
                report.tokens_issued = generator.tokens_issued();
                Ok(data_sets)
            },
        ));

        report.duration_ms = start.elapsed().as_millis() as u64;

        let report_path = run_dir.join("generation_report.json");
        let write_report = |report: &GenerationReport| -> Result<(), GenerationError> {
            std::fs::write(&report_path, serde_json::to_vec_pretty(report)?)?;
            Ok(())
        };

        match outcome {
            Ok(Ok(data_sets)) => {
                report.status = "completed".to_string();
                write_report(&report)?;
                info!(
                    run_id = %run_id,
                    data_sets = report.data_sets_generated,
                    duration_ms = report.duration_ms,
                    bytes_written = report.bytes_written,
                    "generation completed"
                );
                Ok(GenerationResult {
                    run_dir,
                    report,
                    data_sets,
                })
            }
            Ok(Err(err)) => {
                report.record_failure(err.to_string());
                write_report(&report)?;
                warn!(run_id = %run_id, error = %err, "generation failed");
                Err(err)
            }
            Err(panic) => {
                report.record_failure(panic_message(panic));
                write_report(&report)?;
                warn!(run_id = %run_id, "generation panicked");
                Err(GenerationError::Failed(Box::new(report)))
            }
        }
    }
}

/// SHA-256 over the canonical JSON encoding of the configuration.
pub fn config_fingerprint(config: &ConstraintConfig) -> Result<String, GenerationError> {
    let bytes = serde_json::to_vec(config)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic: unknown".to_string()
    }
}
