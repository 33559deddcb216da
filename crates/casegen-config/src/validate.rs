use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use casegen_core::{CONFIG_VERSION, CharacterSet, CharacterSets, build_reference_report};
use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::Value;

use crate::errors::{ConfigError, IssueSeverity, ValidationIssue, ValidationReport};
use crate::model::{ChildSpec, ConstraintConfig, ConstraintKind, ConstraintSpec, FieldSpec, MandatorySpec};
use crate::schema::config_json_schema;

static ID_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").ok());

/// Validated configuration with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub config: ConstraintConfig,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a configuration JSON document against the configuration JSON Schema.
pub fn validate_config_json(
    config_json: &Value,
    config_schema: &Value,
) -> Result<ValidationReport, ConfigError> {
    let compiled =
        JSONSchema::compile(config_schema).map_err(|err| ConfigError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(config_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate the configuration end-to-end, returning structured issues on failure.
pub fn validate_config(
    config_json: &Value,
    config_schema: &Value,
) -> Result<ValidatedConfig, ValidationReport> {
    let structural = match validate_config_json(config_json, config_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let config: ConstraintConfig = match serde_json::from_value(config_json.clone()) {
        Ok(config) => config,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "invalid_config_json",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    let semantic = validate_config_semantics(&config);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    Ok(ValidatedConfig {
        config,
        warnings: semantic.warnings,
    })
}

/// Read and fully validate a configuration file.
pub fn load_config(path: &Path) -> Result<ValidatedConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config_json: Value = serde_json::from_str(&contents)?;
    let config_schema = serde_json::to_value(config_json_schema())?;
    validate_config(&config_json, &config_schema).map_err(ConfigError::Invalid)
}

/// Check ids, references, character sets, field domains and reference cycles.
pub fn validate_config_semantics(config: &ConstraintConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.config_version != CONFIG_VERSION {
        report.push_error(
            ValidationIssue::error(
                "config_version_mismatch",
                "/config_version",
                format!(
                    "config_version '{}' is not supported (expected '{}')",
                    config.config_version, CONFIG_VERSION
                ),
            )
            .with_hint(format!("set config_version to \"{CONFIG_VERSION}\"")),
        );
    }

    for (id, chars) in &config.charsets {
        if let Err(err) = CharacterSet::new(id.as_str(), chars) {
            report.push_error(ValidationIssue::error(
                "invalid_charset",
                format!("/charsets/{id}"),
                err.to_string(),
            ));
        }
    }

    if config.constraints.is_empty() {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "constraints_empty",
            "/constraints",
            "configuration declares no constraints".to_string(),
            None,
        ));
    }

    let mut walker = Walker {
        charsets: &config.charsets,
        ids: BTreeMap::new(),
        references: Vec::new(),
        dependencies: BTreeMap::new(),
        report: &mut report,
    };

    for (idx, spec) in config.constraints.iter().enumerate() {
        let path = format!("/constraints/{idx}");
        if spec.id.is_none() {
            walker.report.push_error(
                ValidationIssue::error(
                    "missing_id",
                    path.clone(),
                    format!("top-level {} constraint has no id", spec.type_name()),
                )
                .with_hint("every top-level constraint needs an id"),
            );
        }
        walker.visit(spec, &path, None);
    }

    walker.check_references();
    walker.check_cycles();

    report
}

struct PendingReference {
    path: String,
    id: String,
}

struct Walker<'a> {
    charsets: &'a BTreeMap<String, String>,
    ids: BTreeMap<String, String>,
    references: Vec<PendingReference>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
    report: &'a mut ValidationReport,
}

impl Walker<'_> {
    fn visit(&mut self, spec: &ConstraintSpec, path: &str, parent_id: Option<&str>) {
        if let Some(id) = spec.id.as_deref() {
            self.register_id(id, path);
            if let Some(parent_id) = parent_id {
                self.depend(parent_id, id);
            }
        }
        let last_id = spec.id.as_deref().or(parent_id);

        if let Some(charset) = spec.charset.as_deref() {
            if !CharacterSets::is_builtin(charset) && !self.charsets.contains_key(charset) {
                self.report.push_error(
                    ValidationIssue::error(
                        "unknown_charset",
                        format!("{path}/charset"),
                        format!("character set '{charset}' is not defined"),
                    )
                    .with_hint("declare it under charsets or use a built-in set"),
                );
            }
        }

        match &spec.kind {
            ConstraintKind::Constant { .. } => {}
            ConstraintKind::Field { field } => {
                validate_field(field, &format!("{path}/field"), self.report);
            }
            ConstraintKind::Combined { parts, .. } => {
                if parts.is_empty() {
                    self.report.push_error(ValidationIssue::error(
                        "parts_empty",
                        format!("{path}/parts"),
                        "combined constraint requires at least one part",
                    ));
                }
                for (idx, part) in parts.iter().enumerate() {
                    self.visit_child(part, &format!("{path}/parts/{idx}"), last_id);
                }
            }
            ConstraintKind::Optional { child, mandatory } => {
                if let MandatorySpec::WhenPresent { when_present } = mandatory {
                    self.reference(when_present, &format!("{path}/mandatory"), last_id);
                }
                self.visit_child(child, &format!("{path}/child"), last_id);
            }
            ConstraintKind::Source { child } => {
                self.visit_child(child, &format!("{path}/child"), last_id);
            }
        }
    }

    fn visit_child(&mut self, child: &ChildSpec, path: &str, last_id: Option<&str>) {
        match child {
            ChildSpec::Reference(reference) => self.reference(&reference.id, path, last_id),
            ChildSpec::Embedded(spec) => self.visit(spec, path, last_id),
        }
    }

    fn register_id(&mut self, id: &str, path: &str) {
        let valid = ID_PATTERN
            .as_ref()
            .map(|pattern| pattern.is_match(id))
            .unwrap_or(true);
        if !valid {
            self.report.push_error(ValidationIssue::error(
                "invalid_id",
                format!("{path}/id"),
                format!("id '{id}' contains unsupported characters"),
            ));
        }

        if let Some(first) = self.ids.get(id) {
            self.report.push_error(ValidationIssue::error(
                "duplicate_id",
                format!("{path}/id"),
                format!("id '{id}' is already declared at {first}"),
            ));
            return;
        }
        self.ids.insert(id.to_string(), path.to_string());
        self.dependencies.entry(id.to_string()).or_default();
    }

    fn reference(&mut self, id: &str, path: &str, last_id: Option<&str>) {
        self.references.push(PendingReference {
            path: path.to_string(),
            id: id.to_string(),
        });
        if let Some(last_id) = last_id {
            self.depend(last_id, id);
        }
    }

    fn depend(&mut self, from: &str, to: &str) {
        self.dependencies
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    fn check_references(&mut self) {
        for reference in &self.references {
            if !self.ids.contains_key(&reference.id) {
                self.report.push_error(
                    ValidationIssue::error(
                        "unknown_reference",
                        reference.path.clone(),
                        format!("reference to undeclared id '{}'", reference.id),
                    )
                    .with_hint("declare the referenced constraint with that id"),
                );
            }
        }
    }

    fn check_cycles(&mut self) {
        let graph = build_reference_report(&self.dependencies);
        if let Some(cycle) = graph.cycle {
            self.report.push_error(
                ValidationIssue::error(
                    "reference_cycle",
                    "/constraints",
                    format!("constraints reference each other in a cycle: {}", cycle.join(", ")),
                )
                .with_hint("break the cycle by embedding or removing one of the references"),
            );
        }
    }
}

fn validate_field(field: &FieldSpec, path: &str, report: &mut ValidationReport) {
    match field {
        FieldSpec::Text { min_len, max_len } => {
            if min_len > max_len {
                report.push_error(ValidationIssue::error(
                    "invalid_field",
                    path,
                    format!("text min_len {min_len} must be <= max_len {max_len}"),
                ));
            }
        }
        FieldSpec::Number { min, max } => {
            if min > max {
                report.push_error(ValidationIssue::error(
                    "invalid_field",
                    path,
                    format!("number min {min} must be <= max {max}"),
                ));
            }
        }
        FieldSpec::Date { min, max, format } => {
            let min_date = parse_date(min, &format!("{path}/min"), report);
            let max_date = parse_date(max, &format!("{path}/max"), report);
            if let (Some(min_date), Some(max_date)) = (min_date, max_date) {
                if min_date > max_date {
                    report.push_error(ValidationIssue::error(
                        "invalid_field",
                        path,
                        format!("date min {min} must be <= max {max}"),
                    ));
                }
            }
            if let Some(format) = format {
                if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                    report.push_error(ValidationIssue::error(
                        "invalid_field",
                        format!("{path}/format"),
                        format!("invalid date format '{format}'"),
                    ));
                }
            }
        }
        FieldSpec::Choice { values } => {
            if values.is_empty() {
                report.push_error(ValidationIssue::error(
                    "invalid_field",
                    format!("{path}/values"),
                    "choice requires at least one value",
                ));
            }
        }
        FieldSpec::Pattern { pattern, .. } => {
            if let Err(err) = Regex::new(pattern) {
                report.push_error(ValidationIssue::error(
                    "invalid_field",
                    format!("{path}/pattern"),
                    format!("invalid pattern: {err}"),
                ));
            }
        }
    }
}

fn parse_date(raw: &str, path: &str, report: &mut ValidationReport) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(err) => {
            report.push_error(ValidationIssue::error(
                "invalid_field",
                path,
                format!("invalid date '{raw}': {err}"),
            ));
            None
        }
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
