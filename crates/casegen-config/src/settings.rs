use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result};

/// Generator settings, usually read from a `casegen.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Path of the constraint configuration (JSON).
    pub config_file: PathBuf,
    /// Optional file listing ids whose values get the data-set index appended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_fields_file: Option<PathBuf>,
    /// Treat every optional constraint as mandatory.
    pub ignore_optional_constraints: bool,
    /// Deterministic mode: seed defaults to 0 when none is configured.
    pub test_mode: bool,
    /// Seed override; takes precedence over the configuration seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("casegen.config.json"),
            indexed_fields_file: None,
            ignore_optional_constraints: false,
            test_mode: false,
            seed: None,
        }
    }
}

/// Load settings from TOML; relative paths resolve against the settings file.
pub fn load_settings(path: &Path) -> Result<GeneratorSettings> {
    let content = std::fs::read_to_string(path)?;
    let mut settings: GeneratorSettings = toml::from_str(&content)?;

    if let Some(base) = path.parent() {
        settings.config_file = resolve(base, &settings.config_file);
        settings.indexed_fields_file = settings
            .indexed_fields_file
            .as_deref()
            .map(|file| resolve(base, file));
    }

    Ok(settings)
}

/// Read the indexed-fields file: one id per line, `#` starts a comment.
pub fn load_indexed_fields(path: &Path) -> Result<BTreeSet<String>> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        ConfigError::Io(std::io::Error::new(
            err.kind(),
            format!("failed to read indexed fields {}: {err}", path.display()),
        ))
    })?;
    Ok(parse_indexed_fields(&content))
}

pub fn parse_indexed_fields(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
