mod logging;

use std::path::PathBuf;
use std::time::Instant;

use casegen_config::{
    ConfigError, GeneratorSettings, ValidatedConfig, config_json_schema, load_config,
    load_settings,
};
use casegen_core::FieldCase;
use casegen_engine::{GenerateOptions, GenerationEngine, GenerationError, GenerationMode};
use clap::{Args, Parser, Subcommand};
use logging::init_logging;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "casegen", version, about = "Constraint-based test data generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a fixed number of data sets.
    Generate(GenerateArgs),
    /// Enumerate data sets until every boundary case has been produced.
    Cases(CasesArgs),
    /// Validate a constraint configuration.
    Validate(ValidateArgs),
    /// Print the JSON Schema of the configuration format.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Constraint configuration (JSON); overrides the settings file entry.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Generator settings (TOML).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Seed override.
    #[arg(long)]
    seed: Option<u64>,
    /// Treat every optional constraint as mandatory.
    #[arg(long, default_value_t = false)]
    ignore_optional: bool,
    /// Deterministic mode (seed 0 unless configured).
    #[arg(long, default_value_t = false)]
    test_mode: bool,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    out_dir: PathBuf,
    /// Write JSON logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Number of data sets.
    #[arg(long, default_value_t = 10)]
    data_sets: u64,
    /// Case requested for every data set.
    #[arg(long, default_value = "normal")]
    case: FieldCase,
}

#[derive(Args, Debug)]
struct CasesArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Upper bound on generated data sets.
    #[arg(long, default_value_t = 1000)]
    limit: u64,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generation(
            args.run,
            GenerationMode::Random {
                data_sets: args.data_sets,
                case: args.case,
            },
        ),
        Command::Cases(args) => run_generation(args.run, GenerationMode::Cases { limit: args.limit }),
        Command::Validate(args) => run_validate(args),
        Command::Schema(args) => run_schema(args),
    }
}

fn run_generation(args: RunArgs, mode: GenerationMode) -> Result<(), CliError> {
    init_logging(args.log_file.as_deref())?;
    let settings = resolve_settings(&args)?;

    let timer = Instant::now();
    let validated = load_config(&settings.config_file)?;
    log_warnings(&validated);
    tracing::info!(
        event = "config_loaded",
        path = %settings.config_file.display(),
        constraints = validated.config.constraints.len()
    );

    let options = GenerateOptions {
        out_dir: args.out_dir,
        mode,
    };
    let result = GenerationEngine::new(options).run(&validated.config, &settings)?;

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    println!("run_dir={}", result.run_dir.display());
    println!("data_sets={}", result.report.data_sets_generated);
    Ok(())
}

/// Settings file (or defaults) with command-line overrides applied.
fn resolve_settings(args: &RunArgs) -> Result<GeneratorSettings, CliError> {
    let mut settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => GeneratorSettings::default(),
    };
    if let Some(config) = &args.config {
        settings.config_file = config.clone();
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    settings.ignore_optional_constraints |= args.ignore_optional;
    settings.test_mode |= args.test_mode;
    Ok(settings)
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    match load_config(&args.config) {
        Ok(validated) => {
            for warning in &validated.warnings {
                eprintln!("warning: {warning}");
            }
            println!(
                "ok: {} constraints ({})",
                validated.config.constraints.len(),
                args.config.display()
            );
            Ok(())
        }
        Err(ConfigError::Invalid(report)) => {
            for issue in &report.errors {
                eprintln!("error: {issue}");
                if let Some(hint) = &issue.hint {
                    eprintln!("  hint: {hint}");
                }
            }
            Err(ConfigError::Invalid(report).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = serde_json::to_string_pretty(&config_json_schema())?;
    match args.out {
        Some(path) => std::fs::write(path, schema)?,
        None => println!("{schema}"),
    }
    Ok(())
}

fn log_warnings(validated: &ValidatedConfig) {
    for warning in &validated.warnings {
        tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
    }
}
