use std::env;
use std::path::PathBuf;

use casegen_config::{GeneratorSettings, load_config};
use casegen_engine::{GenerateOptions, GenerationEngine, GenerationMode};
use casegen_core::FieldCase;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut data_sets = 10_u64;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            "--out" => out_dir = args.next().map(PathBuf::from),
            "--data-sets" => {
                data_sets = args.next().ok_or("missing --data-sets value")?.parse()?;
            }
            _ => {
                if config_path.is_none() {
                    config_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let config_path = config_path.ok_or("missing --config path")?;
    let validated = load_config(&config_path)?;

    let mut options = GenerateOptions::default();
    options.mode = GenerationMode::Random {
        data_sets,
        case: FieldCase::Normal,
    };
    if let Some(out_dir) = out_dir {
        options.out_dir = out_dir;
    }

    let settings = GeneratorSettings {
        config_file: config_path,
        ..GeneratorSettings::default()
    };
    let engine = GenerationEngine::new(options);
    let result = engine.run(&validated.config, &settings)?;

    println!("run_dir={}", result.run_dir.display());
    Ok(())
}
