//! Schema Codegen CLI
//!
//! Composes the schema fragments into the canonical artifact and keeps the
//! published copy honest.
//!
//! Usage:
//!   schema-codegen validate
//!   schema-codegen json --output dist/oxa-schema.json
//!   schema-codegen check --artifact dist/oxa-schema.json

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oxa_schema::{compose, detect_drift, fragment, ComposedSchema, OxaConfig, SchemaFragment, SchemaRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-codegen")]
#[command(about = "Compose, publish and check the OXA schema artifact")]
struct Cli {
    /// Config file, layered over oxa.toml and OXA__* variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fragment directory (default: [schema].fragment_dir, then the embedded set)
    #[arg(short, long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, compose, lint and compile every type
    Validate,

    /// Write the composed schema artifact
    Json {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare a published artifact with a fresh composition
    Check {
        /// Published artifact (default: [schema].artifact)
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = OxaConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    let dir = cli.schema_dir.clone().or_else(|| config.fragment_dir());
    let fragments = load_fragments(dir.as_deref())?;
    let schema = compose(&fragments, &config.compose)?;

    match cli.command {
        Commands::Validate => {
            let registry = SchemaRegistry::new(schema)?;
            for name in registry.type_names() {
                registry
                    .compile(Some(&name))?
                    .with_context(|| format!("type {} disappeared from the schema", name))?;
            }
            println!(
                "✅ {} fragments composed, {} validators compiled",
                fragments.len(),
                registry.compiled_count()
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::Json { output } => {
            let json = schema.to_json_pretty()?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, &json).with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("✅ Schema written to {} ({})", path.display(), schema.checksum()?.short());
                }
                None => print!("{}", json),
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check { artifact } => {
            let path = artifact.unwrap_or_else(|| config.schema.artifact.clone());
            check(&path, &schema)
        }
    }
}

fn load_fragments(dir: Option<&Path>) -> Result<Vec<SchemaFragment>> {
    let fragments = match dir {
        Some(dir) => fragment::load_from_directory(dir)
            .with_context(|| format!("failed to load fragments from {}", dir.display()))?,
        None => fragment::load_embedded()?,
    };
    Ok(fragments)
}

fn check(path: &Path, schema: &ComposedSchema) -> Result<ExitCode> {
    let published = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let fresh = schema.to_json_pretty()?;

    match detect_drift(&published, &fresh) {
        None => {
            println!("✅ {} is up to date ({})", path.display(), schema.checksum()?.short());
            Ok(ExitCode::SUCCESS)
        }
        Some(drift) => {
            println!("❌ {} is out of date: {}", path.display(), drift.summary());
            println!();
            print!("{}", drift.diff);
            Ok(ExitCode::from(1))
        }
    }
}
