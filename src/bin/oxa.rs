//! OXA Document CLI
//!
//! Validates OXA documents (JSON or YAML) against the composed OXA schema.
//!
//! Exit codes: 0 when every input is valid, 1 when any input is invalid,
//! 2 when the command itself could not run.

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oxa_schema::{
    compose, fragment, validate_path_as, validate_text, Encoding, OxaConfig, PrettyMode, SchemaRegistry,
    ValidateOptions, ValidationResult,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oxa")]
#[command(about = "Validate OXA documents against the OXA schema")]
struct Cli {
    /// Config file, layered over oxa.toml and OXA__* variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Load schema fragments from this directory instead of the embedded set
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate documents
    Validate {
        /// Files to validate, or "-" for standard input
        #[arg(default_value = "-")]
        files: Vec<String>,

        /// Type to validate against (default: the root type)
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Parse every input as JSON
        #[arg(long, conflicts_with = "yaml")]
        json: bool,

        /// Parse every input as YAML
        #[arg(long)]
        yaml: bool,

        /// Only report invalid inputs
        #[arg(short, long)]
        quiet: bool,

        /// Human-readable output
        #[arg(long, value_enum)]
        pretty: Option<PrettyMode>,
    },

    /// List the schema's type names
    Types,

    /// Print the composed schema
    Schema,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
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
    let registry = build_registry(&config, cli.schema_dir.as_deref())?;

    match cli.command {
        Commands::Validate {
            files,
            type_name,
            json,
            yaml,
            quiet,
            pretty,
        } => {
            let encoding = match (json, yaml) {
                (true, _) => Some(Encoding::Json),
                (_, true) => Some(Encoding::Yaml),
                _ => None,
            };
            let quiet = quiet || config.output.quiet;
            // Failures are written to stderr
            let pretty = pretty
                .unwrap_or(config.output.pretty)
                .enabled(io::stderr().is_terminal());

            let mut options = ValidateOptions::new().with_pretty(pretty);
            if let Some(name) = type_name.as_deref() {
                options = options.with_type(name);
            }

            let mut all_valid = true;
            for input in &files {
                let result = validate_input(&registry, input, encoding, &options)?;
                all_valid &= result.valid;
                let name = if input == "-" { "<stdin>" } else { input.as_str() };
                write_result(&mut io::stdout().lock(), &mut io::stderr().lock(), name, &result, pretty, quiet)?;
            }

            Ok(if all_valid { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }

        Commands::Types => {
            for name in registry.type_names() {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Schema => {
            print!("{}", registry.schema().to_json_pretty()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_registry(config: &OxaConfig, schema_dir: Option<&Path>) -> Result<SchemaRegistry> {
    let dir = schema_dir.map(Path::to_path_buf).or_else(|| config.fragment_dir());
    let registry = match dir {
        Some(dir) => SchemaRegistry::from_dir(&dir, &config.compose)
            .with_context(|| format!("failed to load schema from {}", dir.display()))?,
        None => {
            let fragments = fragment::load_embedded()?;
            SchemaRegistry::new(compose(&fragments, &config.compose)?)?
        }
    };
    Ok(registry)
}

fn validate_input(
    registry: &SchemaRegistry,
    input: &str,
    encoding: Option<Encoding>,
    options: &ValidateOptions<'_>,
) -> Result<ValidationResult> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        return Ok(validate_text(registry, &text, encoding.unwrap_or_default(), options));
    }

    let path = Path::new(input);
    let encoding = encoding.unwrap_or_else(|| Encoding::from_path(path));
    Ok(validate_path_as(registry, path, encoding, options))
}

/// Valid inputs get a line on `out` unless `quiet`; invalid inputs are
/// always reported on `err`
fn write_result(
    out: &mut impl Write,
    err: &mut impl Write,
    name: &str,
    result: &ValidationResult,
    pretty: bool,
    quiet: bool,
) -> Result<()> {
    if result.valid {
        if !quiet {
            writeln!(out, "{}: valid", name)?;
        }
        return Ok(());
    }

    if pretty {
        writeln!(err, "{}: invalid", name)?;
        if let Some(report) = &result.pretty_output {
            write!(err, "{}", report)?;
        }
    } else {
        let line = serde_json::json!({
            "file": name,
            "valid": false,
            "errors": result.errors,
        });
        writeln!(err, "{}", serde_json::to_string(&line)?)?;
    }
    Ok(())
}
