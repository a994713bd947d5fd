//! Flatrow CLI - inspect delimited files and run options

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flatrow_core::{Format, Options, RowSource, detect_source};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flatrow")]
#[command(about = "Type-driven mapping between delimited rows and records", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect a file's delimiter and show its header row and row count
    Inspect {
        /// Delimited text file
        file: PathBuf,
    },

    /// Print run options in a chosen format
    Options {
        /// Options file (JSON, YAML, or TOML)
        file: Option<PathBuf>,
        /// Use the strict preset instead of a file
        #[arg(long, conflicts_with = "file")]
        strict: bool,
        /// Output format (json, yaml, or toml)
        #[arg(long, default_value = "toml")]
        to: Format,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Inspect { file } => cmd_inspect(&file),
        Commands::Options { file, strict, to } => cmd_options(file.as_deref(), strict, to),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", level, e))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut source = detect_source(file).context("Failed to read header line")?;

    let headers = source
        .read_row()
        .context("Failed to read header row")?
        .with_context(|| format!("{} is empty", path.display()))?;

    let mut rows = 0usize;
    while source
        .read_row()
        .with_context(|| format!("Failed to read row {}", rows))?
        .is_some()
    {
        rows += 1;
    }
    debug!(path = %path.display(), rows, "inspected file");

    println!(
        "delimiter: {}",
        char::from(source.delimiter()).escape_default()
    );
    println!("headers:   {}", headers.join(", "));
    println!("rows:      {}", rows);
    Ok(())
}

fn cmd_options(path: Option<&Path>, strict: bool, format: Format) -> Result<()> {
    let options = match path {
        Some(path) => Options::load(path)?,
        None if strict => Options::strict(),
        None => Options::default(),
    };
    debug!(%format, ?options, "rendering options");

    let text = options
        .render(format)
        .with_context(|| format!("Failed to render options as {}", format))?;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}
