//! enrich-extract CLI - typed extraction of enriched events into NDJSON rows

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use enrich_extract::field_types;
use enrich_extract::{
    validate_schema, EventExtractor, ExtractionError, ExtractorConfig, NdjsonWriter, OnError,
    TsvEventTransformer,
};
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "enrich-extract")]
#[command(version, about = "Extract typed rows from tab-separated enriched events", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract rows from enriched events
    Extract {
        /// Path to the extractor configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Input file with one enriched event per line (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output NDJSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip lines that fail to extract, overriding `on_error` in the config
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Check the configured schema against the enriched event fields
    Validate {
        /// Path to the extractor configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List the fixed enriched event fields and their types
    Fields,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Extract {
            config,
            input,
            output,
            skip_invalid,
        } => extract(config, input, output, skip_invalid),
        Commands::Validate { config } => validate(config),
        Commands::Fields => list_fields(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn extract(
    config: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    skip_invalid: bool,
) -> CliResult {
    let config = ExtractorConfig::load_from_file(&config)?;
    let on_error = if skip_invalid {
        OnError::Skip
    } else {
        config.on_error
    };

    let extractor = EventExtractor::new(config.schema(), TsvEventTransformer::new())?
        .with_max_depth(config.max_depth);

    let reader: Box<dyn BufRead> = match &input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut writer = NdjsonWriter::new(sink);

    let mut skipped = 0usize;
    let mut rows = extractor.extract(reader);
    while let Some(result) = rows.next() {
        match result {
            Ok(row) => writer.write(&row)?,
            Err(e) if on_error == OnError::Skip && !matches!(e, ExtractionError::Io(_)) => {
                skipped += 1;
                for message in e.messages() {
                    tracing::warn!("Skipping line {}: {}", rows.line_number(), message);
                }
            }
            Err(e) => {
                writer.flush()?;
                return Err(format!("line {}: {}", rows.line_number(), e).into());
            }
        }
    }
    writer.flush()?;

    tracing::info!(
        "Extracted {} rows from {} lines ({} skipped)",
        writer.written(),
        rows.line_number(),
        skipped
    );
    Ok(())
}

fn validate(config: PathBuf) -> CliResult {
    let config = ExtractorConfig::load_from_file(&config)?;
    match validate_schema(&config.schema()) {
        Ok(()) => {
            println!("✓ {} columns valid", config.columns.len());
            Ok(())
        }
        Err(e) => {
            for message in e.messages() {
                println!("✗ {}", message);
            }
            Err(format!("{} invalid columns", e.messages().len()).into())
        }
    }
}

fn list_fields() -> CliResult {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (name, kind) in field_types::fields() {
        writeln!(out, "{}\t{}", name, kind)?;
    }
    Ok(())
}
