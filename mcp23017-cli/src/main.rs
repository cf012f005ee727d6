//! MCP23017 Trace Decoder CLI Application
//!
//! This is the command-line interface for the MCP23017 decoder library.
//! It adds:
//! - Argument parsing and config.toml loading
//! - Logging setup
//! - Text and JSON Lines output
//! - A per-chip summary report

use anyhow::{Context, Result};
use clap::Parser;
use mcp23017_decoder::{Bank, DecodedTransaction, Decoder};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::Summary;

/// MCP23017 Trace Decoder - Decode I²C traces into MCP23017 register accesses
#[derive(Parser, Debug)]
#[command(name = "mcp23017-cli")]
#[command(about = "Decode I²C traces (CSV, JSON Lines) into MCP23017 register accesses", long_about = None)]
#[command(version)]
struct Args {
    /// Trace file(s) to decode (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    input: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initial IOCON.BANK for every chip (0 or 1)
    #[arg(long, value_name = "BANK", value_parser = clap::value_parser!(u8).range(0..=1))]
    initial_bank: Option<u8>,

    /// Show the individual bits of IOCON
    #[arg(long)]
    show_iocon_bits: bool,

    /// Merge a pointer write and the read after a repeated start into one transaction
    #[arg(long)]
    combine_repeated_start: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for decoded transactions (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print a per-chip summary when done
    #[arg(long)]
    summary: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("MCP23017 Trace Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", mcp23017_decoder::VERSION);

    let config = resolve_config(&args)?;

    if config.input.files.is_empty() {
        println!("MCP23017 Trace Decoder - No input specified");
        println!("\nQuick Start:");
        println!("  mcp23017-cli --input capture.csv");
        println!("  mcp23017-cli --input capture.jsonl --show-iocon-bits --format json");
        println!("\nWith a configuration file:");
        println!("  mcp23017-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    run(&config)
}

/// Merge config.toml (if any) with command line flags; flags win
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    config.input.files.extend(args.input.iter().cloned());

    if let Some(bank) = args.initial_bank {
        let bank = Bank::try_from(bank).map_err(anyhow::Error::msg)?;
        config.decoder = config.decoder.with_initial_bank(bank);
    }
    if args.show_iocon_bits {
        config.decoder = config.decoder.with_iocon_bits(true);
    }
    if args.combine_repeated_start {
        config.decoder = config.decoder.with_combined_repeated_start(true);
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(path) = &args.output {
        config.output.path = Some(path.clone());
    }
    config.output.summary |= args.summary;

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Decode every input file in one session and write the records
fn run(config: &AppConfig) -> Result<()> {
    let mut out: Box<dyn Write> = match &config.output.path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut decoder = Decoder::new(config.decoder);
    let mut summary = Summary::default();

    for path in &config.input.files {
        summary.files += 1;
        let records = decoder
            .decode_file(path)
            .with_context(|| format!("Failed to open trace: {:?}", path))?;

        for result in records {
            match result {
                Ok(record) => {
                    write_record(&mut out, &record, config.output.format)?;
                    summary.record(&record);
                }
                Err(e) => {
                    log::warn!("{:?}: {}", path, e);
                    summary.trace_errors += 1;
                }
            }
        }
    }

    if config.output.summary {
        let text = summary.render(&decoder);
        match config.output.format {
            // Keep JSON Lines output machine-readable
            OutputFormat::Json => eprint!("{}", text),
            OutputFormat::Text => write!(out, "\n{}", text)?,
        }
    }

    out.flush()?;
    Ok(())
}

fn write_record(out: &mut dyn Write, record: &DecodedTransaction, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let start = record.start_time();
            writeln!(
                out,
                "[{:>5}.{:06}s] {}",
                start.num_seconds(),
                start.subsec_nanos() / 1_000,
                record
            )?
        }
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(record)?)?,
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
