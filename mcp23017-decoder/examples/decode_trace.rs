//! Standalone MCP23017 trace decoder
//!
//! Decodes a CSV or JSON Lines I²C trace and prints one line per MCP23017
//! transaction, followed by a summary.
//!
//! Usage:
//!   decode_trace <trace.csv|trace.jsonl> [--bank <0|1>] [--bits] [--combine] [--limit <count>]
//!
//! Example:
//!   RUST_LOG=debug decode_trace capture.csv --bits --limit 100

use mcp23017_decoder::{DecodedTransaction, Decoder, DecoderConfig, Direction, BASE_ADDRESS, NUM_ADDRESSES};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

#[derive(Default)]
struct TraceStats {
    transactions: usize,
    reads: usize,
    writes: usize,
    fields: usize,
    trace_errors: usize,
    per_chip: BTreeMap<u8, usize>,
}

impl TraceStats {
    fn record(&mut self, record: &DecodedTransaction) {
        self.transactions += 1;
        match record.direction {
            Direction::Read => self.reads += 1,
            Direction::Write => self.writes += 1,
        }
        self.fields += record.fields.len();
        *self.per_chip.entry(record.address).or_insert(0) += 1;
    }

    fn print_summary(&self, decoder: &Decoder) {
        println!("\n=== DECODING SUMMARY ===");
        println!("Transactions: {}", self.transactions);
        println!("  Reads:  {}", self.reads);
        println!("  Writes: {}", self.writes);
        println!("Register fields: {}", self.fields);
        println!("Trace errors skipped: {}", self.trace_errors);

        if !self.per_chip.is_empty() {
            println!("\nPer chip:");
            for address in BASE_ADDRESS..BASE_ADDRESS + NUM_ADDRESSES {
                if let Some(count) = self.per_chip.get(&address) {
                    println!(
                        "  0x{:02X}: {} transactions, IOCON.BANK={}",
                        address,
                        count,
                        u8::from(decoder.bank(address))
                    );
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <trace.csv|trace.jsonl> [--bank <0|1>] [--bits] [--combine] [--limit <count>]",
            args[0]
        );
        eprintln!("\nExample:");
        eprintln!("  {} capture.csv --bits --limit 100", args[0]);
        std::process::exit(1);
    }

    let trace_file = PathBuf::from(&args[1]);
    let mut bank = 0u8;
    let mut show_bits = false;
    let mut combine = false;
    let mut limit: Option<usize> = None;

    // Parse arguments
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--bank" => {
                i += 1;
                if i < args.len() {
                    bank = args[i].parse()?;
                }
            }
            "--bits" => show_bits = true,
            "--combine" => combine = true,
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    let config = DecoderConfig::from_settings(bank, show_bits)?.with_combined_repeated_start(combine);

    println!("=== MCP23017 Trace Decoder ===");
    println!("Trace file: {:?}", trace_file);
    println!("Initial IOCON.BANK: {}", u8::from(config.initial_bank));
    println!("IOCON bits: {}", config.show_iocon_bits);
    println!("Combine repeated start: {}", config.combine_repeated_start);
    println!();

    let mut decoder = Decoder::new(config);
    let mut stats = TraceStats::default();

    {
        let records = decoder.decode_file(&trace_file)?;
        for result in records {
            match result {
                Ok(record) => {
                    if let Some(max) = limit {
                        if stats.transactions >= max {
                            println!("\n... (limit of {} transactions reached)", max);
                            break;
                        }
                    }
                    let start = record.start_time();
                    println!("[{}.{:06}s] {}", start.num_seconds(), start.subsec_nanos() / 1_000, record);
                    stats.record(&record);
                }
                Err(e) => {
                    stats.trace_errors += 1;
                    eprintln!("Error reading trace: {}", e);
                }
            }
        }
    }

    stats.print_summary(&decoder);

    Ok(())
}
