//! Bus event trace readers (CSV, JSON Lines)
//!
//! This module contains readers for the trace files a lower-level I²C decoder
//! can export. Each reader implements an iterator pattern over `BusEvent`s.

use crate::types::{BusEvent, DecoderError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod csv;
pub mod jsonl;

// Re-export reader types
pub use csv::CsvTraceReader;
pub use jsonl::JsonLinesTraceReader;

/// Common trait for all trace readers
///
/// This trait provides a unified interface for reading different trace formats.
/// Each reader yields bus events in file order; a malformed line comes out as an
/// `Err` item and reading continues with the next line.
pub trait TraceReader: Iterator<Item = Result<BusEvent>> + Sized {
    /// Open a trace file and return an iterator over its bus events
    fn open(path: &Path) -> Result<Self>;
}

/// Open a file for buffered reading, with a readable error if it is missing
/// or not a regular file
pub(crate) fn open_buffered(path: &Path, format: &str) -> Result<BufReader<File>> {
    log::info!("Opening {} trace: {:?}", format, path);

    if !path.exists() {
        return Err(DecoderError::LogParseError(format!(
            "{} trace not found: {:?}",
            format, path
        )));
    }
    if !path.is_file() {
        return Err(DecoderError::LogParseError(format!(
            "{} trace is not a file: {:?}",
            format, path
        )));
    }

    let file = File::open(path).map_err(|e| {
        DecoderError::LogParseError(format!("Failed to open {} trace: {}", format, e))
    })?;

    Ok(BufReader::new(file))
}
