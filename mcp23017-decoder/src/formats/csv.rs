//! CSV trace reader
//!
//! Reads the table a logic analyzer's I²C decoder exports. The first line is a
//! header naming the columns; column order is free.
//!
//! ## Columns
//! - `type` (required): `start`, `address`, `data` or `stop`
//! - `start_time`, `duration` (required): seconds, as floats
//! - `ack`, `read`: `true`/`false` or `1`/`0`
//! - `address`, `data`: `0x`-prefixed hex or decimal
//!
//! Rows of any other type (e.g. analyzer error markers) are skipped with a
//! warning logged once per type.

use super::{open_buffered, TraceReader};
use crate::types::{BusEvent, DecoderError, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Iterator over bus events from a CSV export
pub struct CsvTraceReader<R: BufRead> {
    lines: Lines<R>,
    line_number: usize,
    /// Set after an I/O error; the underlying reader is not retried
    failed: bool,
    columns: Option<HashMap<String, usize>>,
    skipped_types: HashSet<String>,
}

impl<R: BufRead> CsvTraceReader<R> {
    /// Read CSV rows from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            failed: false,
            columns: None,
            skipped_types: HashSet::new(),
        }
    }

    fn read_header(&mut self, line: &str) {
        let columns = split_row(line)
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name.trim().to_lowercase(), index))
            .collect();
        self.columns = Some(columns);
    }

    /// Parse one data row; `Ok(None)` means the row is skipped
    fn parse_row(&mut self, line: &str) -> Result<Option<BusEvent>> {
        let line_number = self.line_number;
        let columns = self.columns.as_ref().ok_or_else(|| DecoderError::InvalidData {
            line: line_number,
            reason: "missing header row".to_string(),
        })?;
        let cells = split_row(line);
        let row = Row {
            cells: &cells,
            columns,
            line: line_number,
        };

        let kind = row.required("type")?.to_lowercase();
        if !matches!(kind.as_str(), "start" | "address" | "data" | "stop") {
            if self.skipped_types.insert(kind.clone()) {
                log::warn!("Skipping unsupported row type '{}' (line {})", kind, line_number);
            }
            return Ok(None);
        }

        let start_ns = seconds_to_ns(row.required("start_time")?)
            .ok_or_else(|| row.invalid("start_time is not a valid time"))?;
        let duration_ns = seconds_to_ns(row.required("duration")?)
            .ok_or_else(|| row.invalid("duration is not a valid time"))?;
        let end_ns = start_ns.saturating_add(duration_ns);

        let event = match kind.as_str() {
            "start" => BusEvent::Start { start_ns, end_ns },
            "stop" => BusEvent::Stop { start_ns, end_ns },
            "address" => {
                let address = row.byte("address")?;
                if address > 0x7f {
                    return Err(row.invalid("address does not fit in 7 bits"));
                }
                BusEvent::Address {
                    start_ns,
                    end_ns,
                    address,
                    read: row.flag("read")?,
                    ack: row.flag("ack")?,
                }
            }
            _ => BusEvent::Data {
                start_ns,
                end_ns,
                byte: row.byte("data")?,
            },
        };

        Ok(Some(event))
    }
}

impl CsvTraceReader<BufReader<File>> {
    /// Open a CSV trace file
    pub fn parse(path: &Path) -> Result<Self> {
        Ok(Self::from_reader(open_buffered(path, "CSV")?))
    }
}

impl TraceReader for CsvTraceReader<BufReader<File>> {
    fn open(path: &Path) -> Result<Self> {
        Self::parse(path)
    }
}

impl<R: BufRead> Iterator for CsvTraceReader<R> {
    type Item = Result<BusEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let line = self.lines.next()?;
            self.line_number += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            };

            if line.trim().is_empty() {
                continue;
            }
            if self.columns.is_none() {
                self.read_header(&line);
                continue;
            }

            match self.parse_row(&line) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// One data row with its header lookup
struct Row<'a> {
    cells: &'a [String],
    columns: &'a HashMap<String, usize>,
    line: usize,
}

impl Row<'_> {
    fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|&index| self.cells.get(index))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    fn required(&self, column: &str) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| self.invalid(&format!("missing '{}' value", column)))
    }

    fn byte(&self, column: &str) -> Result<u8> {
        let raw = self.required(column)?;
        parse_byte(raw).ok_or_else(|| self.invalid(&format!("'{}' is not a byte: {}", column, raw)))
    }

    fn flag(&self, column: &str) -> Result<bool> {
        let raw = self.required(column)?;
        parse_flag(raw).ok_or_else(|| self.invalid(&format!("'{}' is not a boolean: {}", column, raw)))
    }

    fn invalid(&self, reason: &str) -> DecoderError {
        DecoderError::InvalidData {
            line: self.line,
            reason: reason.to_string(),
        }
    }
}

/// Split a CSV row into cells, honoring double quotes
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

fn seconds_to_ns(raw: &str) -> Option<u64> {
    let seconds: f64 = raw.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1e9).round() as u64)
}

fn parse_byte(raw: &str) -> Option<u8> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
