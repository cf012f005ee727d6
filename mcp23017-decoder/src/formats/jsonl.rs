//! JSON Lines trace reader
//!
//! One bus event per line, in the serde representation of `BusEvent`:
//!
//! ```text
//! {"type":"start","start_ns":0,"end_ns":500}
//! {"type":"address","start_ns":1000,"end_ns":9000,"address":32,"read":false,"ack":true}
//! {"type":"data","start_ns":10000,"end_ns":18000,"byte":10}
//! {"type":"stop","start_ns":20000,"end_ns":20500}
//! ```

use super::{open_buffered, TraceReader};
use crate::types::{BusEvent, DecoderError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Iterator over bus events from a JSON Lines file
pub struct JsonLinesTraceReader<R: BufRead> {
    lines: Lines<R>,
    line_number: usize,
    /// Set after an I/O error; the underlying reader is not retried
    failed: bool,
}

impl<R: BufRead> JsonLinesTraceReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            failed: false,
        }
    }
}

impl JsonLinesTraceReader<BufReader<File>> {
    /// Open a JSON Lines trace file
    pub fn parse(path: &Path) -> Result<Self> {
        Ok(Self::from_reader(open_buffered(path, "JSON Lines")?))
    }
}

impl TraceReader for JsonLinesTraceReader<BufReader<File>> {
    fn open(path: &Path) -> Result<Self> {
        Self::parse(path)
    }
}

impl<R: BufRead> Iterator for JsonLinesTraceReader<R> {
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

            return Some(serde_json::from_str(&line).map_err(|e| DecoderError::InvalidData {
                line: self.line_number,
                reason: e.to_string(),
            }));
        }
    }
}
