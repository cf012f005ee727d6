//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct chains the frame reassembler and the register decoder
//! and owns both for the length of one decoding session.

use crate::config::DecoderConfig;
use crate::formats::{CsvTraceReader, JsonLinesTraceReader, TraceReader};
use crate::reassembler::FrameReassembler;
use crate::register_decoder::RegisterDecoder;
use crate::registers::Bank;
use crate::types::{BusEvent, DecodedTransaction, DecoderError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    config: DecoderConfig,
    reassembler: FrameReassembler,
    registers: RegisterDecoder,
}

impl Decoder {
    /// Create a new decoder session
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            reassembler: FrameReassembler::with_combined_repeated_start(config.combine_repeated_start),
            registers: RegisterDecoder::new(&config),
        }
    }

    /// Session configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// IOCON.BANK currently tracked for a chip
    pub fn bank(&self, chip_address: u8) -> Bank {
        self.registers.bank(chip_address)
    }

    /// Restart the session: drop any partial transaction and restore the
    /// configured initial bank on every chip
    pub fn reset(&mut self) {
        self.reassembler.reset();
        self.registers.reset_banks();
    }

    /// Feed one bus event; returns a decoded record when it completes a transaction
    ///
    /// # Example
    /// ```
    /// use mcp23017_decoder::{BusEvent, Decoder, DecoderConfig};
    ///
    /// let mut decoder = Decoder::new(DecoderConfig::new());
    /// let events = [
    ///     BusEvent::Start { start_ns: 0, end_ns: 1 },
    ///     BusEvent::Address { start_ns: 2, end_ns: 3, address: 0x20, read: false, ack: true },
    ///     BusEvent::Data { start_ns: 4, end_ns: 5, byte: 0x12 },
    ///     BusEvent::Data { start_ns: 6, end_ns: 7, byte: 0xff },
    ///     BusEvent::Stop { start_ns: 8, end_ns: 9 },
    /// ];
    ///
    /// let records: Vec<_> = events.iter().filter_map(|e| decoder.process(e)).collect();
    /// assert_eq!(records[0].to_string(), "Addr. 0x20: write {GPIOA=0xff}");
    /// ```
    pub fn process(&mut self, event: &BusEvent) -> Option<DecodedTransaction> {
        let transaction = self.reassembler.process(event)?;
        log::trace!(
            "Transaction on chip 0x{:02X}: {} byte(s), read={}",
            transaction.chip_address,
            transaction.bytes.len(),
            transaction.is_read
        );
        self.registers.decode(&transaction)
    }

    /// Decode a sequence of events, collecting every record
    pub fn decode_all<'e, I>(&mut self, events: I) -> Vec<DecodedTransaction>
    where
        I: IntoIterator<Item = &'e BusEvent>,
    {
        events.into_iter().filter_map(|event| self.process(event)).collect()
    }

    /// Lazily decode a stream of events as produced by a trace reader
    ///
    /// Reader errors are passed through unchanged; decoding continues with the
    /// next event.
    pub fn decode_events<I>(&mut self, events: I) -> DecodingIterator<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Result<BusEvent>>,
    {
        DecodingIterator {
            events: events.into_iter(),
            decoder: self,
        }
    }

    /// Decode a trace file and return an iterator of decoded records
    ///
    /// The format is picked from the file extension: `.csv` for analyzer
    /// exports, `.jsonl` / `.ndjson` / `.json` for JSON Lines.
    ///
    /// # Example
    /// ```no_run
    /// use mcp23017_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new(DecoderConfig::new());
    /// for record in decoder.decode_file(Path::new("capture.csv")).unwrap() {
    ///     match record {
    ///         Ok(record) => println!("{}", record),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn decode_file(
        &mut self,
        path: &Path,
    ) -> Result<Box<dyn Iterator<Item = Result<DecodedTransaction>> + '_>> {
        log::info!("Decoding trace file: {:?}", path);

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("csv") => {
                log::debug!("Detected CSV trace format");
                self.decode_trace::<CsvTraceReader<BufReader<File>>>(path)
            }
            Some("jsonl") | Some("ndjson") | Some("json") => {
                log::debug!("Detected JSON Lines trace format");
                self.decode_trace::<JsonLinesTraceReader<BufReader<File>>>(path)
            }
            _ => Err(DecoderError::LogParseError(format!(
                "Unsupported file format: {:?}",
                extension
            ))),
        }
    }

    /// Decode a trace file with an explicitly chosen reader
    pub fn decode_trace<R>(
        &mut self,
        path: &Path,
    ) -> Result<Box<dyn Iterator<Item = Result<DecodedTransaction>> + '_>>
    where
        R: TraceReader + 'static,
    {
        let events = R::open(path)?;
        Ok(Box::new(self.decode_events(events)))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

/// Iterator that turns bus events into decoded records
pub struct DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<BusEvent>>,
{
    events: I,
    decoder: &'a mut Decoder,
}

impl<'a, I> Iterator for DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<BusEvent>>,
{
    type Item = Result<DecodedTransaction>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.events.next()? {
                Ok(event) => {
                    if let Some(record) = self.decoder.process(&event) {
                        return Some(Ok(record));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
