//! Core types for the MCP23017 decoder library
//!
//! This module defines the bus events the decoder consumes, the logical
//! transactions the reassembler produces and the decoded records handed to the
//! rendering layer.

use crate::registers::{IoconBit, Register};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time offset from the start of the capture
pub type Timestamp = Duration;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// A discrete bus event from the lower-level I²C decoder
///
/// Times are nanoseconds since the start of the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusEvent {
    /// Start (or repeated start) condition
    Start { start_ns: u64, end_ns: u64 },
    /// Address byte with direction bit and acknowledgment
    Address {
        start_ns: u64,
        end_ns: u64,
        /// 7-bit chip address
        address: u8,
        /// True if the R/W bit requested a read
        read: bool,
        /// True if the addressed device acknowledged
        ack: bool,
    },
    /// One data byte
    Data { start_ns: u64, end_ns: u64, byte: u8 },
    /// Stop condition
    Stop { start_ns: u64, end_ns: u64 },
}

impl BusEvent {
    /// Nanoseconds at which the event begins
    pub fn start_ns(&self) -> u64 {
        match self {
            BusEvent::Start { start_ns, .. }
            | BusEvent::Address { start_ns, .. }
            | BusEvent::Data { start_ns, .. }
            | BusEvent::Stop { start_ns, .. } => *start_ns,
        }
    }

    /// Nanoseconds at which the event ends
    pub fn end_ns(&self) -> u64 {
        match self {
            BusEvent::Start { end_ns, .. }
            | BusEvent::Address { end_ns, .. }
            | BusEvent::Data { end_ns, .. }
            | BusEvent::Stop { end_ns, .. } => *end_ns,
        }
    }

    /// Short name of the event kind, used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            BusEvent::Start { .. } => "start",
            BusEvent::Address { .. } => "address",
            BusEvent::Data { .. } => "data",
            BusEvent::Stop { .. } => "stop",
        }
    }
}

/// One complete addressed exchange, from start condition to stop condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Time of the opening start condition
    pub start_ns: u64,
    /// End time of the closing stop condition
    pub end_ns: u64,
    /// Payload bytes; the first one is the register offset
    pub bytes: Vec<u8>,
    /// True if any address phase requested a read
    pub is_read: bool,
    /// 7-bit chip address, always inside the watched window
    pub chip_address: u8,
}

impl Transaction {
    /// Transaction direction
    pub fn direction(&self) -> Direction {
        Direction::from_read_flag(self.is_read)
    }
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    pub fn from_read_flag(read: bool) -> Self {
        if read {
            Direction::Read
        } else {
            Direction::Write
        }
    }

    /// Label used by the rendering layer
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Read => "read",
            Direction::Write => "write",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single decoded register field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    /// A known register and its raw value
    Value { register: Register, value: u8 },
    /// An offset with no entry in the active register table
    Unrecognized { offset: u32, value: u8 },
    /// One named IOCON bit (verbose mode only)
    IoconBit { bit: IoconBit, set: bool },
}

impl fmt::Display for RegisterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterField::Value { register, value } => {
                write!(f, "{}={:#04x}", register.name(), value)
            }
            RegisterField::Unrecognized { offset, value } => {
                write!(f, "{:#04x}?={:#04x}", offset, value)
            }
            RegisterField::IoconBit { bit, set } => {
                write!(f, "{}={}", bit.name(), if *set { "True" } else { "False" })
            }
        }
    }
}

impl Serialize for RegisterField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decoded transaction - the primary output of the decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTransaction {
    /// Time of the opening start condition (ns since capture start)
    pub start_ns: u64,
    /// End time of the closing stop condition (ns since capture start)
    pub end_ns: u64,
    /// 7-bit chip address
    pub address: u8,
    /// Read or write
    pub direction: Direction,
    /// Register fields in offset order
    pub fields: Vec<RegisterField>,
}

impl DecodedTransaction {
    /// Start time as an offset from the capture start
    pub fn start_time(&self) -> Timestamp {
        to_timestamp(self.start_ns)
    }

    /// End time as an offset from the capture start
    pub fn end_time(&self) -> Timestamp {
        to_timestamp(self.end_ns)
    }

    /// All fields rendered and joined with `"; "`
    pub fn data_string(&self) -> String {
        self.fields
            .iter()
            .map(|field| field.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Nanoseconds to a `Timestamp`, saturating past `i64::MAX`
fn to_timestamp(ns: u64) -> Timestamp {
    Duration::nanoseconds(i64::try_from(ns).unwrap_or(i64::MAX))
}

impl fmt::Display for DecodedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Addr. {:#04x}: {} {{{}}}",
            self.address,
            self.direction,
            self.data_string()
        )
    }
}

/// Errors that can occur while reading traces or validating configuration
///
/// The decoding pipeline itself never fails; these only come from the
/// collaborators around it.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to parse trace file: {0}")]
    LogParseError(String),

    #[error("Invalid data at line {line}: {reason}")]
    InvalidData { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_display() {
        let field = RegisterField::Value {
            register: Register::Iocon,
            value: 0x80,
        };
        assert_eq!(field.to_string(), "IOCON=0x80");

        let field = RegisterField::Value {
            register: Register::GpioA,
            value: 0x05,
        };
        assert_eq!(field.to_string(), "GPIOA=0x05");

        let field = RegisterField::Unrecognized {
            offset: 0x1f,
            value: 0xff,
        };
        assert_eq!(field.to_string(), "0x1f?=0xff");

        let field = RegisterField::IoconBit {
            bit: IoconBit::Haen,
            set: true,
        };
        assert_eq!(field.to_string(), "HAEN=True");

        let field = RegisterField::IoconBit {
            bit: IoconBit::Odr,
            set: false,
        };
        assert_eq!(field.to_string(), "ODR=False");
    }

    #[test]
    fn test_record_display() {
        let record = DecodedTransaction {
            start_ns: 1_000,
            end_ns: 5_000,
            address: 0x20,
            direction: Direction::Write,
            fields: vec![
                RegisterField::Value {
                    register: Register::IodirA,
                    value: 0x00,
                },
                RegisterField::Value {
                    register: Register::IodirB,
                    value: 0xff,
                },
            ],
        };
        assert_eq!(record.data_string(), "IODIRA=0x00; IODIRB=0xff");
        assert_eq!(record.to_string(), "Addr. 0x20: write {IODIRA=0x00; IODIRB=0xff}");
        assert_eq!(record.start_time(), Duration::microseconds(1));
    }

    #[test]
    fn test_times_saturate() {
        let record = DecodedTransaction {
            start_ns: u64::MAX,
            end_ns: u64::MAX,
            address: 0x20,
            direction: Direction::Read,
            fields: Vec::new(),
        };
        assert_eq!(record.start_time(), Duration::nanoseconds(i64::MAX));
        assert_eq!(record.end_time(), Duration::nanoseconds(i64::MAX));
    }

    #[test]
    fn test_record_json() {
        let record = DecodedTransaction {
            start_ns: 0,
            end_ns: 10,
            address: 0x21,
            direction: Direction::Read,
            fields: vec![RegisterField::Value {
                register: Register::GpioB,
                value: 0x3a,
            }],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"start_ns":0,"end_ns":10,"address":33,"direction":"read","fields":["GPIOB=0x3a"]}"#
        );
    }

    #[test]
    fn test_bus_event_json_tagging() {
        let event: BusEvent = serde_json::from_str(
            r#"{"type":"address","start_ns":5,"end_ns":9,"address":32,"read":false,"ack":true}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            BusEvent::Address {
                start_ns: 5,
                end_ns: 9,
                address: 0x20,
                read: false,
                ack: true
            }
        );
        assert_eq!(event.kind(), "address");
        assert_eq!(event.start_ns(), 5);
        assert_eq!(event.end_ns(), 9);
    }
}
