//! I²C transaction reassembly
//!
//! Rebuilds one logical transaction from the stream of start / address / data /
//! stop events produced by a lower-level I²C decoder. Traffic for other devices,
//! unacknowledged address phases and anything outside an address phase are
//! dropped without error; the reassembler always finds its way back to `Idle`.

use crate::registers::is_watched_address;
use crate::types::{BusEvent, Transaction};

/// Reassembly state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblerState {
    /// Waiting for a start condition
    Idle,
    /// Start seen, waiting for the address phase
    SawStart,
    /// Addressed to a watched chip, collecting data bytes
    InTransaction,
}

/// Frame reassembler - turns bus events into transactions
#[derive(Debug, Clone)]
pub struct FrameReassembler {
    state: ReassemblerState,
    combine_repeated_start: bool,
    start_ns: u64,
    chip_address: u8,
    is_read: bool,
    payload: Vec<u8>,
}

impl FrameReassembler {
    /// Create a reassembler that abandons a transaction on repeated start
    pub fn new() -> Self {
        Self {
            state: ReassemblerState::Idle,
            combine_repeated_start: false,
            start_ns: 0,
            chip_address: 0,
            is_read: false,
            payload: Vec::new(),
        }
    }

    /// Create a reassembler that keeps the payload across a repeated start
    ///
    /// A register-pointer write followed by a repeated start and a read phase
    /// then comes out as a single read transaction `[offset, values...]`.
    pub fn with_combined_repeated_start(combine: bool) -> Self {
        Self {
            combine_repeated_start: combine,
            ..Self::new()
        }
    }

    /// Current state
    pub fn state(&self) -> ReassemblerState {
        self.state
    }

    /// Drop any partial transaction and return to `Idle`
    pub fn reset(&mut self) {
        self.state = ReassemblerState::Idle;
        self.start_ns = 0;
        self.chip_address = 0;
        self.is_read = false;
        self.payload.clear();
    }

    /// Feed one event; returns a transaction when a stop closes one
    pub fn process(&mut self, event: &BusEvent) -> Option<Transaction> {
        match (self.state, *event) {
            (ReassemblerState::Idle, BusEvent::Start { start_ns, .. }) => {
                self.start_ns = start_ns;
                self.state = ReassemblerState::SawStart;
                None
            }
            (ReassemblerState::Idle, _) => None,

            (ReassemblerState::SawStart, BusEvent::Address { address, read, ack, .. }) => {
                if ack && is_watched_address(address) {
                    self.is_read |= read;
                    self.chip_address = address;
                    if !self.combine_repeated_start {
                        self.payload.clear();
                    }
                    self.state = ReassemblerState::InTransaction;
                } else {
                    log::trace!(
                        "Dropping sequence: address 0x{:02X} (ack={}) not accepted",
                        address,
                        ack
                    );
                    self.reset();
                }
                None
            }
            (ReassemblerState::SawStart, other) => {
                log::trace!("Dropping sequence: expected address, got {}", other.kind());
                self.reset();
                None
            }

            (ReassemblerState::InTransaction, BusEvent::Data { byte, .. }) => {
                self.payload.push(byte);
                None
            }
            (ReassemblerState::InTransaction, BusEvent::Start { start_ns, .. }) => {
                if !self.combine_repeated_start {
                    log::debug!(
                        "Repeated start on chip 0x{:02X}, abandoning {} byte(s)",
                        self.chip_address,
                        self.payload.len()
                    );
                    self.reset();
                    self.start_ns = start_ns;
                }
                self.state = ReassemblerState::SawStart;
                None
            }
            (ReassemblerState::InTransaction, BusEvent::Stop { end_ns, .. }) => {
                let transaction = Transaction {
                    start_ns: self.start_ns,
                    end_ns,
                    bytes: std::mem::take(&mut self.payload),
                    is_read: self.is_read,
                    chip_address: self.chip_address,
                };
                self.reset();
                Some(transaction)
            }
            (ReassemblerState::InTransaction, other) => {
                // A second address phase without a start in between
                log::trace!("Dropping sequence: unexpected {} inside transaction", other.kind());
                self.reset();
                None
            }
        }
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}
