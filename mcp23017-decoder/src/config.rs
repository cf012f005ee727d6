//! Decoder configuration types
//!
//! This module defines the session settings supplied by the host when a decoder
//! is constructed. They are fixed for the life of the session; changing them
//! means building a new decoder.

use crate::registers::Bank;
use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// IOCON.BANK assumed for every chip until a write to IOCON is observed
    #[serde(default)]
    pub initial_bank: Bank,

    /// Render IOCON as its individual named bits instead of one raw value
    #[serde(default)]
    pub show_iocon_bits: bool,

    /// Merge a repeated start into the running transaction instead of abandoning it
    #[serde(default)]
    pub combine_repeated_start: bool,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the initial IOCON.BANK for all chips
    pub fn with_initial_bank(mut self, bank: Bank) -> Self {
        self.initial_bank = bank;
        self
    }

    /// Builder method: enable or disable IOCON bit expansion
    pub fn with_iocon_bits(mut self, enabled: bool) -> Self {
        self.show_iocon_bits = enabled;
        self
    }

    /// Builder method: enable or disable merging across repeated starts
    pub fn with_combined_repeated_start(mut self, enabled: bool) -> Self {
        self.combine_repeated_start = enabled;
        self
    }

    /// Build a configuration from the raw host settings
    ///
    /// Hosts typically hand over the bank as a number; anything other than
    /// 0 or 1 is rejected.
    pub fn from_settings(initial_bank: u8, show_iocon_bits: bool) -> Result<Self> {
        let bank = Bank::try_from(initial_bank).map_err(DecoderError::InvalidConfig)?;
        Ok(Self::new()
            .with_initial_bank(bank)
            .with_iocon_bits(show_iocon_bits))
    }
}
