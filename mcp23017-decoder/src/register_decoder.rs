//! Register Decoding Engine
//!
//! Translates the payload of a reassembled transaction into named register
//! fields. The first payload byte is the register pointer; the following bytes
//! are values for consecutive registers. Which name an offset maps to depends
//! on IOCON.BANK, which this decoder tracks per chip from the writes it sees.

use crate::config::DecoderConfig;
use crate::registers::{Bank, IoconBit, Register, BASE_ADDRESS, NUM_ADDRESSES};
use crate::types::{DecodedTransaction, RegisterField, Transaction};
use std::collections::HashMap;

/// Register decoder - owns the per-chip IOCON.BANK state
#[derive(Debug, Clone)]
pub struct RegisterDecoder {
    initial_bank: Bank,
    show_iocon_bits: bool,
    banks: HashMap<u8, Bank>,
}

impl RegisterDecoder {
    /// Create a decoder with every watched chip at the configured initial bank
    pub fn new(config: &DecoderConfig) -> Self {
        let mut decoder = Self {
            initial_bank: config.initial_bank,
            show_iocon_bits: config.show_iocon_bits,
            banks: HashMap::new(),
        };
        decoder.reset_banks();
        decoder
    }

    /// Forget all observed IOCON writes
    pub fn reset_banks(&mut self) {
        self.banks = (BASE_ADDRESS..BASE_ADDRESS + NUM_ADDRESSES)
            .map(|address| (address, self.initial_bank))
            .collect();
    }

    /// Bank currently tracked for a chip
    pub fn bank(&self, chip_address: u8) -> Bank {
        self.banks
            .get(&chip_address)
            .copied()
            .unwrap_or(self.initial_bank)
    }

    /// Decode a transaction into register fields
    ///
    /// Always returns a record; an empty payload or a payload holding only the
    /// register pointer yields a record without fields.
    pub fn decode(&mut self, transaction: &Transaction) -> Option<DecodedTransaction> {
        let mut fields = Vec::new();

        if let Some((&start_offset, values)) = transaction.bytes.split_first() {
            for (index, &value) in values.iter().enumerate() {
                let offset = u32::from(start_offset) + index as u32;
                self.decode_register(transaction, offset, value, &mut fields);
            }
        }

        Some(DecodedTransaction {
            start_ns: transaction.start_ns,
            end_ns: transaction.end_ns,
            address: transaction.chip_address,
            direction: transaction.direction(),
            fields,
        })
    }

    /// Resolve one register access and append its field(s)
    fn decode_register(
        &mut self,
        transaction: &Transaction,
        offset: u32,
        value: u8,
        fields: &mut Vec<RegisterField>,
    ) {
        let bank = self.bank(transaction.chip_address);

        match Register::at(bank, offset) {
            Some(Register::Iocon) => {
                if !transaction.is_read {
                    self.update_bank(transaction.chip_address, value);
                }
                if self.show_iocon_bits {
                    fields.extend(IoconBit::ALL.iter().map(|&bit| RegisterField::IoconBit {
                        bit,
                        set: bit.test(value),
                    }));
                } else {
                    fields.push(RegisterField::Value {
                        register: Register::Iocon,
                        value,
                    });
                }
            }
            Some(register) => fields.push(RegisterField::Value { register, value }),
            None => fields.push(RegisterField::Unrecognized { offset, value }),
        }
    }

    fn update_bank(&mut self, chip_address: u8, iocon: u8) {
        let new_bank = Bank::from_iocon(iocon);
        let old_bank = self.banks.insert(chip_address, new_bank);
        if old_bank != Some(new_bank) {
            log::debug!(
                "Chip 0x{:02X}: IOCON.BANK {:?} -> {:?}",
                chip_address,
                old_bank,
                new_bank
            );
        }
    }
}
