//! Session summary report
//!
//! Counts what a decoding run produced and renders it as a short text block.

use mcp23017_decoder::{DecodedTransaction, Decoder, Direction};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChipStats {
    pub reads: usize,
    pub writes: usize,
    pub fields: usize,
}

/// Running totals for one CLI invocation
#[derive(Debug, Default)]
pub struct Summary {
    pub files: usize,
    pub trace_errors: usize,
    pub chips: BTreeMap<u8, ChipStats>,
}

impl Summary {
    pub fn record(&mut self, record: &DecodedTransaction) {
        let chip = self.chips.entry(record.address).or_default();
        match record.direction {
            Direction::Read => chip.reads += 1,
            Direction::Write => chip.writes += 1,
        }
        chip.fields += record.fields.len();
    }

    pub fn transactions(&self) -> usize {
        self.chips.values().map(|c| c.reads + c.writes).sum()
    }

    /// Render the summary; `decoder` supplies the final IOCON.BANK per chip
    pub fn render(&self, decoder: &Decoder) -> String {
        let mut out = format!(
            "=== SUMMARY ===\n\
             Trace files:          {}\n\
             Transactions:         {}\n\
             Trace errors skipped: {}\n",
            self.files,
            self.transactions(),
            self.trace_errors
        );

        for (address, chip) in &self.chips {
            out.push_str(&format!(
                "  0x{:02X}: {} read(s), {} write(s), {} field(s), IOCON.BANK={}\n",
                address,
                chip.reads,
                chip.writes,
                chip.fields,
                u8::from(decoder.bank(*address))
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp23017_decoder::{DecoderConfig, Register, RegisterField};

    fn record(address: u8, direction: Direction, fields: usize) -> DecodedTransaction {
        DecodedTransaction {
            start_ns: 0,
            end_ns: 1,
            address,
            direction,
            fields: vec![
                RegisterField::Value {
                    register: Register::GpioA,
                    value: 0x00,
                };
                fields
            ],
        }
    }

    #[test]
    fn test_counts_per_chip() {
        let mut summary = Summary::default();
        summary.record(&record(0x20, Direction::Write, 2));
        summary.record(&record(0x20, Direction::Read, 1));
        summary.record(&record(0x24, Direction::Read, 3));

        assert_eq!(summary.transactions(), 3);
        assert_eq!(
            summary.chips[&0x20],
            ChipStats {
                reads: 1,
                writes: 1,
                fields: 3
            }
        );
        assert_eq!(summary.chips[&0x24].fields, 3);
    }

    #[test]
    fn test_render() {
        let mut summary = Summary::default();
        summary.files = 1;
        summary.record(&record(0x21, Direction::Write, 1));

        let text = summary.render(&Decoder::new(DecoderConfig::new()));
        assert!(text.starts_with("=== SUMMARY ===\nTrace files:          1\n"));
        assert!(text.contains("Transactions:         1"));
        assert!(text.contains("0x21: 0 read(s), 1 write(s), 1 field(s), IOCON.BANK=0"));
    }
}
