//! MCP23017 register map
//!
//! The MCP23017 has two register layouts selected by `IOCON.BANK`:
//! - **BANK = 0**: port A and port B registers are interleaved (`0x00..=0x15`)
//! - **BANK = 1**: port A registers sit at `0x00..=0x0A`, port B at `0x10..=0x1A`
//!
//! IOCON is mirrored at two offsets in each layout.

use serde::{Deserialize, Serialize};

/// First 7-bit address of the MCP23017 address window (A2..A0 = 000)
pub const BASE_ADDRESS: u8 = 0x20;

/// Number of chip addresses selectable through A2..A0
pub const NUM_ADDRESSES: u8 = 8;

/// Returns true if `address` is one of the eight MCP23017 chip addresses
pub fn is_watched_address(address: u8) -> bool {
    (BASE_ADDRESS..BASE_ADDRESS + NUM_ADDRESSES).contains(&address)
}

/// Register layout selected by `IOCON.BANK`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Bank {
    /// Interleaved layout (power-on default)
    #[default]
    Bank0,
    /// Segregated layout
    Bank1,
}

impl Bank {
    /// Bank selected by the BANK bit of an IOCON value
    pub fn from_iocon(value: u8) -> Self {
        if IoconBit::Bank.test(value) {
            Bank::Bank1
        } else {
            Bank::Bank0
        }
    }
}

impl TryFrom<u8> for Bank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Bank::Bank0),
            1 => Ok(Bank::Bank1),
            other => Err(format!("IOCON.BANK must be 0 or 1, got {}", other)),
        }
    }
}

impl From<Bank> for u8 {
    fn from(bank: Bank) -> Self {
        match bank {
            Bank::Bank0 => 0,
            Bank::Bank1 => 1,
        }
    }
}

/// MCP23017 registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// I/O direction A
    IodirA,
    /// I/O direction B
    IodirB,
    /// Input polarity A
    IpolA,
    /// Input polarity B
    IpolB,
    /// Interrupt-on-change enable A
    GpintenA,
    /// Interrupt-on-change enable B
    GpintenB,
    /// Default compare value A
    DefvalA,
    /// Default compare value B
    DefvalB,
    /// Interrupt control A
    IntconA,
    /// Interrupt control B
    IntconB,
    /// Device configuration (shared by both ports)
    Iocon,
    /// Pull-up enable A
    GppuA,
    /// Pull-up enable B
    GppuB,
    /// Interrupt flag A
    IntfA,
    /// Interrupt flag B
    IntfB,
    /// Interrupt capture A
    IntcapA,
    /// Interrupt capture B
    IntcapB,
    /// Port value A
    GpioA,
    /// Port value B
    GpioB,
    /// Output latch A
    OlatA,
    /// Output latch B
    OlatB,
}

/// Register order within one port; also the BANK=1 offset within a port block
const PORT_ORDER: [(Register, Register); 11] = [
    (Register::IodirA, Register::IodirB),
    (Register::IpolA, Register::IpolB),
    (Register::GpintenA, Register::GpintenB),
    (Register::DefvalA, Register::DefvalB),
    (Register::IntconA, Register::IntconB),
    (Register::Iocon, Register::Iocon),
    (Register::GppuA, Register::GppuB),
    (Register::IntfA, Register::IntfB),
    (Register::IntcapA, Register::IntcapB),
    (Register::GpioA, Register::GpioB),
    (Register::OlatA, Register::OlatB),
];

impl Register {
    /// Datasheet name of the register
    pub fn name(&self) -> &'static str {
        match self {
            Register::IodirA => "IODIRA",
            Register::IodirB => "IODIRB",
            Register::IpolA => "IPOLA",
            Register::IpolB => "IPOLB",
            Register::GpintenA => "GPINTENA",
            Register::GpintenB => "GPINTENB",
            Register::DefvalA => "DEFVALA",
            Register::DefvalB => "DEFVALB",
            Register::IntconA => "INTCONA",
            Register::IntconB => "INTCONB",
            Register::Iocon => "IOCON",
            Register::GppuA => "GPPUA",
            Register::GppuB => "GPPUB",
            Register::IntfA => "INTFA",
            Register::IntfB => "INTFB",
            Register::IntcapA => "INTCAPA",
            Register::IntcapB => "INTCAPB",
            Register::GpioA => "GPIOA",
            Register::GpioB => "GPIOB",
            Register::OlatA => "OLATA",
            Register::OlatB => "OLATB",
        }
    }

    /// Resolve a register offset under the given bank layout
    ///
    /// Returns `None` for offsets the layout does not define.
    pub fn at(bank: Bank, offset: u32) -> Option<Register> {
        let offset = offset as usize;
        match bank {
            // Interleaved: A at even offsets, B at odd offsets
            Bank::Bank0 => PORT_ORDER
                .get(offset / 2)
                .map(|&(a, b)| if offset % 2 == 0 { a } else { b }),
            // Segregated: A block at 0x00, B block at 0x10
            Bank::Bank1 => {
                let index = offset & 0x0f;
                let port_b = match offset >> 4 {
                    0 => false,
                    1 => true,
                    _ => return None,
                };
                PORT_ORDER
                    .get(index)
                    .map(|&(a, b)| if port_b { b } else { a })
            }
        }
    }
}

/// Named bits of the IOCON register
///
/// Bit 0 is unimplemented and has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoconBit {
    /// INT pin polarity
    Intpol,
    /// INT pin open-drain
    Odr,
    /// Hardware address enable (MCP23S17 only)
    Haen,
    /// SDA slew rate disable
    Disslw,
    /// Sequential operation disable
    Seqop,
    /// INTA/INTB mirroring
    Mirror,
    /// Register bank layout select
    Bank,
}

impl IoconBit {
    /// All named bits, in bit order
    pub const ALL: [IoconBit; 7] = [
        IoconBit::Intpol,
        IoconBit::Odr,
        IoconBit::Haen,
        IoconBit::Disslw,
        IoconBit::Seqop,
        IoconBit::Mirror,
        IoconBit::Bank,
    ];

    /// Bit position within IOCON
    pub fn position(&self) -> u8 {
        match self {
            IoconBit::Intpol => 1,
            IoconBit::Odr => 2,
            IoconBit::Haen => 3,
            IoconBit::Disslw => 4,
            IoconBit::Seqop => 5,
            IoconBit::Mirror => 6,
            IoconBit::Bank => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IoconBit::Intpol => "INTPOL",
            IoconBit::Odr => "ODR",
            IoconBit::Haen => "HAEN",
            IoconBit::Disslw => "DISSLW",
            IoconBit::Seqop => "SEQOP",
            IoconBit::Mirror => "MIRROR",
            IoconBit::Bank => "BANK",
        }
    }

    /// True if this bit is set in `value`
    pub fn test(&self, value: u8) -> bool {
        value & (1 << self.position()) != 0
    }
}
