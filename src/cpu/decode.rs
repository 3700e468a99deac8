//! Instruction decoder for LEG.
//!
//! Every instruction is exactly four bytes: an opcode followed by three
//! operand bytes. Operands are interpreted per opcode as an [`Address`]
//! (register, PC or I/O port) or as a literal immediate.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Width of one encoded instruction in bytes.
pub const INSTRUCTION_WIDTH: usize = 4;

/// Opcode band, decided by the numeric range of the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpcodeBand {
    /// Arithmetic and logic (register and immediate forms).
    Calculation,
    /// Conditional jumps.
    Jump,
    /// Transfers between registers and RAM.
    Memory,
}

/// LEG opcodes.
///
/// Bit 7 of a calculation opcode selects the immediate form, so
/// `ADDI = ADD | 0x80`. Reserved opcodes decode normally but have no
/// behavior in the executor.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // ==================== Calculation ====================

    /// dst := src1 + src2 (mod 255)
    Add = 0x00,
    /// dst := src1 & src2
    And = 0x01,
    /// dst := src + imm (mod 255)
    Addi = 0x80,
    /// dst := src & imm
    Andi = 0x81,

    // ==================== Jumps ====================

    /// if a == b then PC := target
    Ifeq = 0x20,
    /// Reserved: if a != b
    Ifne = 0x21,
    /// Reserved: unsigned a < b
    Ifl = 0x22,
    /// Reserved: unsigned a <= b
    Ifle = 0x23,
    /// Reserved: unsigned a > b
    Ifg = 0x24,
    /// Reserved: unsigned a >= b
    Ifge = 0x25,
    /// Reserved: signed a < b
    Ifls = 0x26,
    /// Reserved: signed a <= b
    Ifles = 0x27,
    /// Reserved: signed a > b
    Ifgs = 0x28,
    /// Reserved: signed a >= b
    Ifges = 0x29,

    // ==================== Memory ====================

    /// Reserved: load from RAM
    Load = 0x30,
    /// Reserved: save to RAM
    Save = 0x31,
}

impl Opcode {
    /// Every opcode, in encoding order of the bands.
    pub const ALL: [Opcode; 16] = [
        Opcode::Add, Opcode::And, Opcode::Addi, Opcode::Andi,
        Opcode::Ifeq, Opcode::Ifne, Opcode::Ifl, Opcode::Ifle,
        Opcode::Ifg, Opcode::Ifge, Opcode::Ifls, Opcode::Ifles,
        Opcode::Ifgs, Opcode::Ifges,
        Opcode::Load, Opcode::Save,
    ];

    /// Decode an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.to_byte() == byte)
    }

    /// The encoded byte value.
    #[inline]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::And => "AND",
            Opcode::Addi => "ADDI",
            Opcode::Andi => "ANDI",
            Opcode::Ifeq => "IFEQ",
            Opcode::Ifne => "IFNE",
            Opcode::Ifl => "IFL",
            Opcode::Ifle => "IFLE",
            Opcode::Ifg => "IFG",
            Opcode::Ifge => "IFGE",
            Opcode::Ifls => "IFLS",
            Opcode::Ifles => "IFLES",
            Opcode::Ifgs => "IFGS",
            Opcode::Ifges => "IFGES",
            Opcode::Load => "LOAD",
            Opcode::Save => "SAVE",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        Self::ALL.iter().copied().find(|op| op.mnemonic() == upper)
    }

    /// The band this opcode belongs to.
    pub fn band(self) -> OpcodeBand {
        match self {
            Opcode::Add | Opcode::And | Opcode::Addi | Opcode::Andi => OpcodeBand::Calculation,
            Opcode::Load | Opcode::Save => OpcodeBand::Memory,
            _ => OpcodeBand::Jump,
        }
    }

    /// True for the register-immediate calculation forms.
    pub fn is_immediate(self) -> bool {
        self.band() == OpcodeBand::Calculation && self.to_byte() & 0x80 != 0
    }
}

/// Operand locations that are not plain immediates.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    Reg0 = 0x00,
    Reg1 = 0x01,
    Reg2 = 0x02,
    Reg3 = 0x03,
    Reg4 = 0x04,
    Reg5 = 0x05,
    /// Program counter.
    Pc = 0x06,
    /// I/O port.
    Io = 0x07,
}

impl Address {
    pub const ALL: [Address; 8] = [
        Address::Reg0, Address::Reg1, Address::Reg2, Address::Reg3,
        Address::Reg4, Address::Reg5, Address::Pc, Address::Io,
    ];

    /// The six general-purpose registers.
    pub const GENERAL: [Address; 6] = [
        Address::Reg0, Address::Reg1, Address::Reg2,
        Address::Reg3, Address::Reg4, Address::Reg5,
    ];

    /// Interpret an operand byte as an address, if it is one.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }

    #[inline]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Address::Reg0 => "REG0",
            Address::Reg1 => "REG1",
            Address::Reg2 => "REG2",
            Address::Reg3 => "REG3",
            Address::Reg4 => "REG4",
            Address::Reg5 => "REG5",
            Address::Pc => "PC",
            Address::Io => "IO",
        }
    }

    /// Look up an address by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        Self::ALL.iter().copied().find(|a| a.name() == upper)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded instruction: opcode plus its three raw operand bytes.
///
/// Operand bytes are kept raw because their meaning (address or
/// immediate) depends on the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub args: [u8; 3],
}

impl Instruction {
    pub fn new(opcode: Opcode, arg1: u8, arg2: u8, arg3: u8) -> Self {
        Self { opcode, args: [arg1, arg2, arg3] }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c] = self.args;
        write!(f, "{} {:#04x} {:#04x} {:#04x}", self.opcode.mnemonic(), a, b, c)
    }
}

/// Decode a 4-byte instruction word.
pub fn decode(word: [u8; INSTRUCTION_WIDTH]) -> Result<Instruction, DecodeError> {
    let [op, a, b, c] = word;
    let opcode = Opcode::from_byte(op).ok_or(DecodeError::InvalidOpcode(op))?;
    Ok(Instruction { opcode, args: [a, b, c] })
}

/// Encode an instruction back to its 4-byte word.
pub fn encode(instr: &Instruction) -> [u8; INSTRUCTION_WIDTH] {
    let [a, b, c] = instr.args;
    [instr.opcode.to_byte(), a, b, c]
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),
}
