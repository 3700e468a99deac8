//! LEG memory subsystem.
//!
//! Three fixed 255-byte buffers: the program (instruction memory,
//! indexed by PC), RAM and the stack. RAM and stack are allocated but
//! inert until LOAD/SAVE gain semantics.

use crate::cpu::decode::INSTRUCTION_WIDTH;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Size of the program buffer; also the PC address ceiling.
pub const PROGRAM_SIZE: usize = 255;

/// Size of RAM in bytes.
pub const RAM_SIZE: usize = 255;

/// Size of the stack in bytes.
pub const STACK_SIZE: usize = 255;

/// Instruction memory.
///
/// Always exactly [`PROGRAM_SIZE`] bytes; shorter programs are padded
/// with zeros. Fetches wrap around the end of the buffer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    bytes: Vec<u8>,
    /// Length of the program as supplied, before padding.
    len: usize,
}

impl Program {
    /// Build a program buffer from encoded bytes.
    pub fn new(code: &[u8]) -> Result<Self, MemoryError> {
        if code.len() > PROGRAM_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: code.len(),
                available: PROGRAM_SIZE,
            });
        }

        let mut bytes = vec![0; PROGRAM_SIZE];
        bytes[..code.len()].copy_from_slice(code);
        Ok(Self { bytes, len: code.len() })
    }

    /// An all-zero program.
    pub fn empty() -> Self {
        Self { bytes: vec![0; PROGRAM_SIZE], len: 0 }
    }

    /// Fetch the 4-byte word starting at `pc`, wrapping past the end.
    pub fn fetch(&self, pc: u8) -> [u8; INSTRUCTION_WIDTH] {
        let mut word = [0; INSTRUCTION_WIDTH];
        for (i, slot) in word.iter_mut().enumerate() {
            *slot = self.bytes[(pc as usize + i) % PROGRAM_SIZE];
        }
        word
    }

    /// Read a single program byte.
    #[inline]
    pub fn byte(&self, addr: u8) -> u8 {
        self.bytes[addr as usize % PROGRAM_SIZE]
    }

    /// Supplied length, before padding.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The full padded buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("len", &self.len)
            .field("capacity", &PROGRAM_SIZE)
            .finish()
    }
}

/// Data memory: RAM and stack.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    ram: Vec<u8>,
    stack: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            ram: vec![0; RAM_SIZE],
            stack: vec![0; STACK_SIZE],
        }
    }

    /// Read a RAM cell.
    pub fn read_ram(&self, addr: usize) -> Result<u8, MemoryError> {
        self.ram.get(addr).copied().ok_or(MemoryError::AddressOutOfRange {
            addr,
            size: RAM_SIZE,
        })
    }

    /// Write a RAM cell.
    pub fn write_ram(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self.ram.get_mut(addr).ok_or(MemoryError::AddressOutOfRange {
            addr,
            size: RAM_SIZE,
        })?;
        *cell = value;
        Ok(())
    }

    /// Read a stack cell.
    pub fn read_stack(&self, addr: usize) -> Result<u8, MemoryError> {
        self.stack.get(addr).copied().ok_or(MemoryError::AddressOutOfRange {
            addr,
            size: STACK_SIZE,
        })
    }

    /// Write a stack cell.
    pub fn write_stack(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self.stack.get_mut(addr).ok_or(MemoryError::AddressOutOfRange {
            addr,
            size: STACK_SIZE,
        })?;
        *cell = value;
        Ok(())
    }

    /// Clear RAM and stack to zeros.
    pub fn clear(&mut self) {
        self.ram.fill(0);
        self.stack.fill(0);
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn stack(&self) -> &[u8] {
        &self.stack
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = |cells: &[u8]| cells.iter().filter(|&&c| c != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_ram", &non_zero(&self.ram))
            .field("non_zero_stack", &non_zero(&self.stack))
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory address {addr} out of range (0-{max})", max = .size - 1)]
    AddressOutOfRange { addr: usize, size: usize },

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
