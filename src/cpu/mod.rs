//! CPU emulation for LEG.
//!
//! This module implements the complete LEG architecture:
//! - six 8-bit general-purpose registers, a program counter and an I/O port
//! - 4-byte instructions fetched from a 255-byte program buffer
//! - 255-byte RAM and stack
//! - modulo-255 arithmetic

pub mod alu;
pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod io;

pub use memory::{Memory, MemoryError, Program};
pub use registers::Registers;
pub use decode::{Address, Instruction, Opcode, OpcodeBand, DecodeError};
pub use execute::{Cpu, CpuError, Mode, Snapshot, Step};
pub use io::{IoPort, NullPort, BufferedPort};
