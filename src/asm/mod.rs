//! Assembler and disassembler for LEG programs.
//!
//! This module provides:
//! - A two-pass assembler (text → program bytes)
//! - A disassembler (program bytes → readable text)
//! - The ROM text format for storing assembled programs

pub mod assembler;
pub mod disasm;
pub mod rom;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use rom::{RomFile, RomError, load_rom, save_rom};
