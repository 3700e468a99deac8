//! # LEG Emulator
//!
//! An emulator of LEG, a minimal 8-bit load/store CPU.
//!
//! Every instruction is four bytes (opcode plus three operand bytes),
//! executed one per [`Cpu::tick`]. Six general-purpose registers, the
//! program counter and an I/O port share one operand namespace; any
//! operand byte that does not name one of them is an immediate.

pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, Mode, Snapshot, Step, Memory, Program, Registers};
pub use cpu::{Address, Instruction, Opcode, IoPort, NullPort, BufferedPort};
pub use asm::{assemble, disassemble, AssemblerError, RomFile, load_rom, save_rom};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
