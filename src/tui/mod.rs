//! TUI debugger for the LEG emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register view (decimal and binary)
//! - Program memory hex view
//! - IO port buffers
//! - Step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
