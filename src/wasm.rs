//! WebAssembly bindings for the LEG emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::{Address, BufferedPort, Cpu, Mode};
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_instruction;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    cpu: Cpu<BufferedPort>,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a new machine instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::with_port(BufferedPort::new()),
        }
    }

    /// Load a program from assembly source code. Returns its size in bytes.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let bytes = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_bytes(&bytes)?;
        Ok(bytes.len())
    }

    /// Load pre-encoded program bytes.
    #[wasm_bindgen]
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), JsError> {
        self.cpu.load_program(bytes)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.cpu.reset();
        Ok(())
    }

    /// Report invalid instructions as errors instead of skipping them.
    #[wasm_bindgen]
    pub fn set_strict(&mut self, strict: bool) {
        self.cpu.set_mode(if strict { Mode::Strict } else { Mode::Permissive });
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let step = self.cpu.tick()
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(disassemble_instruction(step.word))
    }

    /// Run up to `max_ticks`, stopping early on an idle loop.
    /// Returns the total tick count, or the error that stopped a strict run.
    #[wasm_bindgen]
    pub fn run(&mut self, max_ticks: u32) -> Result<u64, JsError> {
        self.cpu.run_until_idle(max_ticks as u64)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.cpu.ticks)
    }

    /// Reset registers and IO, keeping the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.port_mut().clear();
    }

    /// Queue bytes on the IO port input.
    #[wasm_bindgen]
    pub fn feed_input(&mut self, bytes: &[u8]) {
        self.cpu.port_mut().feed(bytes);
    }

    /// Drain bytes written to the IO port.
    #[wasm_bindgen]
    pub fn take_output(&mut self) -> js_sys::Uint8Array {
        let output = self.cpu.port_mut().take_output();
        js_sys::Uint8Array::from(output.as_slice())
    }

    /// General registers REG0-REG5 as an array.
    #[wasm_bindgen]
    pub fn registers(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(&self.cpu.regs.general()[..])
    }

    /// Get tick count.
    #[wasm_bindgen]
    pub fn ticks(&self) -> u64 {
        self.cpu.ticks
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.cpu.regs.pc()
    }

    /// Get a general-purpose register (0-5). Out-of-range indices read 0.
    #[wasm_bindgen]
    pub fn register(&self, index: u8) -> u8 {
        match Address::from_byte(index) {
            Some(addr) if Address::GENERAL.contains(&addr) => self.cpu.regs.get(addr).unwrap_or(0),
            _ => 0,
        }
    }

    /// Get the program byte at an address.
    #[wasm_bindgen]
    pub fn program_at(&self, addr: u8) -> u8 {
        self.cpu.program().byte(addr)
    }

    /// Size of the loaded program in bytes.
    #[wasm_bindgen]
    pub fn program_len(&self) -> usize {
        self.cpu.program().len()
    }

    /// Get machine state as a JSON string.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        self.cpu.snapshot().to_json()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the program bytes.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<u8>, JsError> {
    assemble(source).map_err(|e| JsError::new(&format!("{}", e)))
}

/// Disassemble a single 4-byte instruction.
#[wasm_bindgen]
pub fn wasm_disassemble(op: u8, arg1: u8, arg2: u8, arg3: u8) -> String {
    disassemble_instruction([op, arg1, arg2, arg3])
}
