//! CPU execution engine for LEG.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! One call to [`Cpu::tick`] runs exactly one instruction.

use crate::cpu::alu::{AluOp, Condition, OperandForm};
use crate::cpu::decode::{self, Address, DecodeError, Instruction, Opcode, INSTRUCTION_WIDTH};
use crate::cpu::io::{IoPort, NullPort};
use crate::cpu::memory::{Memory, MemoryError, Program};
use crate::cpu::registers::{Registers, GENERAL_REGISTERS};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// How the engine treats instructions it cannot give meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Unknown opcodes, reserved opcodes and non-address register
    /// operands degrade to no-ops. Ticks never fail.
    #[default]
    Permissive,
    /// The same conditions are reported as [`CpuError`]s and the
    /// offending tick has no effect.
    Strict,
}

/// Record of one executed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// PC the instruction was fetched from.
    pub pc: u8,
    /// The raw fetched word.
    pub word: [u8; INSTRUCTION_WIDTH],
    /// Decoded instruction; `None` for an unknown opcode.
    pub instruction: Option<Instruction>,
    /// Whether the instruction redirected the PC.
    pub jumped: bool,
    /// PC after the tick.
    pub next_pc: u8,
}

impl Step {
    /// A taken jump back to its own address: the machine will spin here
    /// forever.
    pub fn is_idle_loop(&self) -> bool {
        self.jumped && self.next_pc == self.pc
    }
}

/// Serializable view of the machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: [u8; GENERAL_REGISTERS],
    pub pc: u8,
    pub ticks: u64,
    pub mode: Mode,
    pub ram: Vec<u8>,
    pub stack: Vec<u8>,
}

impl Snapshot {
    /// Render as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Render as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The LEG CPU.
///
/// Each instance owns its registers, memory, program and I/O device;
/// machines never share state.
#[derive(Clone)]
pub struct Cpu<P: IoPort = NullPort> {
    /// CPU registers.
    pub regs: Registers,
    /// RAM and stack.
    pub mem: Memory,
    /// Instruction memory.
    program: Program,
    /// Device behind the IO address.
    port: P,
    mode: Mode,
    /// Set by a taken jump, consumed by the advance step of the same tick.
    jumping: bool,
    /// Ticks executed since creation or reset.
    pub ticks: u64,
    last_step: Option<Step>,
}

impl Cpu<NullPort> {
    /// Create a new CPU with zeroed state, an empty program and no I/O device.
    pub fn new() -> Self {
        Self::with_port(NullPort)
    }
}

impl<P: IoPort> Cpu<P> {
    /// Create a CPU with a device attached to the IO address.
    pub fn with_port(port: P) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            program: Program::empty(),
            port,
            mode: Mode::Permissive,
            jumping: false,
            ticks: 0,
            last_step: None,
        }
    }

    /// Builder-style mode selection.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Load a program into instruction memory.
    pub fn load_program(&mut self, code: &[u8]) -> Result<(), MemoryError> {
        self.program = Program::new(code)?;
        Ok(())
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the CPU, returning its I/O device.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Reset registers, memory and counters. The program and device stay.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.jumping = false;
        self.ticks = 0;
        self.last_step = None;
    }

    /// Read an operand location.
    ///
    /// Registers and PC yield their value, IO reads from the device, and
    /// any byte that is not an address reads as 0.
    pub fn get(&mut self, operand: u8) -> u8 {
        match Address::from_byte(operand) {
            Some(Address::Io) => self.port.read(),
            Some(addr) => self.regs.get(addr).unwrap_or(0),
            None => 0,
        }
    }

    /// Write an operand location.
    ///
    /// IO writes go to the device; writes to a byte that is not an
    /// address are discarded.
    pub fn set(&mut self, operand: u8, value: u8) {
        match Address::from_byte(operand) {
            Some(Address::Io) => self.port.write(value),
            Some(addr) => {
                self.regs.set(addr, value);
            }
            None => {}
        }
    }

    /// Execute one instruction: fetch at PC, dispatch, then advance PC by
    /// one instruction unless the instruction jumped.
    pub fn tick(&mut self) -> Result<Step, CpuError> {
        // Fetch
        let pc = self.regs.pc();
        let word = self.program.fetch(pc);

        // Decode and execute
        let instruction = match decode::decode(word) {
            Ok(instr) => {
                self.execute(instr)?;
                Some(instr)
            }
            Err(e) => {
                if self.mode == Mode::Strict {
                    return Err(e.into());
                }
                None
            }
        };

        // Advance
        let jumped = std::mem::take(&mut self.jumping);
        if !jumped {
            self.regs.advance_pc(INSTRUCTION_WIDTH as u8);
        }

        let step = Step {
            pc,
            word,
            instruction,
            jumped,
            next_pc: self.regs.pc(),
        };
        self.ticks += 1;
        self.last_step = Some(step);

        Ok(step)
    }

    /// Run exactly `max_ticks` ticks, or until the first error.
    ///
    /// Returns the number of ticks executed.
    pub fn run(&mut self, max_ticks: u64) -> Result<u64, CpuError> {
        for _ in 0..max_ticks {
            self.tick()?;
        }
        Ok(max_ticks)
    }

    /// Run for at most `max_ticks`, stopping after a tick that jumps to
    /// its own address.
    ///
    /// Returns the number of ticks executed.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> Result<u64, CpuError> {
        let mut executed = 0;
        while executed < max_ticks {
            let step = self.tick()?;
            executed += 1;
            if step.is_idle_loop() {
                break;
            }
        }
        Ok(executed)
    }

    /// Dispatch a decoded instruction to its handler.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        let [a, b, c] = instr.args;

        match instr.opcode {
            // ==================== Calculation ====================

            Opcode::Add => self.calculate(instr, AluOp::Add, OperandForm::Register),
            Opcode::And => self.calculate(instr, AluOp::And, OperandForm::Register),
            Opcode::Addi => self.calculate(instr, AluOp::Add, OperandForm::Immediate),
            Opcode::Andi => self.calculate(instr, AluOp::And, OperandForm::Immediate),

            // ==================== Jumps ====================

            Opcode::Ifeq => self.branch(instr.opcode, Condition::Equal, a, b, c),

            Opcode::Ifne
            | Opcode::Ifl
            | Opcode::Ifle
            | Opcode::Ifg
            | Opcode::Ifge
            | Opcode::Ifls
            | Opcode::Ifles
            | Opcode::Ifgs
            | Opcode::Ifges => self.unimplemented(instr.opcode),

            // ==================== Memory ====================

            Opcode::Load | Opcode::Save => self.unimplemented(instr.opcode),
        }
    }

    /// ADD/AND and their immediate forms.
    fn calculate(&mut self, instr: Instruction, op: AluOp, form: OperandForm) -> Result<(), CpuError> {
        let opcode = instr.opcode;
        let [src, second, dst] = instr.args;

        self.check_address(opcode, 0, src)?;
        if form == OperandForm::Register {
            self.check_address(opcode, 1, second)?;
        }
        self.check_address(opcode, 2, dst)?;

        let lhs = self.get(src);
        let rhs = match form {
            OperandForm::Register => self.get(second),
            OperandForm::Immediate => second,
        };
        let result = op.apply(lhs, rhs);
        self.set(dst, result);
        Ok(())
    }

    /// Conditional jump to the literal `target`.
    fn branch(&mut self, opcode: Opcode, cond: Condition, a: u8, b: u8, target: u8) -> Result<(), CpuError> {
        self.check_address(opcode, 0, a)?;
        self.check_address(opcode, 1, b)?;

        let lhs = self.get(a);
        let rhs = self.get(b);
        if cond.holds(lhs, rhs) {
            self.regs.jump(target);
            self.jumping = true;
        }
        Ok(())
    }

    /// Recognised opcode with no behavior yet.
    fn unimplemented(&self, opcode: Opcode) -> Result<(), CpuError> {
        match self.mode {
            Mode::Permissive => Ok(()),
            Mode::Strict => Err(CpuError::Unimplemented(opcode)),
        }
    }

    /// In strict mode, require that an operand in register position names
    /// an address.
    fn check_address(&self, opcode: Opcode, position: usize, byte: u8) -> Result<(), CpuError> {
        if self.mode == Mode::Strict && Address::from_byte(byte).is_none() {
            return Err(CpuError::InvalidOperand { opcode, position, byte });
        }
        Ok(())
    }

    /// The most recent tick, if any.
    pub fn last_step(&self) -> Option<Step> {
        self.last_step
    }

    /// Capture a serializable view of the state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: *self.regs.general(),
            pc: self.regs.pc(),
            ticks: self.ticks,
            mode: self.mode,
            ram: self.mem.ram().to_vec(),
            stack: self.mem.stack().to_vec(),
        }
    }
}

impl Default for Cpu<NullPort> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: IoPort> std::fmt::Debug for Cpu<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("mode", &self.mode)
            .field("ticks", &self.ticks)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors reported by the CPU. Only [`Mode::Strict`] produces them
/// during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("unimplemented opcode: {}", .0.mnemonic())]
    Unimplemented(Opcode),

    #[error("invalid operand {byte:#04x} at position {position} of {name}", name = .opcode.mnemonic())]
    InvalidOperand { opcode: Opcode, position: usize, byte: u8 },
}
