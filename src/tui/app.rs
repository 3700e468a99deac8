//! Debugger application state and logic.

use crate::asm::disasm::disassemble_instruction;
use crate::cpu::decode::INSTRUCTION_WIDTH;
use crate::cpu::memory::PROGRAM_SIZE;
use crate::{BufferedPort, Cpu, Mode};
use std::collections::HashSet;

/// Program bytes shown per row of the memory view.
pub const BYTES_PER_ROW: usize = 8;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu<BufferedPort>,
    /// Input bytes queued on the IO port at every (re)start.
    pub input: Vec<u8>,
    /// Breakpoints (by PC).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in rows.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>, input: Vec<u8>, mode: Mode) -> Self {
        let mut cpu = Cpu::with_port(BufferedPort::with_input(input.iter().copied())).with_mode(mode);
        let status = match cpu.load_program(&program) {
            Ok(()) => "Ready. Press 's' to step, 'r' to run, 'q' to quit.".to_string(),
            Err(e) => format!("Load error: {}", e),
        };

        Self {
            cpu,
            input,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status,
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        match self.cpu.tick() {
            Ok(step) => {
                let disasm = disassemble_instruction(step.word);
                self.status = format!("PC={:03}: {}", step.pc, disasm);
                if step.is_idle_loop() && self.running {
                    self.running = false;
                    self.status = format!("Idle loop at PC={} after {} ticks", step.pc, self.cpu.ticks);
                }
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until breakpoint, idle loop or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        // Check for breakpoint
        let pc = self.cpu.regs.pc();
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset CPU to initial state, restoring the IO input.
    pub fn reset(&mut self) {
        self.cpu.reset();
        let port = self.cpu.port_mut();
        port.clear();
        port.feed(&self.input);
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Get disassembly around current PC: (address, text, is_current).
    ///
    /// Rows step by one instruction from the current PC, so the listing
    /// follows the PC's alignment even after it wraps.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u8, String, bool)> {
        let pc = self.cpu.regs.pc() as i64;
        let half = (lines / 2) as i64;
        let width = INSTRUCTION_WIDTH as i64;

        (0..lines as i64)
            .map(|i| {
                let addr = (pc + (i - half) * width).rem_euclid(PROGRAM_SIZE as i64) as u8;
                let word = self.cpu.program().fetch(addr);
                (addr, disassemble_instruction(word), i == half)
            })
            .collect()
    }

    /// Number of rows in the memory view.
    pub fn memory_rows(&self) -> usize {
        PROGRAM_SIZE.div_ceil(BYTES_PER_ROW)
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u8>, input: Vec<u8>, mode: Mode) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, input, mode);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 1 < app.memory_rows() {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
