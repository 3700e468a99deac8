//! LEG Emulator - CLI Entry Point
//!
//! Commands:
//! - `leg-emu run <program>` - Run a ROM or ASM file
//! - `leg-emu debug <program>` - Interactive debugger
//! - `leg-emu asm <source>` - Assemble to ROM
//! - `leg-emu disasm <rom>` - Disassemble ROM

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "leg-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of LEG, a minimal 8-bit load/store CPU")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program for a number of ticks
    Run {
        /// Path to the ROM or ASM file to execute
        program: String,
        /// Number of ticks to run (LEG has no halt instruction)
        #[arg(short, long, default_value = "1000")]
        max_ticks: u64,
        /// Stop early when a jump targets its own address
        #[arg(short = 'l', long)]
        stop_on_loop: bool,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Treat unknown opcodes, reserved opcodes and bad register operands as errors
        #[arg(short, long)]
        strict: bool,
        /// Bytes to feed the IO port, comma separated
        #[arg(short, long, value_delimiter = ',')]
        input: Vec<u8>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the ROM or ASM file to debug
        program: String,
        /// Bytes to feed the IO port, comma separated
        #[arg(short, long, value_delimiter = ',')]
        input: Vec<u8>,
        /// Treat invalid instructions as errors
        #[arg(short, long)]
        strict: bool,
    },
    /// Assemble source to ROM
    Asm {
        /// Path to the source file
        source: String,
        /// Output ROM file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble ROM to readable text
    Disasm {
        /// Path to the ROM file
        rom: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_ticks, stop_on_loop, trace, strict, input, json }) => {
            let options = RunOptions { max_ticks, stop_on_loop, trace, strict, json };
            run_program(&program, input, options);
        }
        Some(Commands::Debug { program, input, strict }) => {
            debug_program(&program, input, strict);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { rom }) => {
            disassemble_file(&rom);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("LEG Emulator v0.1.0");
            println!("A minimal 8-bit load/store CPU");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_program();
        }
    }
}

struct RunOptions {
    max_ticks: u64,
    stop_on_loop: bool,
    trace: bool,
    strict: bool,
    json: bool,
}

fn mode_for(strict: bool) -> leg::Mode {
    if strict { leg::Mode::Strict } else { leg::Mode::Permissive }
}

/// Load program bytes from an `.asm` source or a ROM file, exiting on failure.
fn load_program_or_exit(path: &str) -> Vec<u8> {
    use leg::{assemble, load_rom};

    let bytes = if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble(&source) {
            Ok(bytes) => {
                println!("📝 Assembled {} bytes", bytes.len());
                bytes
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_rom(path) {
            Ok(rom) => {
                println!("📂 Loaded {} bytes", rom.len());
                rom.bytes
            }
            Err(e) => {
                eprintln!("❌ Failed to load ROM: {}", e);
                std::process::exit(1);
            }
        }
    };

    if bytes.is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }

    bytes
}

fn run_program(path: &str, input: Vec<u8>, options: RunOptions) {
    use leg::{BufferedPort, Cpu};
    use leg::asm::disasm::disassemble_instruction;

    println!("🔧 Running: {}", path);
    let program = load_program_or_exit(path);

    let mut cpu = Cpu::with_port(BufferedPort::with_input(input)).with_mode(mode_for(options.strict));
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    println!();
    println!("━━━ Execution ━━━");

    let mut idle = false;
    while cpu.ticks < options.max_ticks {
        let pc = cpu.regs.pc();

        match cpu.tick() {
            Ok(step) => {
                if options.trace {
                    println!("{:03}: {:<24} {}", step.pc, disassemble_instruction(step.word), cpu.regs);
                }
                if options.stop_on_loop && step.is_idle_loop() {
                    idle = true;
                    break;
                }
            }
            Err(e) => {
                eprintln!("❌ CPU error at PC={}: {}", pc, e);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Ticks: {}", cpu.ticks);
    println!("Registers: {}", cpu.regs);
    println!("IO output: {:?}", cpu.port().output());

    if idle {
        println!();
        println!("⏹  Idle loop at PC={}", cpu.regs.pc());
    } else if cpu.ticks >= options.max_ticks && options.stop_on_loop {
        println!();
        println!("⚠️  Reached max ticks limit ({}). Use --max-ticks to increase.", options.max_ticks);
    }

    if options.json {
        match cpu.snapshot().to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, input: Vec<u8>, strict: bool) {
    use leg::tui::run_debugger;

    println!("🔍 Loading: {}", path);
    let program = load_program_or_exit(path);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(program, input, mode_for(strict)) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _input: Vec<u8>, _strict: bool) {
    eprintln!("❌ Debugger not available: built without the `tui` feature");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use leg::{assemble, save_rom, RomFile};

    let out_path = match output {
        Some(path) => PathBuf::from(path),
        None => default_rom_path(source_path),
    };

    if out_path == Path::new(source_path) {
        eprintln!("❌ Output path {} would overwrite the source", out_path.display());
        std::process::exit(1);
    }

    println!("📝 Assembling: {} → {}", source_path, out_path.display());

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let bytes = match assemble(&source) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} bytes", bytes.len());

    if let Err(e) = save_rom(&out_path, &RomFile::from_bytes(&bytes)) {
        eprintln!("❌ Failed to save ROM: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path.display());
}

/// `prog.asm` and `prog.s` both assemble to `prog.rom`.
fn default_rom_path(source_path: &str) -> PathBuf {
    Path::new(source_path).with_extension("rom")
}

fn disassemble_file(rom_path: &str) {
    use leg::{disassemble, load_rom};

    println!("📖 Disassembling: {}", rom_path);
    println!();

    let rom = match load_rom(rom_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to load ROM: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", disassemble(&rom.bytes));
}

/// The classic demo: build 170 and 10, AND them, then loop forever.
const DEMO_SOURCE: &str = r#"
START:
    ADDI REG0, 0b10101010, REG0
    ADDI REG1, 10, REG1
    AND  REG0, REG1, REG2
    IFEQ REG2, REG2, START
"#;

fn demo_program() {
    use leg::{assemble, Cpu};
    use leg::asm::disasm::disassemble_instruction;

    println!("━━━ Demo Program ━━━");
    println!("{}", DEMO_SOURCE.trim_matches('\n'));
    println!();

    let program = match assemble(DEMO_SOURCE) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    println!("      {}", cpu.regs);
    for _ in 0..20 {
        match cpu.tick() {
            Ok(step) => println!("{:03}:  {}   ; {}", step.pc, cpu.regs, disassemble_instruction(step.word)),
            Err(e) => {
                eprintln!("❌ CPU error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn encode_program(instrs: &[leg::Instruction]) -> Vec<u8> {
    instrs.iter().flat_map(leg::cpu::decode::encode).collect()
}

/// Load `code`, prepare the machine with `setup`, then run one tick.
fn self_test_case(code: &[u8], setup: impl FnOnce(&mut leg::Cpu)) -> Result<leg::Cpu, String> {
    let mut cpu = leg::Cpu::new();
    cpu.load_program(code).map_err(|e| format!("load failed: {}", e))?;
    setup(&mut cpu);
    cpu.tick().map_err(|e| format!("tick failed: {}", e))?;
    Ok(cpu)
}

fn run_self_test() {
    use leg::{Address, Instruction, Opcode};
    use leg::cpu::decode::encode;

    println!("━━━ LEG Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let reg = |a: Address| a.to_byte();

    let mut check = |name: &str, outcome: Result<(bool, String), String>| match outcome {
        Ok((true, _)) => {
            println!("{}... ✓", name);
            passed += 1;
        }
        Ok((false, detail)) | Err(detail) => {
            println!("{}... ✗ ({})", name, detail);
            failed += 1;
        }
    };

    // Test 1: ADDI from zero
    let code = encode_program(&[Instruction::new(Opcode::Addi, reg(Address::Reg0), 5, reg(Address::Reg0))]);
    check("ADDI REG0, 5, REG0", self_test_case(&code, |_| {}).map(|cpu| {
        let (r0, pc) = (cpu.regs.get(Address::Reg0), cpu.regs.pc());
        (r0 == Some(5) && pc == 4, format!("REG0={:?} PC={}", r0, pc))
    }));

    // Test 2: AND of registers
    let code = encode_program(&[Instruction::new(
        Opcode::And, reg(Address::Reg0), reg(Address::Reg1), reg(Address::Reg2),
    )]);
    let setup = |cpu: &mut leg::Cpu| {
        cpu.regs.set(Address::Reg0, 0b1010_1010);
        cpu.regs.set(Address::Reg1, 0b0000_1111);
    };
    check("AND REG0, REG1, REG2", self_test_case(&code, setup).map(|cpu| {
        let r2 = cpu.regs.get(Address::Reg2);
        (r2 == Some(0b0000_1010), format!("REG2={:?}", r2))
    }));

    // Test 3: IFEQ jump
    let mut code = vec![0u8; 12];
    code.extend(encode(&Instruction::new(Opcode::Ifeq, reg(Address::Reg2), reg(Address::Reg3), 0)));
    let setup = |cpu: &mut leg::Cpu| {
        cpu.regs.set(Address::Reg2, 7);
        cpu.regs.set(Address::Reg3, 7);
        cpu.regs.jump(12);
    };
    check("IFEQ taken", self_test_case(&code, setup).map(|cpu| {
        (cpu.regs.pc() == 0, format!("PC={}", cpu.regs.pc()))
    }));

    // Test 4: modulo-255 wraparound
    let code = encode_program(&[Instruction::new(Opcode::Addi, reg(Address::Reg0), 10, reg(Address::Reg0))]);
    let setup = |cpu: &mut leg::Cpu| {
        cpu.regs.set(Address::Reg0, 250);
    };
    check("250 + 10 (mod 255)", self_test_case(&code, setup).map(|cpu| {
        let r0 = cpu.regs.get(Address::Reg0);
        (r0 == Some(5), format!("REG0={:?}", r0))
    }));

    // Test 5: PC wraparound
    check("PC wraparound", self_test_case(&[], |cpu| cpu.regs.jump(252)).map(|cpu| {
        (cpu.regs.pc() == 1, format!("PC={}", cpu.regs.pc()))
    }));

    // Test 6: unknown opcode
    check("Unknown opcode is a no-op", self_test_case(&[0x7f, 0, 1, 2], |_| {}).map(|cpu| {
        (cpu.regs.pc() == 4 && cpu.regs.general() == &[0; 6], format!("{:?}", cpu.regs))
    }));

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rom_path() {
        assert_eq!(default_rom_path("demos/count.asm"), PathBuf::from("demos/count.rom"));
        assert_eq!(default_rom_path("prog.s"), PathBuf::from("prog.rom"));
        assert_eq!(default_rom_path("prog"), PathBuf::from("prog.rom"));
        assert_ne!(default_rom_path("my.asm.txt"), PathBuf::from("my.asm.txt"));
    }

    #[test]
    fn test_self_test_case_reports_load_failure() {
        let err = self_test_case(&[0; 300], |_| {}).unwrap_err();
        assert!(err.starts_with("load failed"), "{}", err);
    }

    #[test]
    fn test_self_test_case_reports_tick_failure() {
        let err = self_test_case(&[0x7f, 0, 0, 0], |cpu| cpu.set_mode(leg::Mode::Strict)).unwrap_err();
        assert!(err.starts_with("tick failed"), "{}", err);
    }

    #[test]
    fn test_self_test_case_ticks_once() {
        let code = encode_program(&[leg::Instruction::new(leg::Opcode::Addi, 0, 5, 0)]);
        let cpu = self_test_case(&code, |_| {}).unwrap();
        assert_eq!(cpu.ticks, 1);
        assert_eq!(cpu.regs.get(leg::Address::Reg0), Some(5));
    }
}
