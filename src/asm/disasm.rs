//! Disassembler for LEG programs.
//!
//! Converts 4-byte instruction words back to readable assembly.

use crate::cpu::alu::{self, OperandForm};
use crate::cpu::decode::{decode, Address, Instruction, OpcodeBand, INSTRUCTION_WIDTH};

/// Disassemble a single instruction word to text.
pub fn disassemble_instruction(word: [u8; INSTRUCTION_WIDTH]) -> String {
    match decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => {
            let [op, a, b, c] = word;
            format!("DB {:#04x}, {}, {}, {}", op, a, b, c)
        }
    }
}

/// Disassemble a program, one word per line with its byte address.
///
/// A trailing partial word is padded with zeros.
pub fn disassemble(program: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LEG Disassembly\n");
    output.push_str("; ---------------\n\n");

    for (i, chunk) in program.chunks(INSTRUCTION_WIDTH).enumerate() {
        let mut word = [0u8; INSTRUCTION_WIDTH];
        word[..chunk.len()].copy_from_slice(chunk);
        let line = disassemble_instruction(word);
        output.push_str(&format!("{:03}: {:<24} ; {}\n", i * INSTRUCTION_WIDTH, line, hex_word(word)));
    }

    output
}

/// Format a word as four hex bytes.
pub fn hex_word(word: [u8; INSTRUCTION_WIDTH]) -> String {
    let [op, a, b, c] = word;
    format!("{:02X} {:02X} {:02X} {:02X}", op, a, b, c)
}

/// Format a decoded instruction as assembly text.
fn format_instruction(instr: &Instruction) -> String {
    let [a, b, c] = instr.args;
    let mnemonic = instr.opcode.mnemonic();

    match instr.opcode.band() {
        // src, src-or-imm, dst
        OpcodeBand::Calculation => {
            let second = match alu::calculation(instr.opcode) {
                Some((_, OperandForm::Immediate)) => b.to_string(),
                _ => format_operand(b),
            };
            format!("{} {}, {}, {}", mnemonic, format_operand(a), second, format_operand(c))
        }
        // reg, reg, target
        OpcodeBand::Jump => {
            format!("{} {}, {}, {}", mnemonic, format_operand(a), format_operand(b), c)
        }
        OpcodeBand::Memory => format!("{} {}, {}, {}", mnemonic, a, b, c),
    }
}

/// Format an operand in register position: its name if it is an
/// address, otherwise the raw number.
fn format_operand(byte: u8) -> String {
    match Address::from_byte(byte) {
        Some(addr) => addr.name().to_string(),
        None => byte.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_addi() {
        let result = disassemble_instruction([0x80, 0x00, 0x05, 0x00]);
        assert_eq!(result, "ADDI REG0, 5, REG0");
    }

    #[test]
    fn test_disassemble_and() {
        let result = disassemble_instruction([0x01, 0x00, 0x01, 0x02]);
        assert_eq!(result, "AND REG0, REG1, REG2");
    }

    #[test]
    fn test_disassemble_ifeq_target_is_numeric() {
        let result = disassemble_instruction([0x20, 0x02, 0x03, 0x04]);
        assert_eq!(result, "IFEQ REG2, REG3, 4");
    }

    #[test]
    fn test_disassemble_unknown() {
        let result = disassemble_instruction([0x7f, 1, 2, 3]);
        assert_eq!(result, "DB 0x7f, 1, 2, 3");
    }

    #[test]
    fn test_disassemble_program() {
        let output = disassemble(&[0x80, 0, 5, 0, 0x07, 1]);
        assert!(output.contains("000: ADDI REG0, 5, REG0"));
        assert!(output.contains("004: DB 0x07, 1, 0, 0"));
        assert!(output.contains("07 01 00 00"));
    }

    #[test]
    fn test_reassembles() {
        use crate::asm::assemble;

        let source = "ADDI REG1, 10, REG1\nANDI REG1, 3, IO\nIFEQ REG0, PC, 200";
        let bytes = assemble(source).unwrap();
        let listing: Vec<String> = bytes
            .chunks(INSTRUCTION_WIDTH)
            .map(|c| disassemble_instruction([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(listing.join("\n"), source);
    }
}
