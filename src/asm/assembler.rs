//! Simple assembler for LEG programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! START:                      ; Define a label (its byte address)
//!     ADDI REG0, 5, REG0      ; REG0 := REG0 + 5
//!     AND  REG0, REG1, REG2   ; REG2 := REG0 & REG1
//!     IFEQ REG2, REG2, START  ; Jump to START if equal
//!
//!     ORG 64                  ; Pad with zeros up to address 64
//!     DB 0x20, 1, 0b1010      ; Raw bytes
//! ```
//!
//! Operands are register names (`REG0`-`REG5`, `PC`, `IO`), numbers in
//! decimal, `0x` hex or `0b` binary, or labels. Missing trailing operands
//! encode as 0.

use crate::cpu::decode::{Address, Opcode, INSTRUCTION_WIDTH};
use crate::cpu::memory::PROGRAM_SIZE;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to program bytes.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> byte address).
    symbols: HashMap<String, usize>,
    /// Label references to patch: (output_index, label, source_line).
    pending: Vec<(usize, String, usize)>,
    /// Output bytes.
    output: Vec<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        if self.output.len() > PROGRAM_SIZE {
            return Err(AssemblerError::ProgramTooLarge {
                size: self.output.len(),
                available: PROGRAM_SIZE,
            });
        }

        // Pass 2: resolve label references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if !is_identifier(&label) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label name '{}'", label),
                });
            }
            if is_reserved(&label) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("label '{}' is a reserved name", label),
                });
            }
            if self.symbols.insert(label.clone(), self.output.len()).is_some() {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("duplicate label '{}'", label),
                });
            }
            line = line[colon_idx + 1..].trim();
        }

        if line.is_empty() {
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
            Some((m, rest)) => (m.to_uppercase(), rest),
            None => (line.to_uppercase(), ""),
        };
        let operands: Vec<&str> = rest
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        match mnemonic.as_str() {
            // Directives
            "ORG" => {
                let [target] = operands.as_slice() else {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: "ORG requires one address".into(),
                    });
                };
                let target = parse_number(target)
                    .ok_or_else(|| AssemblerError::SyntaxError {
                        line: line_num,
                        message: format!("invalid ORG address '{}'", target),
                    })?;
                if target as usize > PROGRAM_SIZE {
                    return Err(AssemblerError::ProgramTooLarge {
                        size: target as usize,
                        available: PROGRAM_SIZE,
                    });
                }
                if (target as usize) < self.output.len() {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: format!("ORG {} is behind current address {}", target, self.output.len()),
                    });
                }
                self.output.resize(target as usize, 0);
            }

            "DB" | "DATA" => {
                if operands.is_empty() {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: "DB requires at least one value".into(),
                    });
                }
                for operand in operands {
                    let byte = self.parse_operand(operand, line_num)?;
                    self.output.push(byte);
                }
            }

            // Instructions
            _ => {
                let opcode = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic {
                        line: line_num,
                        mnemonic: mnemonic.clone(),
                    }
                })?;
                if operands.len() > INSTRUCTION_WIDTH - 1 {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: format!("{} takes at most 3 operands, got {}", mnemonic, operands.len()),
                    });
                }

                self.output.push(opcode.to_byte());
                for i in 0..INSTRUCTION_WIDTH - 1 {
                    let byte = match operands.get(i) {
                        Some(operand) => self.parse_operand(operand, line_num)?,
                        None => 0,
                    };
                    self.output.push(byte);
                }
            }
        }

        Ok(())
    }

    /// Parse one operand byte. Labels are recorded for pass 2 and emit a
    /// placeholder; the caller must push the returned byte next.
    fn parse_operand(&mut self, operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
        if let Some(addr) = Address::from_name(operand) {
            return Ok(addr.to_byte());
        }

        if operand.starts_with(|c: char| c.is_ascii_digit()) {
            let value = parse_number(operand).ok_or_else(|| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid number '{}'", operand),
            })?;
            return u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange {
                line: line_num,
                value,
            });
        }

        if is_identifier(operand) {
            self.pending.push((self.output.len(), operand.to_uppercase(), line_num));
            return Ok(0);
        }

        Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid operand '{}'", operand),
        })
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num) in &self.pending {
            let addr = *self.symbols.get(label).ok_or_else(|| AssemblerError::UndefinedLabel {
                line: *line_num,
                label: label.clone(),
            })?;
            self.output[*out_idx] = u8::try_from(addr).map_err(|_| AssemblerError::ValueOutOfRange {
                line: *line_num,
                value: addr as u32,
            })?;
        }
        Ok(())
    }
}

/// Parse a decimal, `0x` hex or `0b` binary literal.
fn parse_number(text: &str) -> Option<u32> {
    let text = text.replace('_', "");
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2).ok()
    } else {
        text.parse().ok()
    }
}

/// Register names, mnemonics and directives cannot be used as labels.
fn is_reserved(name: &str) -> bool {
    Address::from_name(name).is_some()
        || Opcode::from_mnemonic(name).is_some()
        || matches!(name, "ORG" | "DB" | "DATA")
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: u32 },

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test program
            ADDI REG0, 5, REG0
            AND REG0, REG1, REG2
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0x80, 0x00, 0x05, 0x00, 0x01, 0x00, 0x01, 0x02]);
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            ADDI REG0, 1, REG0
            IFEQ REG0, REG0, END
            ANDI REG1 0xff REG1
        END: IFEQ REG0 REG0 START
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 16);
        assert_eq!(&result[4..8], &[0x20, 0x00, 0x00, 12]);
        assert_eq!(&result[12..16], &[0x20, 0x00, 0x00, 0]);
    }

    #[test]
    fn test_missing_operands_are_zero() {
        let result = assemble("IFEQ REG1").unwrap();
        assert_eq!(result, vec![0x20, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_number_formats() {
        let result = assemble("DB 10, 0x1f, 0b1010_1010, IO, PC").unwrap();
        assert_eq!(result, vec![10, 0x1f, 0xaa, 7, 6]);
    }

    #[test]
    fn test_org_pads() {
        let result = assemble("DB 1\nORG 4\nHERE: DB HERE").unwrap();
        assert_eq!(result, vec![1, 0, 0, 0, 4]);
    }

    #[test]
    fn test_org_backwards_fails() {
        let err = assemble("DB 1, 2, 3\nORG 1").unwrap_err();
        assert!(matches!(err, AssemblerError::SyntaxError { line: 2, .. }));
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = assemble("HLT").unwrap_err();
        assert_eq!(err, AssemblerError::UnknownMnemonic { line: 1, mnemonic: "HLT".into() });
    }

    #[test]
    fn test_undefined_label() {
        let err = assemble("\nIFEQ REG0, REG0, NOWHERE").unwrap_err();
        assert_eq!(err, AssemblerError::UndefinedLabel { line: 2, label: "NOWHERE".into() });
    }

    #[test]
    fn test_value_out_of_range() {
        let err = assemble("ADDI REG0, 256, REG0").unwrap_err();
        assert_eq!(err, AssemblerError::ValueOutOfRange { line: 1, value: 256 });
    }

    #[test]
    fn test_too_many_operands() {
        assert!(assemble("ADD REG0, REG1, REG2, REG3").is_err());
    }

    #[test]
    fn test_duplicate_label() {
        assert!(assemble("A: DB 1\nA: DB 2").is_err());
    }

    #[test]
    fn test_org_beyond_program_fails_early() {
        let err = assemble("ORG 4294967295").unwrap_err();
        assert_eq!(err, AssemblerError::ProgramTooLarge { size: 4294967295, available: 255 });

        // Padding up to the end is still allowed
        assert_eq!(assemble("ORG 255").unwrap().len(), 255);
    }

    #[test]
    fn test_reserved_label_names() {
        for source in ["PC: DB 1", "io: DB 1", "REG0: DB 1", "ADDI: DB 1", "ORG: DB 1"] {
            let err = assemble(source).unwrap_err();
            assert!(matches!(err, AssemblerError::SyntaxError { line: 1, .. }), "{}", source);
        }
    }

    #[test]
    fn test_label_after_org_resolves() {
        let result = assemble("ORG 8\nTOP: ADDI REG0, 1, REG0\nIFEQ REG0, REG0, TOP").unwrap();
        assert_eq!(result[15], 8);
    }

    #[test]
    fn test_program_too_large() {
        let err = assemble("ORG 255\nDB 1").unwrap_err();
        assert_eq!(err, AssemblerError::ProgramTooLarge { size: 256, available: 255 });
    }
}
