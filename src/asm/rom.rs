//! ROM file format for LEG programs.
//!
//! A ROM is plain text:
//! - One instruction per line, as up to four hex bytes (`80 00 05 00`);
//!   short lines are padded with zero bytes to a full instruction
//! - `;` starts a comment
//! - Blank lines are ignored

use crate::asm::disasm::{disassemble_instruction, hex_word};
use crate::cpu::decode::INSTRUCTION_WIDTH;
use crate::cpu::memory::PROGRAM_SIZE;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// A loaded ROM file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomFile {
    /// The program bytes.
    pub bytes: Vec<u8>,
    /// Original source lines (for debugging).
    pub source_lines: Vec<String>,
}

impl RomFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ROM from program bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            source_lines: Vec::new(),
        }
    }

    /// Number of program bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Parse ROM text.
pub fn parse_rom(text: &str) -> Result<RomFile, RomError> {
    let mut rom = RomFile::new();

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1;
        let code = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let tokens: Vec<&str> = code.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if tokens.len() > INSTRUCTION_WIDTH {
            return Err(RomError::ParseError {
                line: line_num,
                message: format!("expected at most {} bytes, found {}", INSTRUCTION_WIDTH, tokens.len()),
            });
        }

        let mut word = [0u8; INSTRUCTION_WIDTH];
        for (slot, token) in word.iter_mut().zip(tokens) {
            *slot = u8::from_str_radix(token, 16).map_err(|_| RomError::ParseError {
                line: line_num,
                message: format!("invalid hex byte '{}'", token),
            })?;
        }
        rom.bytes.extend_from_slice(&word);
        rom.source_lines.push(line.trim().to_string());
    }

    // The last word of a full program runs one byte past the end
    if rom.bytes.len() > PROGRAM_SIZE && rom.bytes[PROGRAM_SIZE..].iter().all(|&b| b == 0) {
        rom.bytes.truncate(PROGRAM_SIZE);
    }

    if rom.bytes.len() > PROGRAM_SIZE {
        return Err(RomError::TooLarge {
            size: rom.bytes.len(),
            available: PROGRAM_SIZE,
        });
    }

    Ok(rom)
}

/// Render ROM text, annotated with addresses and disassembly.
pub fn format_rom(rom: &RomFile) -> String {
    let mut out = String::new();
    out.push_str("; LEG ROM file\n");
    out.push_str(&format!("; {} bytes\n\n", rom.len()));

    for (i, chunk) in rom.bytes.chunks(INSTRUCTION_WIDTH).enumerate() {
        let mut word = [0u8; INSTRUCTION_WIDTH];
        word[..chunk.len()].copy_from_slice(chunk);
        out.push_str(&format!(
            "{} ; {:03}: {}\n",
            hex_word(word),
            i * INSTRUCTION_WIDTH,
            disassemble_instruction(word)
        ));
    }

    out
}

/// Load a ROM file from disk.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<RomFile, RomError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| RomError::IoError(e.to_string()))?;
    let mut text = String::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| RomError::IoError(e.to_string()))?;
        text.push_str(&line);
        text.push('\n');
    }
    parse_rom(&text)
}

/// Save a ROM file to disk.
pub fn save_rom<P: AsRef<Path>>(path: P, rom: &RomFile) -> Result<(), RomError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| RomError::IoError(e.to_string()))?;
    file.write_all(format_rom(rom).as_bytes())
        .map_err(|e| RomError::IoError(e.to_string()))
}

/// Errors that can occur during ROM operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("ROM size {size} exceeds available space {available}")]
    TooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rom() {
        let text = "; header\n\n80 00 05 00 ; ADDI\n01 00 01 02\n20\n";
        let rom = parse_rom(text).unwrap();
        assert_eq!(rom.bytes, vec![0x80, 0, 5, 0, 0x01, 0, 1, 2, 0x20, 0, 0, 0]);
        assert_eq!(rom.source_lines.len(), 3);
    }

    #[test]
    fn test_parse_rom_errors() {
        assert!(matches!(
            parse_rom("80 00 05 00 00"),
            Err(RomError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            parse_rom("\nzz"),
            Err(RomError::ParseError { line: 2, .. })
        ));
    }

    #[test]
    fn test_format_then_parse() {
        let rom = RomFile::from_bytes(&[0x80, 0x00, 0x05, 0x00, 0x20, 0x02]);
        let text = format_rom(&rom);
        assert!(text.contains("80 00 05 00 ; 000: ADDI REG0, 5, REG0"));
        assert!(text.contains("20 02 00 00 ; 004: IFEQ REG2, REG0, 0"));
        assert_eq!(parse_rom(&text).unwrap().bytes, vec![0x80, 0, 5, 0, 0x20, 2, 0, 0]);
    }

    #[test]
    fn test_full_program_reloads() {
        let rom = RomFile::from_bytes(&[0x81; PROGRAM_SIZE]);
        let parsed = parse_rom(&format_rom(&rom)).unwrap();
        assert_eq!(parsed.bytes, rom.bytes);

        let overflow = format!("{}FF\n", "00 00 00 00\n".repeat(64));
        assert!(matches!(parse_rom(&overflow), Err(RomError::TooLarge { size: 260, .. })));
    }

    #[test]
    fn test_short_lines_keep_alignment() {
        let rom = parse_rom("81 01\n20 00 00 08\n").unwrap();
        assert_eq!(&rom.bytes[4..8], &[0x20, 0, 0, 8]);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("leg-rom-test-{}.rom", std::process::id()));
        let rom = RomFile::from_bytes(&[0x81, 0x01, 0x0f, 0x02]);

        save_rom(&path, &rom).unwrap();
        let loaded = load_rom(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.bytes, rom.bytes);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_rom("/nonexistent/leg.rom"),
            Err(RomError::IoError(_))
        ));
    }
}
