//! LEG CPU registers.
//!
//! The register file holds six general-purpose registers (REG0-REG5)
//! and the program counter. Every stored value lies in `0..255`: values
//! are reduced modulo 255 on write, so 255 itself is never representable.

use crate::cpu::decode::Address;
use serde::{Serialize, Deserialize};

/// Number of general-purpose registers.
pub const GENERAL_REGISTERS: usize = 6;

/// Modulus of the value space. Note: 255, not 256.
pub const VALUE_MODULUS: u16 = 255;

/// Reduce a wide intermediate result into the register value space.
#[inline]
pub fn reduce(value: u16) -> u8 {
    (value % VALUE_MODULUS) as u8
}

/// The LEG register file.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Registers {
    /// REG0-REG5
    general: [u8; GENERAL_REGISTERS],
    /// Program counter (byte offset into the program).
    pc: u8,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Read a register or the PC. Returns `None` for the I/O port,
    /// which lives outside the register file.
    pub fn get(&self, addr: Address) -> Option<u8> {
        match addr {
            Address::Pc => Some(self.pc),
            Address::Io => None,
            reg => Some(self.general[reg.to_byte() as usize]),
        }
    }

    /// Write a register or the PC, reducing the value modulo 255.
    /// Returns `false` (and stores nothing) for the I/O port.
    pub fn set(&mut self, addr: Address, value: u8) -> bool {
        let value = reduce(value as u16);
        match addr {
            Address::Pc => self.pc = value,
            Address::Io => return false,
            reg => self.general[reg.to_byte() as usize] = value,
        }
        true
    }

    /// Current program counter.
    #[inline]
    pub fn pc(&self) -> u8 {
        self.pc
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, target: u8) {
        self.pc = reduce(target as u16);
    }

    /// Advance the program counter by `step` bytes, wrapping modulo 255.
    /// Returns the old value.
    pub fn advance_pc(&mut self, step: u8) -> u8 {
        let old = self.pc;
        self.pc = reduce(self.pc as u16 + step as u16);
        old
    }

    /// The general-purpose registers, REG0 first.
    pub fn general(&self) -> &[u8; GENERAL_REGISTERS] {
        &self.general
    }

    /// Every register paired with its address, for debugging views.
    pub fn dump(&self) -> Vec<(Address, u8)> {
        Address::GENERAL
            .iter()
            .map(|&a| (a, self.general[a.to_byte() as usize]))
            .chain(std::iter::once((Address::Pc, self.pc)))
            .collect()
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (addr, value) in self.dump() {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{}={:3}", addr, value)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registers")
            .field("general", &self.general)
            .field("pc", &self.pc)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce() {
        assert_eq!(reduce(0), 0);
        assert_eq!(reduce(254), 254);
        assert_eq!(reduce(255), 0);
        assert_eq!(reduce(260), 5);
        assert_eq!(reduce(508), 253);
    }

    #[test]
    fn test_get_set() {
        let mut regs = Registers::new();
        assert!(regs.set(Address::Reg3, 42));
        assert_eq!(regs.get(Address::Reg3), Some(42));
        assert_eq!(regs.get(Address::Reg2), Some(0));

        assert!(regs.set(Address::Pc, 12));
        assert_eq!(regs.pc(), 12);
    }

    #[test]
    fn test_io_is_not_a_register() {
        let mut regs = Registers::new();
        assert!(!regs.set(Address::Io, 9));
        assert_eq!(regs.get(Address::Io), None);
        assert_eq!(regs, Registers::new());
    }

    #[test]
    fn test_set_reduces_255() {
        let mut regs = Registers::new();
        regs.set(Address::Reg0, 255);
        assert_eq!(regs.get(Address::Reg0), Some(0));
        regs.jump(255);
        assert_eq!(regs.pc(), 0);
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.jump(10);

        let old = regs.advance_pc(4);
        assert_eq!(old, 10);
        assert_eq!(regs.pc(), 14);

        regs.jump(252);
        regs.advance_pc(4);
        assert_eq!(regs.pc(), 1);
    }

    #[test]
    fn test_display_dump() {
        let mut regs = Registers::new();
        regs.set(Address::Reg1, 7);
        let text = regs.to_string();
        assert!(text.starts_with("REG0=  0 REG1=  7"));
        assert!(text.ends_with("PC=  0"));
    }
}
