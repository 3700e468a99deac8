//! Arithmetic/logic and branch-condition primitives.
//!
//! Pure functions over register values. The executor resolves operands
//! and writes results; everything here is total over `u8` inputs.

use crate::cpu::decode::Opcode;
use crate::cpu::registers::reduce;
use serde::{Serialize, Deserialize};

/// Add two values, reducing modulo 255.
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    reduce(a as u16 + b as u16)
}

/// Bitwise AND. Never overflows, so no reduction.
#[inline]
pub fn and(a: u8, b: u8) -> u8 {
    a & b
}

/// A binary ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    And,
}

impl AluOp {
    /// Apply the operation to two operand values.
    pub fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            AluOp::Add => add(a, b),
            AluOp::And => and(a, b),
        }
    }
}

/// How the second source operand of a calculation is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperandForm {
    /// (src1, src2, dst): both sources are addresses.
    Register,
    /// (src, imm, dst): the second byte is a literal.
    Immediate,
}

/// Classify a calculation opcode. `None` for other bands.
pub fn calculation(opcode: Opcode) -> Option<(AluOp, OperandForm)> {
    match opcode {
        Opcode::Add => Some((AluOp::Add, OperandForm::Register)),
        Opcode::Addi => Some((AluOp::Add, OperandForm::Immediate)),
        Opcode::And => Some((AluOp::And, OperandForm::Register)),
        Opcode::Andi => Some((AluOp::And, OperandForm::Immediate)),
        _ => None,
    }
}

/// A jump condition. Each tests exactly one relation; a jump happens
/// only when it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Equal,
}

impl Condition {
    /// Whether the jump is taken for operand values `a` and `b`.
    pub fn holds(self, a: u8, b: u8) -> bool {
        match self {
            Condition::Equal => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_reduces_mod_255() {
        assert_eq!(add(2, 3), 5);
        assert_eq!(add(250, 10), 5);
        assert_eq!(add(200, 55), 0);
        assert_eq!(add(254, 254), 253);
    }

    #[test]
    fn test_and_is_exact() {
        assert_eq!(and(0b1010_1010, 0b0000_1111), 0b0000_1010);
        assert_eq!(and(0xff, 0xff), 0xff);
        assert_eq!(AluOp::And.apply(170, 15), 10);
    }

    #[test]
    fn test_calculation_classification() {
        assert_eq!(calculation(Opcode::Addi), Some((AluOp::Add, OperandForm::Immediate)));
        assert_eq!(calculation(Opcode::And), Some((AluOp::And, OperandForm::Register)));
        assert_eq!(calculation(Opcode::Ifeq), None);
        assert_eq!(calculation(Opcode::Load), None);
    }

    #[test]
    fn test_condition_equal() {
        assert!(Condition::Equal.holds(7, 7));
        assert!(!Condition::Equal.holds(7, 8));
    }
}
