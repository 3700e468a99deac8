//! Property tests for the LEG execution engine.

use leg::cpu::decode::encode;
use leg::{Address, Cpu, Instruction, Opcode, Registers};
use proptest::prelude::*;

/// Registers in [0, 255).
fn value() -> impl Strategy<Value = u8> {
    0u8..255
}

fn general() -> impl Strategy<Value = Address> {
    prop::sample::select(Address::GENERAL.to_vec())
}

/// A CPU whose general registers hold `values`, with `instr` at `pc`.
fn machine(values: [u8; 6], pc: u8, instr: Instruction) -> Cpu {
    let mut code = vec![0u8; 255];
    for (i, byte) in encode(&instr).into_iter().enumerate() {
        code[(pc as usize + i) % 255] = byte;
    }
    let mut cpu = Cpu::new();
    cpu.load_program(&code).unwrap();
    for (addr, v) in Address::GENERAL.iter().zip(values) {
        cpu.regs.set(*addr, v);
    }
    cpu.regs.jump(pc);
    cpu
}

fn value_of(regs: &Registers, addr: Address) -> u16 {
    regs.get(addr).unwrap() as u16
}

/// Every general register except `dst` is unchanged.
fn others_unchanged(before: &Registers, after: &Registers, dst: Address) -> bool {
    Address::GENERAL
        .iter()
        .filter(|&&a| a != dst)
        .all(|&a| before.get(a) == after.get(a))
}

proptest! {
    #[test]
    fn add_reduces_mod_255(
        values in prop::array::uniform6(value()),
        pc in 0u8..255,
        src1 in general(), src2 in general(), dst in general(),
    ) {
        let mut cpu = machine(values, pc, Instruction::new(Opcode::Add, src1.to_byte(), src2.to_byte(), dst.to_byte()));
        let before = cpu.regs.clone();

        cpu.tick().unwrap();

        let expected = (value_of(&before, src1) + value_of(&before, src2)) % 255;
        prop_assert_eq!(value_of(&cpu.regs, dst), expected);
        prop_assert!(others_unchanged(&before, &cpu.regs, dst));
        prop_assert_eq!(cpu.regs.pc() as u16, (pc as u16 + 4) % 255);
    }

    #[test]
    fn addi_reduces_mod_255(
        values in prop::array::uniform6(value()),
        src in general(), dst in general(),
        imm in any::<u8>(),
    ) {
        let mut cpu = machine(values, 0, Instruction::new(Opcode::Addi, src.to_byte(), imm, dst.to_byte()));
        let before = cpu.regs.clone();

        cpu.tick().unwrap();

        let expected = (value_of(&before, src) + imm as u16) % 255;
        prop_assert_eq!(value_of(&cpu.regs, dst), expected);
        prop_assert!(others_unchanged(&before, &cpu.regs, dst));
    }

    #[test]
    fn and_is_exact(
        values in prop::array::uniform6(value()),
        src1 in general(), src2 in general(), dst in general(),
    ) {
        let mut cpu = machine(values, 0, Instruction::new(Opcode::And, src1.to_byte(), src2.to_byte(), dst.to_byte()));
        let before = cpu.regs.clone();

        cpu.tick().unwrap();

        let a = before.get(src1).unwrap();
        let b = before.get(src2).unwrap();
        let result = cpu.regs.get(dst).unwrap();
        prop_assert_eq!(result, a & b);
        prop_assert_eq!(result & !(a & b), 0);
        prop_assert!(others_unchanged(&before, &cpu.regs, dst));
    }

    #[test]
    fn andi_is_exact(
        values in prop::array::uniform6(value()),
        src in general(), dst in general(),
        imm in any::<u8>(),
    ) {
        let mut cpu = machine(values, 0, Instruction::new(Opcode::Andi, src.to_byte(), imm, dst.to_byte()));
        let a = cpu.regs.get(src).unwrap();

        cpu.tick().unwrap();

        prop_assert_eq!(cpu.regs.get(dst).unwrap(), a & imm);
    }

    #[test]
    fn ifeq_jumps_only_when_equal(
        values in prop::array::uniform6(value()),
        pc in 0u8..255,
        a in general(), b in general(),
        target in 0u8..255,
    ) {
        let mut cpu = machine(values, pc, Instruction::new(Opcode::Ifeq, a.to_byte(), b.to_byte(), target));
        let before = cpu.regs.clone();

        let step = cpu.tick().unwrap();

        if before.get(a) == before.get(b) {
            prop_assert!(step.jumped);
            prop_assert_eq!(cpu.regs.pc(), target);
        } else {
            prop_assert!(!step.jumped);
            prop_assert_eq!(cpu.regs.pc() as u16, (pc as u16 + 4) % 255);
        }
        prop_assert_eq!(cpu.regs.general(), before.general());
    }

    #[test]
    fn unknown_opcode_only_advances_pc(
        values in prop::array::uniform6(value()),
        pc in 0u8..255,
        word in any::<[u8; 4]>(),
    ) {
        prop_assume!(Opcode::from_byte(word[0]).is_none());

        let mut code = vec![0u8; 255];
        for (i, byte) in word.into_iter().enumerate() {
            code[(pc as usize + i) % 255] = byte;
        }
        let mut cpu = Cpu::new();
        cpu.load_program(&code).unwrap();
        for (addr, v) in Address::GENERAL.iter().zip(values) {
            cpu.regs.set(*addr, v);
        }
        cpu.regs.jump(pc);
        let before = cpu.regs.clone();

        let step = cpu.tick().unwrap();

        prop_assert_eq!(step.instruction, None);
        prop_assert_eq!(cpu.regs.general(), before.general());
        prop_assert_eq!(cpu.regs.pc() as u16, (pc as u16 + 4) % 255);
    }

    #[test]
    fn unknown_address_is_inert(
        values in prop::array::uniform6(value()),
        operand in 8u8..=255,
        written in any::<u8>(),
    ) {
        let mut cpu = machine(values, 0, Instruction::new(Opcode::Add, 0, 0, 0));
        let before = cpu.regs.clone();

        cpu.set(operand, written);

        prop_assert_eq!(cpu.get(operand), 0);
        prop_assert_eq!(&cpu.regs, &before);
    }

    #[test]
    fn registers_never_hold_255(
        program in prop::collection::vec(any::<u8>(), 0..=255),
        ticks in 1u64..64,
    ) {
        let mut cpu = Cpu::new();
        cpu.load_program(&program).unwrap();

        cpu.run(ticks).unwrap();

        prop_assert!(cpu.regs.dump().iter().all(|&(_, v)| v < 255));
    }
}

#[test]
fn scenario_addi_from_zero() {
    let mut cpu = machine([0; 6], 0, Instruction::new(Opcode::Addi, Address::Reg0.to_byte(), 5, Address::Reg0.to_byte()));
    cpu.tick().unwrap();
    assert_eq!(cpu.regs.get(Address::Reg0), Some(5));
    assert_eq!(cpu.regs.pc(), 4);
}

#[test]
fn scenario_and_masks() {
    let mut cpu = machine(
        [0b1010_1010, 0b0000_1111, 0, 0, 0, 0],
        0,
        Instruction::new(Opcode::And, Address::Reg0.to_byte(), Address::Reg1.to_byte(), Address::Reg2.to_byte()),
    );
    cpu.tick().unwrap();
    assert_eq!(cpu.regs.get(Address::Reg2), Some(0b0000_1010));
}

#[test]
fn scenario_ifeq_jumps_to_zero() {
    let mut cpu = machine(
        [0, 0, 7, 7, 0, 0],
        12,
        Instruction::new(Opcode::Ifeq, Address::Reg2.to_byte(), Address::Reg3.to_byte(), 0x00),
    );
    cpu.tick().unwrap();
    assert_eq!(cpu.regs.pc(), 0);
}

#[test]
fn scenario_addi_wraps() {
    let mut cpu = machine(
        [250, 0, 0, 0, 0, 0],
        0,
        Instruction::new(Opcode::Addi, Address::Reg0.to_byte(), 10, Address::Reg0.to_byte()),
    );
    cpu.tick().unwrap();
    assert_eq!(cpu.regs.get(Address::Reg0), Some(5));
}

#[test]
fn scenario_pc_wraps() {
    let mut cpu = machine(
        [0; 6],
        252,
        Instruction::new(Opcode::Addi, Address::Reg1.to_byte(), 1, Address::Reg1.to_byte()),
    );
    cpu.tick().unwrap();
    assert_eq!(cpu.regs.get(Address::Reg1), Some(1));
    assert_eq!(cpu.regs.pc(), 1);
}

#[test]
fn demo_program_loops() {
    let program = leg::assemble(
        "START: ADDI REG0, 0b10101010, REG0\n\
         ADDI REG1, 10, REG1\n\
         AND REG0, REG1, REG2\n\
         IFEQ REG2, REG2, START",
    )
    .unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&program).unwrap();

    cpu.run(4).unwrap();
    assert_eq!(cpu.regs.get(Address::Reg0), Some(170));
    assert_eq!(cpu.regs.get(Address::Reg1), Some(10));
    assert_eq!(cpu.regs.get(Address::Reg2), Some(170 & 10));
    assert_eq!(cpu.regs.pc(), 0);

    cpu.run(4).unwrap();
    assert_eq!(cpu.regs.get(Address::Reg0), Some(85));
    assert_eq!(cpu.regs.get(Address::Reg1), Some(20));
}
