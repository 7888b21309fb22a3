use ls8::cpu::config::{CpuConfig, DEFAULT_STACK_TOP, SP};
use ls8::cpu::isa::Instruction;
use ls8::cpu::loader::Program;
use ls8::cpu::vm::{Cpu, Flag};
use proptest::prelude::*;

fn run(bytes: Vec<u8>) -> Cpu<Vec<u8>> {
    let mut cpu =
        Cpu::with_program(&Program::from_bytes(bytes), CpuConfig::default(), Vec::new()).unwrap();
    cpu.run().unwrap();
    cpu
}

fn ldi(reg: u8, value: u8) -> [u8; 3] {
    [Instruction::Ldi.opcode(), reg, value]
}

/// `LDI R0,a; LDI R1,b; <op> R0,R1; HLT`
fn binary_op(op: Instruction, a: u8, b: u8) -> Cpu<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.extend(ldi(0, a));
    bytes.extend(ldi(1, b));
    bytes.extend([op.opcode(), 0, 1, Instruction::Hlt.opcode()]);
    run(bytes)
}

proptest! {
    #[test]
    fn add_is_modulo_256(a in any::<u8>(), b in any::<u8>()) {
        let cpu = binary_op(Instruction::Add, a, b);
        prop_assert_eq!(cpu.registers().get(0).unwrap(), ((a as u16 + b as u16) % 256) as u8);
        prop_assert_eq!(cpu.registers().get(1).unwrap(), b);
    }

    #[test]
    fn mul_is_modulo_256(a in any::<u8>(), b in any::<u8>()) {
        let cpu = binary_op(Instruction::Mul, a, b);
        prop_assert_eq!(cpu.registers().get(0).unwrap(), ((a as u16 * b as u16) % 256) as u8);
    }

    #[test]
    fn cmp_sets_exactly_one_flag(a in any::<u8>(), b in any::<u8>()) {
        let cpu = binary_op(Instruction::Cmp, a, b);
        let expected = if a == b {
            Flag::Equal
        } else if a > b {
            Flag::Greater
        } else {
            Flag::Less
        };
        prop_assert_eq!(cpu.flag(), Some(expected));
    }

    #[test]
    fn push_then_pop_restores_value_and_sp(value in any::<u8>(), src in 0u8..7, dest in 0u8..7) {
        let mut bytes = Vec::new();
        bytes.extend(ldi(src, value));
        bytes.extend([
            Instruction::Push.opcode(), src,
            Instruction::Pop.opcode(), dest,
            Instruction::Hlt.opcode(),
        ]);
        let cpu = run(bytes);
        prop_assert_eq!(cpu.registers().get(dest).unwrap(), value);
        prop_assert_eq!(cpu.registers().get(SP).unwrap(), DEFAULT_STACK_TOP);
    }

    #[test]
    fn prn_prints_decimal(value in any::<u8>()) {
        let mut bytes = Vec::new();
        bytes.extend(ldi(2, value));
        bytes.extend([Instruction::Prn.opcode(), 2, Instruction::Hlt.opcode()]);
        let cpu = run(bytes);
        prop_assert_eq!(String::from_utf8(cpu.into_output()).unwrap(), format!("{value}\n"));
    }
}
