//! Arithmetic on register pairs.
//!
//! The ALU reads two registers, computes with 8-bit wraparound and writes the result back to
//! the destination register. It never touches memory, the program counter or the flags.

use crate::cpu::errors::CpuError;
use crate::cpu::isa::Instruction;
use crate::cpu::vm::registers::Registers;

/// Operations the ALU implements, keyed by the opcode of the instruction requesting them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AluOp {
    Add,
    Mul,
}

impl TryFrom<u8> for AluOp {
    type Error = CpuError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        match Instruction::try_from(opcode) {
            Ok(Instruction::Add) => Ok(AluOp::Add),
            Ok(Instruction::Mul) => Ok(AluOp::Mul),
            _ => Err(CpuError::UnsupportedOperation { opcode }),
        }
    }
}

impl AluOp {
    /// Computes `a op b` modulo 256.
    pub fn compute(self, a: u8, b: u8) -> u8 {
        match self {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Mul => a.wrapping_mul(b),
        }
    }
}

/// Applies `op` to registers `dest` and `src`, storing the result in `dest`.
pub fn apply(registers: &mut Registers, op: AluOp, dest: u8, src: u8) -> Result<(), CpuError> {
    let a = registers.get(dest)?;
    let b = registers.get(src)?;
    registers.set(dest, op.compute(a, b))
}
