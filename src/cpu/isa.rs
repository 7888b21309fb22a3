//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the canonical
//! instruction table and invokes a callback macro for code generation, so the decoder
//! metadata here and the handler dispatch in [`vm`](super::vm) come from one definition.
//!
//! This module generates:
//! - The [`Instruction`] enum with opcode mappings
//! - `TryFrom<u8>` for decoding opcodes
//! - Per-instruction metadata: mnemonic, operand kinds, and how the program counter moves
//!
//! # Encoding
//!
//! Every instruction is one opcode byte followed by zero, one or two operand bytes.
//! Opcodes follow the `AABCDDDD` layout:
//! - `AA`: number of operand bytes
//! - `B`: instruction is handled by the ALU
//! - `C`: instruction sets the program counter itself
//! - `DDDD`: instruction identifier

use crate::cpu::errors::CpuError;
use std::fmt;

/// Invokes a callback macro with the complete instruction definition list.
///
/// Each row reads `Name = opcode, "MNEMONIC" => handler [operands], pc_update`.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// HLT ; stop execution
            Hlt = 0b0000_0001, "HLT" => op_hlt [], Advance,
            /// LDI reg, imm ; reg = imm
            Ldi = 0b1000_0010, "LDI" => op_ldi [reg: Reg, imm: Imm], Advance,
            /// PRN reg ; print the decimal value of reg
            Prn = 0b0100_0111, "PRN" => op_prn [reg: Reg], Advance,
            /// ADD dest, src ; dest = (dest + src) mod 256
            Add = 0b1010_0000, "ADD" => op_alu [dest: Reg, src: Reg], Advance,
            /// MUL dest, src ; dest = (dest * src) mod 256
            Mul = 0b1010_0010, "MUL" => op_alu [dest: Reg, src: Reg], Advance,
            /// CMP a, b ; flag = Equal | Greater | Less comparing a with b
            Cmp = 0b1010_0111, "CMP" => op_cmp [a: Reg, b: Reg], Advance,
            /// PUSH reg ; sp -= 1; mem[sp] = reg
            Push = 0b0100_0101, "PUSH" => op_push [reg: Reg], Advance,
            /// POP reg ; reg = mem[sp]; sp += 1
            Pop = 0b0100_0110, "POP" => op_pop [reg: Reg], Advance,
            /// CALL reg ; push the address after CALL, pc = reg
            Call = 0b0101_0000, "CALL" => op_call [reg: Reg], Direct,
            /// RET ; pc = pop
            Ret = 0b0001_0001, "RET" => op_ret [], Direct,
            /// JMP reg ; pc = reg
            Jmp = 0b0101_0100, "JMP" => op_jmp [reg: Reg], Direct,
            /// JEQ reg ; if flag == Equal then pc = reg
            Jeq = 0b0101_0101, "JEQ" => op_jeq [reg: Reg], Direct,
            /// JNE reg ; if flag != Equal then pc = reg
            Jne = 0b0101_0110, "JNE" => op_jne [reg: Reg], Direct,
        }
    };
}

/// Kind of byte following an opcode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperandKind {
    /// Register index (`R0`..`R7`).
    Reg,
    /// Immediate 8-bit value.
    Imm,
}

/// How the program counter moves after an instruction executes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PcUpdate {
    /// The execution loop advances past the opcode and its operands.
    Advance,
    /// The handler assigns the program counter itself.
    Direct,
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => $handler:ident [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $pc:ident
        ),* $(,)?
    ) => {
        /// Instructions understood by the decoder.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        #[repr(u8)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Instruction {
            type Error = CpuError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Instruction::$name), )*
                    _ => Err(CpuError::UnknownInstruction { opcode: value, pc: 0 }),
                }
            }
        }

        impl Instruction {
            /// Every instruction in table order.
            pub const ALL: &'static [Instruction] = &[ $( Instruction::$name, )* ];

            /// Returns the opcode byte.
            pub const fn opcode(&self) -> u8 {
                *self as u8
            }

            /// Returns the assembly mnemonic for this instruction.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Instruction::$name => $mnemonic, )*
                }
            }

            /// Returns the kinds of the operand bytes following the opcode.
            pub const fn operand_kinds(&self) -> &'static [OperandKind] {
                match self {
                    $( Instruction::$name => &[ $( OperandKind::$kind, )* ], )*
                }
            }

            /// Returns how many operand bytes follow the opcode (0, 1 or 2).
            pub const fn operand_count(&self) -> u8 {
                self.operand_kinds().len() as u8
            }

            /// Returns how the program counter moves after this instruction.
            pub const fn pc_update(&self) -> PcUpdate {
                match self {
                    $( Instruction::$name => PcUpdate::$pc, )*
                }
            }

            /// Returns `true` when the handler sets the program counter directly.
            pub const fn sets_pc(&self) -> bool {
                matches!(self.pc_update(), PcUpdate::Direct)
            }

            /// Returns `true` when the ALU executes this instruction.
            pub const fn uses_alu(&self) -> bool {
                self.opcode() & 0b0010_0000 != 0
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl Instruction {
    /// Looks up an instruction by mnemonic, ignoring case.
    pub fn from_mnemonic(name: &str) -> Option<Instruction> {
        Instruction::ALL
            .iter()
            .copied()
            .find(|instr| instr.mnemonic().eq_ignore_ascii_case(name))
    }
}

/// A fetched and decoded instruction: the opcode plus the operand bytes it declared.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Decoded {
    /// Instruction the opcode maps to.
    pub instruction: Instruction,
    /// Operand bytes; only the first `instruction.operand_count()` are meaningful.
    operands: [u8; 2],
}

impl Decoded {
    /// Builds a decoded instruction from the operand bytes read after the opcode.
    ///
    /// Missing operands are zero; extra ones are ignored.
    pub fn new(instruction: Instruction, operands: &[u8]) -> Self {
        let mut slots = [0u8; 2];
        for (slot, byte) in slots
            .iter_mut()
            .zip(operands)
            .take(instruction.operand_count() as usize)
        {
            *slot = *byte;
        }
        Self {
            instruction,
            operands: slots,
        }
    }

    /// Returns the operand bytes declared by the instruction.
    pub fn operands(&self) -> &[u8] {
        &self.operands[..self.instruction.operand_count() as usize]
    }

    /// Total encoded length in bytes, opcode included.
    pub fn size(&self) -> u8 {
        1 + self.instruction.operand_count()
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instruction.mnemonic())?;
        let kinds = self.instruction.operand_kinds();
        for (i, (kind, value)) in kinds.iter().zip(self.operands()).enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            match kind {
                OperandKind::Reg => write!(f, "{sep}R{value}")?,
                OperandKind::Imm => write!(f, "{sep}{value}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_try_from_invalid() {
        assert!(matches!(
            Instruction::try_from(0xFF),
            Err(CpuError::UnknownInstruction { opcode: 0xFF, .. })
        ));
        assert!(Instruction::try_from(0).is_err());
    }

    #[test]
    fn instruction_try_from_roundtrips_table() {
        for instr in Instruction::ALL {
            assert_eq!(Instruction::try_from(instr.opcode()).unwrap(), *instr);
        }
    }

    #[test]
    fn metadata_matches_table() {
        assert_eq!(Instruction::Ldi.mnemonic(), "LDI");
        assert_eq!(Instruction::Ldi.operand_count(), 2);
        assert_eq!(
            Instruction::Ldi.operand_kinds(),
            &[OperandKind::Reg, OperandKind::Imm]
        );
        assert_eq!(Instruction::Prn.operand_count(), 1);
        assert_eq!(Instruction::Hlt.operand_count(), 0);
        assert_eq!(Instruction::Ret.operand_count(), 0);
        assert!(Instruction::Call.sets_pc());
        assert!(Instruction::Jeq.sets_pc());
        assert!(!Instruction::Push.sets_pc());
        assert!(!Instruction::Hlt.sets_pc());
    }

    #[test]
    fn from_mnemonic_ignores_case() {
        assert_eq!(Instruction::from_mnemonic("mul"), Some(Instruction::Mul));
        assert_eq!(Instruction::from_mnemonic("JNE"), Some(Instruction::Jne));
        assert_eq!(Instruction::from_mnemonic("SUB"), None);
    }

    #[test]
    fn decoded_keeps_declared_operands_only() {
        let decoded = Decoded::new(Instruction::Prn, &[3, 9]);
        assert_eq!(decoded.operands(), &[3]);
        assert_eq!(decoded.size(), 2);
    }

    #[test]
    fn decoded_renders_as_assembly() {
        assert_eq!(
            Decoded::new(Instruction::Ldi, &[0, 8]).to_string(),
            "LDI R0, 8"
        );
        assert_eq!(Decoded::new(Instruction::Mul, &[0, 1]).to_string(), "MUL R0, R1");
        assert_eq!(Decoded::new(Instruction::Ret, &[]).to_string(), "RET");
    }
}
