#[cfg(test)]
mod tests {
    use crate::cpu::isa::Instruction;

    const OPERAND_COUNT_SHIFT: u8 = 6;
    const ALU_BIT: u8 = 0b0010_0000;
    const SETS_PC_BIT: u8 = 0b0001_0000;

    macro_rules! collect_rows {
        (
            $( $(#[$doc:meta])* $name:ident = $opcode:literal, $mnemonic:literal => $handler:ident [ $( $field:ident : $kind:ident ),* $(,)? ], $pc:ident ),* $(,)?
        ) => {
            vec![ $( (Instruction::$name, $opcode, $mnemonic), )* ]
        };
    }

    fn table() -> Vec<(Instruction, u8, &'static str)> {
        crate::for_each_instruction!(collect_rows)
    }

    #[test]
    fn operand_count_matches_encoding() {
        for (instr, opcode, mnemonic) in table() {
            assert_eq!(
                opcode >> OPERAND_COUNT_SHIFT,
                instr.operand_count(),
                "{mnemonic}"
            );
        }
    }

    #[test]
    fn sets_pc_matches_encoding() {
        for (instr, opcode, mnemonic) in table() {
            assert_eq!(opcode & SETS_PC_BIT != 0, instr.sets_pc(), "{mnemonic}");
        }
    }

    #[test]
    fn alu_bit_marks_arithmetic() {
        for (instr, opcode, mnemonic) in table() {
            let expected = matches!(
                instr,
                Instruction::Add | Instruction::Mul | Instruction::Cmp
            );
            assert_eq!(opcode & ALU_BIT != 0, expected, "{mnemonic}");
            assert_eq!(instr.uses_alu(), expected, "{mnemonic}");
        }
    }

    #[test]
    fn opcodes_and_mnemonics_are_unique() {
        let rows = table();
        for (i, (_, opcode, mnemonic)) in rows.iter().enumerate() {
            for (_, other_opcode, other_mnemonic) in &rows[i + 1..] {
                assert_ne!(opcode, other_opcode);
                assert_ne!(mnemonic, other_mnemonic);
            }
        }
    }
}
