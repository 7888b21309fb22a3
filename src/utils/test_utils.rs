//! Test utilities for building LS-8 programs.

#[cfg(test)]
pub mod utils {
    use crate::cpu::isa::Instruction;

    /// Assembles one instruction per line into machine code.
    ///
    /// `R<n>` operands become register indices and bare numbers become immediates. Text after
    /// `;` is ignored. Panics on anything it does not understand.
    pub fn assemble(source: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        for line in source.lines() {
            let code = line.split(';').next().unwrap_or_default().trim();
            if code.is_empty() {
                continue;
            }
            let (mnemonic, rest) = code.split_once(' ').unwrap_or((code, ""));
            let instr = Instruction::from_mnemonic(mnemonic)
                .unwrap_or_else(|| panic!("unknown mnemonic `{mnemonic}`"));
            bytes.push(instr.opcode());
            let operands: Vec<&str> = rest
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            assert_eq!(
                operands.len(),
                instr.operand_count() as usize,
                "wrong operand count in `{code}`"
            );
            for operand in operands {
                bytes.push(parse_operand(operand));
            }
        }
        bytes
    }

    fn parse_operand(operand: &str) -> u8 {
        let digits = operand
            .strip_prefix('R')
            .or_else(|| operand.strip_prefix('r'))
            .unwrap_or(operand);
        digits
            .parse()
            .unwrap_or_else(|_| panic!("bad operand `{operand}`"))
    }
}
