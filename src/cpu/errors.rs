use ls8_derive::Error;

/// Errors that can occur while loading a program or executing it.
///
/// Every error is fatal to the current run. Faults raised while an instruction is executing
/// are wrapped in [`CpuError::ExecutionFault`], which records where they happened.
#[derive(Debug, Error)]
pub enum CpuError {
    /// Memory address outside the 256-byte address space.
    #[error("memory fault: address {address:#x} is outside 0x00..=0xff")]
    MemoryFault { address: usize },
    /// Register index outside the register file.
    #[error("register fault: R{index} does not exist")]
    RegisterFault { index: u8 },
    /// PUSH past the bottom of the stack region or POP with nothing pushed.
    #[error("stack fault: {op} with stack pointer at {sp:#04x}")]
    StackFault { op: &'static str, sp: u8 },
    /// ALU asked to perform an operation it does not implement.
    #[error("unsupported ALU operation {opcode:#010b}")]
    UnsupportedOperation { opcode: u8 },
    /// Opcode absent from the decode table.
    #[error("unknown instruction {opcode:#010b} at pc {pc:#04x}")]
    UnknownInstruction { opcode: u8, pc: u8 },
    /// A fault raised while executing a decoded instruction.
    #[error("{mnemonic} at pc {pc:#04x}: {source}")]
    ExecutionFault {
        pc: u8,
        mnemonic: &'static str,
        #[source]
        source: Box<CpuError>,
    },
    /// Program source could not be read.
    #[error("cannot load program {path}: {reason}")]
    ProgramLoadError { path: String, reason: String },
    /// A program line is not an 8-bit binary literal.
    #[error("line {line}: `{token}` is not an 8-bit binary literal")]
    InvalidBinaryLiteral { line: usize, token: String },
    /// Program does not fit below the stack region.
    #[error("program is {len} bytes but only {capacity} fit below the stack")]
    ProgramTooLarge { len: usize, capacity: usize },
    /// Inconsistent CPU configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
    /// PRN output could not be written.
    #[error("output error: {reason}")]
    OutputError { reason: String },
}

impl CpuError {
    /// Wraps this error with the location of the instruction that raised it.
    pub(crate) fn at(self, pc: u8, mnemonic: &'static str) -> Self {
        CpuError::ExecutionFault {
            pc,
            mnemonic,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through [`CpuError::ExecutionFault`].
    pub fn root(&self) -> &CpuError {
        match self {
            CpuError::ExecutionFault { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns `true` for errors that stop a program before execution starts.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            CpuError::ProgramLoadError { .. }
                | CpuError::InvalidBinaryLiteral { .. }
                | CpuError::ProgramTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn execution_fault_display_includes_location() {
        let err = CpuError::RegisterFault { index: 9 }.at(0x12, "LDI");
        assert_eq!(err.to_string(), "LDI at pc 0x12: register fault: R9 does not exist");
    }

    #[test]
    fn execution_fault_exposes_source() {
        let err = CpuError::StackFault { op: "POP", sp: 0xF4 }.at(3, "POP");
        let source = err.source().expect("wrapped fault has a source");
        assert_eq!(source.to_string(), "stack fault: POP with stack pointer at 0xf4");
        assert!(CpuError::MemoryFault { address: 256 }.source().is_none());
    }

    #[test]
    fn root_unwraps_nested_faults() {
        let err = CpuError::MemoryFault { address: 256 }.at(0xFF, "PRN");
        assert!(matches!(err.root(), CpuError::MemoryFault { address: 256 }));
    }

    #[test]
    fn load_errors_are_classified() {
        assert!(
            CpuError::InvalidBinaryLiteral {
                line: 1,
                token: "2".into()
            }
            .is_load_error()
        );
        assert!(
            CpuError::ProgramTooLarge {
                len: 300,
                capacity: 180
            }
            .is_load_error()
        );
        assert!(!CpuError::UnknownInstruction { opcode: 0, pc: 0 }.is_load_error());
    }

    #[test]
    fn opcode_display_is_binary() {
        let err = CpuError::UnknownInstruction {
            opcode: 0b1111_1111,
            pc: 4,
        };
        assert_eq!(err.to_string(), "unknown instruction 0b11111111 at pc 0x04");
    }
}
