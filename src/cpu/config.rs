use crate::cpu::errors::CpuError;

/// Number of addressable memory cells.
pub const MEMORY_SIZE: usize = 256;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Register reserved as the stack pointer.
pub const SP: u8 = 7;

/// Initial stack pointer: the stack grows down from here.
pub const DEFAULT_STACK_TOP: u8 = 0xF4;

/// Bytes reserved below [`DEFAULT_STACK_TOP`] for the stack.
pub const DEFAULT_STACK_SIZE: u8 = 0x40;

/// Machine configuration applied when a [`Cpu`](super::vm::Cpu) is created or reset.
///
/// The stack occupies `[stack_floor, stack_top)`; programs are loaded below `stack_floor`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CpuConfig {
    /// Address the stack pointer starts at. Nothing is ever stored here.
    pub stack_top: u8,
    /// Number of bytes the stack may grow by.
    pub stack_size: u8,
    /// Emit a trace line before each cycle.
    pub trace: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            stack_top: DEFAULT_STACK_TOP,
            stack_size: DEFAULT_STACK_SIZE,
            trace: false,
        }
    }
}

impl CpuConfig {
    /// Lowest address a PUSH may write to.
    pub fn stack_floor(&self) -> u8 {
        self.stack_top.saturating_sub(self.stack_size)
    }

    /// Largest program that fits below the stack.
    pub fn program_capacity(&self) -> usize {
        self.stack_floor() as usize
    }

    /// Checks the stack region fits in memory.
    pub fn validate(&self) -> Result<(), CpuError> {
        if self.stack_size == 0 {
            return Err(CpuError::InvalidConfig {
                reason: "stack size must be greater than 0".into(),
            });
        }
        if self.stack_size > self.stack_top {
            return Err(CpuError::InvalidConfig {
                reason: format!(
                    "a {}-byte stack does not fit below {:#04x}",
                    self.stack_size, self.stack_top
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let config = CpuConfig::default();
        assert_eq!(config.stack_floor(), 0xB4);
        assert_eq!(config.program_capacity(), 0xB4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_stack() {
        let config = CpuConfig {
            stack_size: 0,
            ..CpuConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CpuError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_rejects_stack_below_zero() {
        let config = CpuConfig {
            stack_top: 0x10,
            stack_size: 0x20,
            trace: false,
        };
        assert!(config.validate().is_err());
    }
}
