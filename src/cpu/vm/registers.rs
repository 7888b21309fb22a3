use crate::cpu::config::REGISTER_COUNT;
use crate::cpu::errors::CpuError;

/// Register file holding the eight 8-bit general-purpose registers.
///
/// `R7` doubles as the stack pointer; it is an ordinary register as far as this type is
/// concerned.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Registers {
    regs: [u8; REGISTER_COUNT],
}

impl Registers {
    /// Creates a register file with every register set to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value in register `idx`.
    ///
    /// Returns [`CpuError::RegisterFault`] if `idx` is out of bounds.
    pub fn get(&self, idx: u8) -> Result<u8, CpuError> {
        self.regs
            .get(idx as usize)
            .copied()
            .ok_or(CpuError::RegisterFault { index: idx })
    }

    /// Stores a value into register `idx`.
    ///
    /// Returns [`CpuError::RegisterFault`] if `idx` is out of bounds.
    pub fn set(&mut self, idx: u8, value: u8) -> Result<(), CpuError> {
        let slot = self
            .regs
            .get_mut(idx as usize)
            .ok_or(CpuError::RegisterFault { index: idx })?;
        *slot = value;
        Ok(())
    }

    /// Returns all register values, `R0` first.
    pub fn values(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_start_zeroed() {
        assert_eq!(Registers::new().values(), &[0; REGISTER_COUNT]);
    }

    #[test]
    fn set_then_get() {
        let mut regs = Registers::new();
        regs.set(0, 8).unwrap();
        regs.set(7, 0xF4).unwrap();
        assert_eq!(regs.get(0).unwrap(), 8);
        assert_eq!(regs.get(7).unwrap(), 0xF4);
    }

    #[test]
    fn out_of_range_index_faults() {
        let mut regs = Registers::new();
        assert!(matches!(
            regs.get(8),
            Err(CpuError::RegisterFault { index: 8 })
        ));
        assert!(matches!(
            regs.set(255, 1),
            Err(CpuError::RegisterFault { index: 255 })
        ));
    }
}
