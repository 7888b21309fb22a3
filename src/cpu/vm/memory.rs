use crate::cpu::config::MEMORY_SIZE;
use crate::cpu::errors::CpuError;

/// Flat byte-addressable memory.
///
/// Addresses are taken as `usize` so that computed addresses past the end (e.g. `pc + 2` at
/// the top of memory) fault instead of wrapping.
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Creates zeroed memory.
    pub fn new() -> Self {
        Self {
            cells: [0; MEMORY_SIZE],
        }
    }

    /// Returns the byte at `address`.
    ///
    /// Returns [`CpuError::MemoryFault`] if `address` is out of bounds.
    pub fn read(&self, address: usize) -> Result<u8, CpuError> {
        self.cells
            .get(address)
            .copied()
            .ok_or(CpuError::MemoryFault { address })
    }

    /// Stores `value` at `address`.
    ///
    /// Returns [`CpuError::MemoryFault`] if `address` is out of bounds.
    pub fn write(&mut self, address: usize, value: u8) -> Result<(), CpuError> {
        let slot = self
            .cells
            .get_mut(address)
            .ok_or(CpuError::MemoryFault { address })?;
        *slot = value;
        Ok(())
    }

    /// Copies `bytes` into memory starting at `start`.
    pub fn load(&mut self, start: usize, bytes: &[u8]) -> Result<(), CpuError> {
        let end = start + bytes.len();
        let region = self
            .cells
            .get_mut(start..end)
            .ok_or(CpuError::MemoryFault {
                address: end.saturating_sub(1).max(start),
            })?;
        region.copy_from_slice(bytes);
        Ok(())
    }

    /// Returns the byte at `address` without faulting, for tracing.
    pub fn peek(&self, address: usize) -> Option<u8> {
        self.cells.get(address).copied()
    }

    /// Returns all memory cells.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
