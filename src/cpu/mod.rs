//! LS-8: an 8-bit register machine.
//!
//! # Architecture
//!
//! - **Memory**: 256 bytes shared by program, data and stack
//! - **Registers**: `R0`..`R7`, 8 bits each; `R7` is the stack pointer
//! - **Flags**: one comparison outcome (`E`, `G` or `L`) written by `CMP`
//! - **Stack**: grows downward from [`config::DEFAULT_STACK_TOP`]
//! - **Execution model**: fetch, decode, execute, advance until `HLT` or a fault
//!
//! # Modules
//!
//! - [`config`]: Memory layout constants and [`config::CpuConfig`]
//! - [`errors`]: Load and execution error types
//! - [`isa`]: Instruction table and opcode mappings
//! - [`loader`]: `.ls8` text parsing
//! - [`vm`]: The CPU itself

pub mod config;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod loader;
pub mod vm;
