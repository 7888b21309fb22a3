//! LS-8 library.
//!
//! Provides the program loader and the CPU that executes LS-8 machine code.

pub mod cpu;
pub mod utils;
