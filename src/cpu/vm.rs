//! Core CPU implementation.
//!
//! The CPU owns its memory, register file, flag register and program counter, and drives
//! the fetch, decode, execute, advance cycle until HLT or a fault. All arithmetic uses
//! wrapping 8-bit semantics; every memory and register access is bounds-checked.

use crate::cpu::config::{CpuConfig, SP};
use crate::cpu::errors::CpuError;
use crate::cpu::isa::{Decoded, Instruction};
use crate::cpu::loader::Program;
use crate::debug;
use crate::for_each_instruction;
use std::io::{self, Write};

pub mod alu;
pub mod flags;
pub mod memory;
pub mod registers;

pub use alu::AluOp;
pub use flags::{Flag, FlagRegister};
pub use memory::Memory;
pub use registers::Registers;

/// Execution state of a [`Cpu`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CpuState {
    /// Fetching and executing instructions.
    Running,
    /// Stopped by HLT.
    Halted,
    /// Stopped by a fault; memory and registers are left as of the failing cycle.
    Faulted,
}

/// What the execution loop does once a handler returns.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Executes one decoded instruction against the CPU.
pub type Handler<W> = fn(&mut Cpu<W>, &Decoded) -> Result<Flow, CpuError>;

/// Binds each table row's operand bytes to the parameters of its handler method.
macro_rules! define_handlers {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => $handler:ident [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $pc:ident
        ),* $(,)?
    ) => {
        impl Instruction {
            /// Returns the handler that executes this instruction.
            pub fn handler<W: Write>(self) -> Handler<W> {
                match self {
                    $(
                        Instruction::$name => (|cpu: &mut Cpu<W>, decoded: &Decoded| {
                            #[allow(unused_mut, unused_variables)]
                            let mut operands = decoded.operands().iter().copied();
                            $( let $field = operands.next().unwrap_or_default(); )*
                            cpu.$handler($( $field ),*)
                        }) as Handler<W>,
                    )*
                }
            }
        }
    };
}

for_each_instruction!(define_handlers);

/// An 8-bit register machine.
///
/// PRN output goes to `W`, standard output by default.
pub struct Cpu<W: Write = io::Stdout> {
    /// 256 bytes of program, data and stack.
    memory: Memory,
    /// R0..R7; R7 is the stack pointer.
    registers: Registers,
    /// Outcome of the last CMP.
    flags: FlagRegister,
    /// Address of the next opcode to fetch.
    pc: u8,
    /// Opcode of the instruction being executed.
    ir: u8,
    /// Address right after the instruction being executed.
    next_pc: usize,
    state: CpuState,
    /// Cycles completed since the last reset.
    cycles: u64,
    config: CpuConfig,
    output: W,
}

impl<W: Write> Cpu<W> {
    /// Creates a CPU with zeroed memory whose PRN output goes to `output`.
    ///
    /// Returns [`CpuError::InvalidConfig`] if the stack region does not fit in memory.
    pub fn new(config: CpuConfig, output: W) -> Result<Self, CpuError> {
        config.validate()?;
        let mut cpu = Self {
            memory: Memory::new(),
            registers: Registers::new(),
            flags: FlagRegister::default(),
            pc: 0,
            ir: 0,
            next_pc: 0,
            state: CpuState::Running,
            cycles: 0,
            config,
            output,
        };
        cpu.reset();
        Ok(cpu)
    }

    /// Creates a CPU and loads `program` at address 0.
    pub fn with_program(program: &Program, config: CpuConfig, output: W) -> Result<Self, CpuError> {
        let mut cpu = Self::new(config, output)?;
        cpu.load(program)?;
        Ok(cpu)
    }

    /// Zeroes memory, writes `program` starting at address 0 and resets the CPU.
    ///
    /// Returns [`CpuError::ProgramTooLarge`] if the program would reach into the stack.
    pub fn load(&mut self, program: &Program) -> Result<(), CpuError> {
        let capacity = self.config.program_capacity();
        if program.len() > capacity {
            return Err(CpuError::ProgramTooLarge {
                len: program.len(),
                capacity,
            });
        }
        self.memory = Memory::new();
        self.memory.load(0, program.bytes())?;
        self.reset();
        Ok(())
    }

    /// Clears registers, flags and the program counter, and points the stack pointer at the
    /// top of the stack. Memory is left untouched.
    pub fn reset(&mut self) {
        self.registers = Registers::new();
        // SP is always a valid register index.
        let _ = self.registers.set(SP, self.config.stack_top);
        self.flags.clear();
        self.pc = 0;
        self.ir = 0;
        self.next_pc = 0;
        self.state = CpuState::Running;
        self.cycles = 0;
    }

    /// Runs until HLT or a fault.
    ///
    /// Returns the number of cycles executed. A CPU that is not running executes nothing.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        while self.step()? == CpuState::Running {}
        Ok(self.cycles)
    }

    /// Executes a single fetch, decode, execute, advance cycle.
    ///
    /// A fault moves the CPU to [`CpuState::Faulted`]; it executes nothing afterwards.
    pub fn step(&mut self) -> Result<CpuState, CpuError> {
        if self.state != CpuState::Running {
            return Ok(self.state);
        }
        if self.config.trace {
            debug!("{}", self.trace());
        }

        match self.cycle() {
            Ok(flow) => {
                self.cycles += 1;
                if flow == Flow::Halt {
                    self.state = CpuState::Halted;
                }
                Ok(self.state)
            }
            Err(err) => {
                self.state = CpuState::Faulted;
                Err(err)
            }
        }
    }

    fn cycle(&mut self) -> Result<Flow, CpuError> {
        let pc = self.pc;
        let opcode = self.memory.read(pc as usize)?;
        let instruction = Instruction::try_from(opcode)
            .map_err(|_| CpuError::UnknownInstruction { opcode, pc })?;
        self.execute(pc, instruction)
            .map_err(|err| err.at(pc, instruction.mnemonic()))
    }

    /// Fetches operands for `instruction`, runs its handler and advances the program counter
    /// unless the handler assigned it.
    fn execute(&mut self, pc: u8, instruction: Instruction) -> Result<Flow, CpuError> {
        let decoded = self.fetch_operands(pc, instruction)?;
        self.ir = instruction.opcode();
        self.next_pc = pc as usize + decoded.size() as usize;

        let handler = instruction.handler::<W>();
        let flow = handler(self, &decoded)?;

        if flow == Flow::Continue && !instruction.sets_pc() {
            self.pc = Self::address(self.next_pc)?;
        }
        Ok(flow)
    }

    fn fetch_operands(&self, pc: u8, instruction: Instruction) -> Result<Decoded, CpuError> {
        let mut operands = [0u8; 2];
        let count = instruction.operand_count() as usize;
        for (offset, slot) in operands.iter_mut().take(count).enumerate() {
            *slot = self.memory.read(pc as usize + 1 + offset)?;
        }
        Ok(Decoded::new(instruction, &operands))
    }

    /// Decodes the instruction stored at `address` without executing it.
    pub fn decode_at(&self, address: u8) -> Result<Decoded, CpuError> {
        let opcode = self.memory.read(address as usize)?;
        let instruction = Instruction::try_from(opcode)
            .map_err(|_| CpuError::UnknownInstruction { opcode, pc: address })?;
        self.fetch_operands(address, instruction)
    }

    /// Converts a computed address into a program counter value, faulting past the end.
    fn address(value: usize) -> Result<u8, CpuError> {
        u8::try_from(value).map_err(|_| CpuError::MemoryFault { address: value })
    }

    /// Pushes `value` onto the descending stack.
    ///
    /// Returns [`CpuError::StackFault`] when the stack is full or the stack pointer is
    /// outside the stack region.
    fn push(&mut self, value: u8) -> Result<(), CpuError> {
        let sp = self.registers.get(SP)?;
        if sp <= self.config.stack_floor() || sp > self.config.stack_top {
            return Err(CpuError::StackFault { op: "PUSH", sp });
        }
        let sp = sp - 1;
        self.memory.write(sp as usize, value)?;
        self.registers.set(SP, sp)
    }

    /// Pops the top of the stack.
    ///
    /// Returns [`CpuError::StackFault`] when nothing has been pushed or the stack pointer is
    /// outside the stack region.
    fn pop(&mut self) -> Result<u8, CpuError> {
        let sp = self.registers.get(SP)?;
        if sp >= self.config.stack_top || sp < self.config.stack_floor() {
            return Err(CpuError::StackFault { op: "POP", sp });
        }
        let value = self.memory.read(sp as usize)?;
        self.registers.set(SP, sp + 1)?;
        Ok(value)
    }

    fn op_hlt(&mut self) -> Result<Flow, CpuError> {
        Ok(Flow::Halt)
    }

    fn op_ldi(&mut self, reg: u8, imm: u8) -> Result<Flow, CpuError> {
        self.registers.set(reg, imm)?;
        Ok(Flow::Continue)
    }

    fn op_prn(&mut self, reg: u8) -> Result<Flow, CpuError> {
        let value = self.registers.get(reg)?;
        writeln!(self.output, "{value}")
            .and_then(|_| self.output.flush())
            .map_err(|e| CpuError::OutputError {
                reason: e.to_string(),
            })?;
        Ok(Flow::Continue)
    }

    fn op_alu(&mut self, dest: u8, src: u8) -> Result<Flow, CpuError> {
        let op = AluOp::try_from(self.ir)?;
        alu::apply(&mut self.registers, op, dest, src)?;
        Ok(Flow::Continue)
    }

    fn op_cmp(&mut self, a: u8, b: u8) -> Result<Flow, CpuError> {
        let va = self.registers.get(a)?;
        let vb = self.registers.get(b)?;
        self.flags.set(Flag::compare(va, vb));
        Ok(Flow::Continue)
    }

    fn op_push(&mut self, reg: u8) -> Result<Flow, CpuError> {
        let value = self.registers.get(reg)?;
        self.push(value)?;
        Ok(Flow::Continue)
    }

    fn op_pop(&mut self, reg: u8) -> Result<Flow, CpuError> {
        // Validate the destination before touching the stack.
        self.registers.get(reg)?;
        let value = self.pop()?;
        self.registers.set(reg, value)?;
        Ok(Flow::Continue)
    }

    fn op_call(&mut self, reg: u8) -> Result<Flow, CpuError> {
        let target = self.registers.get(reg)?;
        let return_addr = Self::address(self.next_pc)?;
        self.push(return_addr)?;
        self.pc = target;
        Ok(Flow::Continue)
    }

    fn op_ret(&mut self) -> Result<Flow, CpuError> {
        self.pc = self.pop()?;
        Ok(Flow::Continue)
    }

    fn op_jmp(&mut self, reg: u8) -> Result<Flow, CpuError> {
        self.pc = self.registers.get(reg)?;
        Ok(Flow::Continue)
    }

    fn op_jeq(&mut self, reg: u8) -> Result<Flow, CpuError> {
        let taken = self.flags.is_equal();
        self.branch(taken, reg)
    }

    fn op_jne(&mut self, reg: u8) -> Result<Flow, CpuError> {
        let taken = !self.flags.is_equal();
        self.branch(taken, reg)
    }

    fn branch(&mut self, taken: bool, reg: u8) -> Result<Flow, CpuError> {
        let target = self.registers.get(reg)?;
        self.pc = if taken {
            target
        } else {
            Self::address(self.next_pc)?
        };
        Ok(Flow::Continue)
    }

    /// Renders the program counter, the three bytes at it and all registers.
    ///
    /// `TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4`; cells past the end of memory
    /// show as `--`.
    pub fn trace(&self) -> String {
        let pc = self.pc as usize;
        let cell = |address: usize| {
            self.memory
                .peek(address)
                .map_or_else(|| "--".to_string(), |byte| format!("{byte:02X}"))
        };
        let registers: Vec<String> = self
            .registers
            .values()
            .iter()
            .map(|value| format!("{value:02X}"))
            .collect();
        format!(
            "TRACE: {:02X} | {} {} {} | {}",
            self.pc,
            cell(pc),
            cell(pc + 1),
            cell(pc + 2),
            registers.join(" ")
        )
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Outcome of the last CMP, or `None` before the first one.
    pub fn flag(&self) -> Option<Flag> {
        self.flags.get()
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Returns the PRN output sink.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Consumes the CPU and returns the PRN output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}
