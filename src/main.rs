//! LS-8 emulator.
//!
//! Loads an `.ls8` program and runs it until `HLT`.
//!
//! # Usage
//! ```text
//! ls8 <program.ls8> [OPTIONS]
//! ```
//!
//! # Options
//! - `--trace`: Log the machine state before every cycle (also enabled by `LS8_TRACE=1`)
//! - `--stack-size <bytes>`: Bytes reserved for the stack below `0xF4` (default 64)
//! - `--quiet`: Omit timestamps and level tags from log lines
//!
//! # Exit status
//! `0` on HLT, `1` on a usage error, `2` when the program cannot be loaded, `3` when
//! execution faults.

use ls8::cpu::config::{CpuConfig, DEFAULT_STACK_SIZE};
use ls8::cpu::errors::CpuError;
use ls8::cpu::loader::load_file;
use ls8::cpu::vm::{Cpu, CpuState};
use ls8::utils::log::{Level, SHOW_TIMESTAMP, SHOW_TYPE, set_max_level};
use ls8::{debug, error};
use std::env;
use std::io;
use std::process;
use std::sync::atomic::Ordering;

const EXIT_USAGE: i32 = 1;
const EXIT_LOAD: i32 = 2;
const EXIT_FAULT: i32 = 3;

const TRACE_ENV: &str = "LS8_TRACE";

const USAGE: &str = "\
Usage: {program} <program.ls8> [OPTIONS]

Options:
  --trace               Log the machine state before every cycle
  --stack-size <bytes>  Bytes reserved for the stack below 0xF4 (default 64)
  --quiet               Omit timestamps and level tags from log lines
  -h, --help            Show this message

Environment:
  LS8_TRACE=1           Same as --trace";

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { EXIT_USAGE } else { 0 });
    }

    let path = &args[1];
    let mut trace = env::var(TRACE_ENV).is_ok_and(|v| v == "1");
    let mut stack_size = DEFAULT_STACK_SIZE;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--trace" => {
                trace = true;
                i += 1;
            }
            "--stack-size" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--stack-size requires an argument");
                    process::exit(EXIT_USAGE);
                }
                stack_size = match parse_byte(&args[i]) {
                    Some(size) => size,
                    None => {
                        eprintln!("Invalid stack size: {}", args[i]);
                        process::exit(EXIT_USAGE);
                    }
                };
                i += 1;
            }
            "--quiet" => {
                SHOW_TIMESTAMP.store(false, Ordering::Relaxed);
                SHOW_TYPE.store(false, Ordering::Relaxed);
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                eprintln!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(EXIT_USAGE);
            }
        }
    }

    if trace {
        set_max_level(Level::Debug);
    }

    let config = CpuConfig {
        stack_size,
        trace,
        ..CpuConfig::default()
    };
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        process::exit(EXIT_USAGE);
    }

    let program = match load_file(path) {
        Ok(program) => program,
        Err(e) => {
            // The loader already printed a diagnostic for malformed lines.
            if !matches!(e, CpuError::InvalidBinaryLiteral { .. }) {
                error!("{e}");
            }
            process::exit(EXIT_LOAD);
        }
    };

    let mut cpu = match Cpu::with_program(&program, config, io::stdout()) {
        Ok(cpu) => cpu,
        Err(e) => {
            error!("{e}");
            process::exit(if e.is_load_error() {
                EXIT_LOAD
            } else {
                EXIT_USAGE
            });
        }
    };

    match cpu.run() {
        Ok(cycles) => {
            debug!("{} halted after {} cycles", path, cycles);
        }
        Err(e) => {
            report_fault(&cpu, &e);
            process::exit(EXIT_FAULT);
        }
    }
}

/// Logs a fault together with the machine state it left behind.
fn report_fault(cpu: &Cpu, err: &CpuError) {
    debug_assert_eq!(cpu.state(), CpuState::Faulted);
    error!("{err}");
    if let Ok(decoded) = cpu.decode_at(cpu.pc()) {
        error!("faulting instruction: {decoded}");
    }
    error!("{}", cpu.trace());
}

/// Parses a decimal or `0x`-prefixed byte.
fn parse_byte(text: &str) -> Option<u8> {
    match text.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
