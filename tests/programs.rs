use ls8::cpu::config::CpuConfig;
use ls8::cpu::errors::CpuError;
use ls8::cpu::loader::{Program, load_file, parse_source};
use ls8::cpu::vm::{Cpu, CpuState};
use std::path::PathBuf;

fn program_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("programs")
        .join(name)
}

fn run(program: &Program) -> (Cpu<Vec<u8>>, Result<u64, CpuError>) {
    let mut cpu = Cpu::with_program(program, CpuConfig::default(), Vec::new()).unwrap();
    let result = cpu.run();
    (cpu, result)
}

fn run_file(name: &str) -> String {
    let program = load_file(program_path(name)).unwrap();
    let (cpu, result) = run(&program);
    result.unwrap();
    assert_eq!(cpu.state(), CpuState::Halted);
    String::from_utf8(cpu.into_output()).unwrap()
}

#[test]
fn print8() {
    assert_eq!(run_file("print8.ls8"), "8\n");
}

#[test]
fn mult() {
    assert_eq!(run_file("mult.ls8"), "72\n");
}

#[test]
fn stack() {
    assert_eq!(run_file("stack.ls8"), "3\n2\n1\n");
}

#[test]
fn call() {
    assert_eq!(run_file("call.ls8"), "20\n");
}

#[test]
fn countdown() {
    assert_eq!(run_file("countdown.ls8"), "3\n2\n1\n");
}

#[test]
fn sctest() {
    assert_eq!(run_file("sctest.ls8"), "1\n");
}

#[test]
fn malformed_program_is_rejected_before_running() {
    let err = parse_source("10000010\n00000000\n2\n").unwrap_err();
    assert!(matches!(err, CpuError::InvalidBinaryLiteral { line: 3, .. }));
    assert!(err.is_load_error());
}

#[test]
fn fault_leaves_state_for_inspection() {
    // LDI R0,42 then an undefined opcode
    let program = parse_source("10000010\n00000000\n00101010\n11111111\n").unwrap();
    let (cpu, result) = run(&program);
    assert!(matches!(
        result,
        Err(CpuError::UnknownInstruction { opcode: 0xFF, pc: 3 })
    ));
    assert_eq!(cpu.state(), CpuState::Faulted);
    assert_eq!(cpu.registers().get(0).unwrap(), 42);
    assert_eq!(
        cpu.trace(),
        "TRACE: 03 | FF 00 00 | 2A 00 00 00 00 00 00 F4"
    );
}
