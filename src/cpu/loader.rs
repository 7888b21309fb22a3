//! Program loader.
//!
//! Converts `.ls8` program text into the bytes written to memory before execution.
//!
//! # Syntax
//!
//! ```text
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! ```
//!
//! - One byte per line, written as a base-2 literal of at most 8 significant bits
//! - An optional `0b` prefix and `_` digit separators are accepted
//! - Comments start with `#` and run to the end of the line
//! - Blank and comment-only lines are skipped

use crate::cpu::errors::CpuError;
use crate::error;
use std::fmt::Write;
use std::fs;
use std::path::Path;

const COMMENT_CHAR: char = '#';
const BINARY_PREFIX: &str = "0b";

/// A program ready to be loaded at address 0.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Formats a compiler-style diagnostic for a rejected program line.
fn render_load_diagnostic(file: &str, source: &str, line: usize, message: &str) -> String {
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {message}");
    let _ = writeln!(diag, " --> {file}:{line}");

    if let Some(raw_line) = source.lines().nth(line.saturating_sub(1)) {
        let line_text = raw_line.trim_end_matches('\r');
        let indent = line_text.len() - line_text.trim_start().len();
        let width = code_part(line_text).trim().len().max(1);
        let _ = writeln!(diag, "     |");
        let _ = writeln!(diag, "{:>4} | {}", line, line_text);
        let _ = writeln!(diag, "     | {}{}", " ".repeat(indent), "^".repeat(width));
    }

    diag
}

/// Returns the part of a line before any comment.
fn code_part(line: &str) -> &str {
    line.split(COMMENT_CHAR).next().unwrap_or_default()
}

/// Parses one binary literal into a byte.
pub(crate) fn parse_binary(token: &str) -> Option<u8> {
    let digits = token.strip_prefix(BINARY_PREFIX).unwrap_or(token);
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c == '0' || c == '1') {
        return None;
    }
    let value = u32::from_str_radix(&digits, 2).ok()?;
    u8::try_from(value).ok()
}

/// Parses program text into bytes.
///
/// Returns [`CpuError::InvalidBinaryLiteral`] for the first line that is not blank, not a
/// comment, and not a valid 8-bit binary literal.
pub fn parse_source(source: &str) -> Result<Program, CpuError> {
    let mut bytes = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let token = code_part(line).trim();
        if token.is_empty() {
            continue;
        }
        let byte = parse_binary(token).ok_or_else(|| CpuError::InvalidBinaryLiteral {
            line: index + 1,
            token: token.to_string(),
        })?;
        bytes.push(byte);
    }
    Ok(Program::from_bytes(bytes))
}

/// Parses source with an associated name, logging a diagnostic on failure.
fn parse_source_with_name(source: &str, source_name: &str) -> Result<Program, CpuError> {
    let result = parse_source(source);
    if let Err(err) = &result
        && let CpuError::InvalidBinaryLiteral { line, .. } = err
    {
        error!(
            "{}",
            render_load_diagnostic(source_name, source, *line, &err.to_string())
        );
    }
    result
}

/// Convenience: load a program directly from a file path.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Program, CpuError> {
    let path_ref = path.as_ref();
    let source = fs::read_to_string(path_ref).map_err(|e| CpuError::ProgramLoadError {
        path: path_ref.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_source_with_name(&source, &path_ref.display().to_string())
}
