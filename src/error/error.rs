// Copyright (C) 2024 Bellande Architecture Mechanism Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the language core. Line numbers are 1-based source
/// lines, counting the declaration line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CosmoError {
    #[error("program is empty")]
    EmptyProgram,

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: malformed environment declaration: {reason}")]
    MalformedEnvironment { line: usize, reason: String },

    #[error("expected {} argument(s) ({}), got {got}", .expected.len(), .expected.join(", "))]
    ArgumentCount { expected: Vec<String>, got: usize },

    #[error("line {line}: unknown opcode `{opcode}`")]
    UnknownOpcode { line: usize, opcode: String },

    #[error("line {line}: {opcode} expects {expected} operand(s), got {got}")]
    Arity {
        line: usize,
        opcode: String,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: {opcode} has malformed operand `{operand}`")]
    MalformedOperand {
        line: usize,
        opcode: String,
        operand: String,
    },

    #[error("line {line}: {opcode} references undefined variable `{name}`")]
    UndefinedVariable {
        line: usize,
        opcode: String,
        name: String,
    },

    #[error("line {line}: {opcode} type mismatch: {detail}")]
    TypeMismatch {
        line: usize,
        opcode: String,
        detail: String,
    },

    #[error("line {line}: {opcode} interpreter invariant violated: {detail}")]
    InterpreterInvariant {
        line: usize,
        opcode: String,
        detail: String,
    },

    #[error("line {line}: {opcode} output failed: {reason}")]
    Output {
        line: usize,
        opcode: String,
        reason: String,
    },

    #[error("line {line}: execution cancelled")]
    Cancelled { line: usize },
}

impl CosmoError {
    pub fn line(&self) -> Option<usize> {
        match self {
            CosmoError::EmptyProgram | CosmoError::ArgumentCount { .. } => None,
            CosmoError::UnterminatedString { line }
            | CosmoError::MalformedEnvironment { line, .. }
            | CosmoError::UnknownOpcode { line, .. }
            | CosmoError::Arity { line, .. }
            | CosmoError::MalformedOperand { line, .. }
            | CosmoError::UndefinedVariable { line, .. }
            | CosmoError::TypeMismatch { line, .. }
            | CosmoError::InterpreterInvariant { line, .. }
            | CosmoError::Output { line, .. }
            | CosmoError::Cancelled { line } => Some(*line),
        }
    }

    pub fn opcode(&self) -> Option<&str> {
        match self {
            CosmoError::UnknownOpcode { opcode, .. }
            | CosmoError::Arity { opcode, .. }
            | CosmoError::MalformedOperand { opcode, .. }
            | CosmoError::UndefinedVariable { opcode, .. }
            | CosmoError::TypeMismatch { opcode, .. }
            | CosmoError::InterpreterInvariant { opcode, .. }
            | CosmoError::Output { opcode, .. } => Some(opcode),
            _ => None,
        }
    }

    /// Errors detected before any statement runs.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            CosmoError::EmptyProgram
                | CosmoError::UnterminatedString { .. }
                | CosmoError::MalformedEnvironment { .. }
                | CosmoError::ArgumentCount { .. }
                | CosmoError::UnknownOpcode { .. }
                | CosmoError::Arity { .. }
                | CosmoError::MalformedOperand { .. }
        )
    }
}

/// Failures raised by the calling layer around the core: script loading,
/// deadlines and macro replay.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Cosmo(#[from] CosmoError),

    #[error("execution timed out after {seconds} seconds")]
    Timeout { seconds: f64 },

    #[error("input `{input}` could not be processed: {reason}")]
    InvalidMacro { input: String, reason: String },

    #[error("input `{input}` failed: {reason}")]
    Dispatch { input: String, reason: String },

    #[error("script worker failed: {0}")]
    Worker(String),

    #[error("not a .{extension} script: {}", .path.display())]
    NotAScript { path: PathBuf, extension: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn arity_message_names_counts_and_line() {
        let error = CosmoError::Arity {
            line: 2,
            opcode: "ADD".to_string(),
            expected: 3,
            got: 2,
        };
        assert_eq!(error.to_string(), "line 2: ADD expects 3 operand(s), got 2");
        assert_eq!(error.line(), Some(2));
        assert_eq!(error.opcode(), Some("ADD"));
        assert!(error.is_static());
    }

    #[test]
    fn argument_count_lists_parameters() {
        let error = CosmoError::ArgumentCount {
            expected: vec!["x".to_string(), "y".to_string()],
            got: 1,
        };
        assert_eq!(error.to_string(), "expected 2 argument(s) (x, y), got 1");
        assert_eq!(error.line(), None);
    }

    #[test]
    fn run_errors_wrap_core_errors_transparently() {
        let error = RunError::from(CosmoError::EmptyProgram);
        assert_eq!(error.to_string(), "program is empty");
        let timeout = RunError::Timeout { seconds: 2.5 };
        assert_eq!(timeout.to_string(), "execution timed out after 2.5 seconds");
    }
}
