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

use crate::environment::environment::Environment;
use crate::error::error::CosmoError;
use crate::utilities::utilities::{Operand, Program, Statement, StatementKind, Value};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace, warn};

/// Directive prefix for PRINT output captured in external-call mode.
pub const SAY_DIRECTIVE: &str = "say";

/// Send primitive used by PRINT in direct mode.
pub trait Output: Send {
    fn send(&mut self, text: &str) -> io::Result<()>;
}

pub struct StdoutOutput;

impl Output for StdoutOutput {
    fn send(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()
    }
}

/// Collects sent lines; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer poisoned by a panicking writer still returns what it holds.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Output for CapturedOutput {
    fn send(&mut self, text: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }
}

pub enum ExecutionMode {
    /// PRINT sends straight through the given output.
    Direct(Box<dyn Output>),
    /// PRINT is recorded as a `say <text>` command for a later dispatcher.
    ExternalCall,
}

impl ExecutionMode {
    pub fn is_external_call(&self) -> bool {
        matches!(self, ExecutionMode::ExternalCall)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Environment(Environment),
    Commands(Vec<String>),
}

pub struct Interpreter {
    environment: Environment,
    mode: ExecutionMode,
    commands: Vec<String>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl Interpreter {
    pub fn new(environment: Environment, mode: ExecutionMode) -> Self {
        Interpreter {
            environment,
            mode,
            commands: Vec::new(),
            cancelled: None,
        }
    }

    /// The flag is checked before each statement; once set the run stops.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    /// Bindings as of the last executed statement, including after a failure.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn run(&mut self, program: &Program) -> Result<ExecutionResult, CosmoError> {
        for statement in program.iter() {
            if self.is_cancelled() {
                warn!(line = statement.line, "execution cancelled");
                return Err(CosmoError::Cancelled {
                    line: statement.line,
                });
            }
            trace!(line = statement.line, statement = %statement, "executing");
            self.execute_statement(statement)?;
        }

        debug!(
            statements = program.len(),
            commands = self.commands.len(),
            "program finished"
        );
        if self.mode.is_external_call() {
            Ok(ExecutionResult::Commands(std::mem::take(&mut self.commands)))
        } else {
            Ok(ExecutionResult::Environment(self.environment.clone()))
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<(), CosmoError> {
        match &statement.kind {
            StatementKind::Set { dest, value } => {
                let value = self.resolve(statement, value)?;
                self.environment.bind(dest.clone(), value);
            }
            StatementKind::Add { dest, lhs, rhs } => {
                let lhs = self.resolve(statement, lhs)?;
                let rhs = self.resolve(statement, rhs)?;
                let sum = add(statement, &lhs, &rhs)?;
                self.environment.bind(dest.clone(), sum);
            }
            StatementKind::Print { expr } => {
                let text = self.resolve(statement, expr)?.to_string();
                self.emit(statement, text)?;
            }
        }
        Ok(())
    }

    fn emit(&mut self, statement: &Statement, text: String) -> Result<(), CosmoError> {
        match &mut self.mode {
            ExecutionMode::ExternalCall => {
                self.commands.push(format!("{} {}", SAY_DIRECTIVE, text));
                Ok(())
            }
            ExecutionMode::Direct(output) => {
                output.send(&text).map_err(|e| CosmoError::Output {
                    line: statement.line,
                    opcode: statement.opcode().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn resolve(&self, statement: &Statement, operand: &Operand) -> Result<Value, CosmoError> {
        match operand {
            Operand::Reference(name) => self.environment.lookup(name).cloned().ok_or_else(|| {
                CosmoError::UndefinedVariable {
                    line: statement.line,
                    opcode: statement.opcode().to_string(),
                    name: name.clone(),
                }
            }),
            Operand::Literal(Value::Unbound) => Err(CosmoError::InterpreterInvariant {
                line: statement.line,
                opcode: statement.opcode().to_string(),
                detail: "literal operand holds the unbound sentinel".to_string(),
            }),
            Operand::Literal(value) => Ok(value.clone()),
        }
    }
}

/// Integer addition when both sides are integers, float addition otherwise.
fn add(statement: &Statement, lhs: &Value, rhs: &Value) -> Result<Value, CosmoError> {
    let mismatch = |detail: String| CosmoError::TypeMismatch {
        line: statement.line,
        opcode: statement.opcode().to_string(),
        detail,
    };

    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| mismatch(format!("integer overflow adding {} and {}", a, b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        _ => Err(mismatch(format!(
            "cannot add {} `{}` and {} `{}`",
            lhs.type_name(),
            lhs,
            rhs.type_name(),
            rhs
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lexer::tokenize;
    use crate::parser::parser::Parser;
    use pretty_assertions::assert_eq;

    fn compile(text: &str) -> (Environment, Program) {
        let source = tokenize(text).unwrap();
        let environment = Environment::extract(&source).unwrap();
        let program = Parser::new(source.lines).parse().unwrap();
        (environment, program)
    }

    fn run_external(text: &str) -> Result<Vec<String>, CosmoError> {
        let (environment, program) = compile(text);
        match Interpreter::new(environment, ExecutionMode::ExternalCall).run(&program)? {
            ExecutionResult::Commands(commands) => Ok(commands),
            ExecutionResult::Environment(_) => panic!("expected commands"),
        }
    }

    #[test]
    fn add_rebinds_before_print() {
        let commands = run_external("[hello, there]\nSET hi 3\nADD hi 6 2\nPRINT &hi").unwrap();
        assert_eq!(commands, vec!["say 8".to_string()]);
    }

    #[test]
    fn integer_and_float_sums() {
        let commands =
            run_external("[]\nSET a 3\nSET b 2\nADD c &a &b\nPRINT &c\nSET a 3.5\nADD c &a &b\nPRINT &c")
                .unwrap();
        assert_eq!(commands, vec!["say 5".to_string(), "say 5.5".to_string()]);
    }

    #[test]
    fn direct_mode_sends_through_output_and_returns_environment() {
        let (environment, program) = compile("[]\nSET x 5\nPRINT &x\nPRINT \"all done\"");
        let output = CapturedOutput::new();
        let mode = ExecutionMode::Direct(Box::new(output.clone()));
        let result = Interpreter::new(environment, mode).run(&program).unwrap();

        assert_eq!(output.lines(), vec!["5".to_string(), "all done".to_string()]);
        match result {
            ExecutionResult::Environment(environment) => {
                assert_eq!(environment.lookup("x"), Some(&Value::Int(5)));
            }
            ExecutionResult::Commands(_) => panic!("expected environment"),
        }
    }

    #[test]
    fn captured_output_survives_a_poisoned_lock() {
        let mut output = CapturedOutput::new();
        output.send("before").unwrap();
        let shared = output.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.lines.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(output.lines.is_poisoned());

        output.send("after").unwrap();
        assert_eq!(output.lines(), vec!["before".to_string(), "after".to_string()]);
    }

    #[test]
    fn undefined_variable_names_the_missing_binding() {
        let error = run_external("[a]\nPRINT &b").unwrap_err();
        assert_eq!(
            error,
            CosmoError::UndefinedVariable {
                line: 2,
                opcode: "PRINT".to_string(),
                name: "b".to_string(),
            }
        );
    }

    #[test]
    fn unbound_parameters_cannot_be_dereferenced() {
        let error = run_external("[a]\nPRINT &a").unwrap_err();
        assert!(matches!(error, CosmoError::UndefinedVariable { ref name, .. } if name == "a"));
    }

    #[test]
    fn failures_keep_earlier_mutations() {
        let (environment, program) = compile("[]\nSET a 1\nSET s word\nADD b &a &s\nSET c 3");
        let mut interpreter = Interpreter::new(environment, ExecutionMode::ExternalCall);
        let error = interpreter.run(&program).unwrap_err();

        assert!(matches!(error, CosmoError::TypeMismatch { line: 4, .. }));
        assert_eq!(interpreter.environment().lookup("a"), Some(&Value::Int(1)));
        assert_eq!(interpreter.environment().lookup("c"), None);
    }

    #[test]
    fn integer_overflow_is_a_type_mismatch() {
        let error = run_external(&format!("[]\nADD a {} 1", i64::MAX)).unwrap_err();
        assert!(matches!(error, CosmoError::TypeMismatch { line: 2, .. }));
    }

    #[test]
    fn cancellation_stops_before_the_next_statement() {
        let (environment, program) = compile("[]\nSET a 1\nPRINT &a");
        let flag = Arc::new(AtomicBool::new(true));
        let mut interpreter =
            Interpreter::new(environment, ExecutionMode::ExternalCall).with_cancellation(flag);
        assert_eq!(
            interpreter.run(&program).unwrap_err(),
            CosmoError::Cancelled { line: 2 }
        );
        assert!(interpreter.environment().is_empty());
    }

    #[test]
    fn unbound_literals_violate_an_invariant() {
        let program = Program {
            statements: vec![Statement {
                line: 2,
                kind: StatementKind::Print {
                    expr: Operand::Literal(Value::Unbound),
                },
            }],
        };
        let error = Interpreter::new(Environment::new(), ExecutionMode::ExternalCall)
            .run(&program)
            .unwrap_err();
        assert!(matches!(error, CosmoError::InterpreterInvariant { line: 2, .. }));
    }
}
