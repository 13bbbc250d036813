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

//! Cosmo: a line-oriented scripting language.
//!
//! ```text
//! [hello, there]
//! SET hi 3
//! ADD hi 6 2
//! PRINT &hi
//! ```
//!
//! The first line declares parameters; every following line is one
//! `SET`, `ADD` or `PRINT` statement. `&name` dereferences a variable.

pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod utilities;

pub use crate::config::config::{Config, ConfigError};
pub use crate::environment::environment::Environment;
pub use crate::error::error::{CosmoError, RunError};
pub use crate::executor::executor::Executor;
pub use crate::interpreter::interpreter::{
    CapturedOutput, ExecutionMode, ExecutionResult, Interpreter, Output, StdoutOutput,
};
pub use crate::macros::macros::{ConsoleDispatcher, Dispatcher, MacroRunner};
pub use crate::utilities::utilities::{Program, Statement, StatementKind, Value};

/// Compiles and runs `source` synchronously with no deadline.
pub fn run(source: &str, mode: ExecutionMode) -> Result<ExecutionResult, CosmoError> {
    let (environment, program) = Executor::compile(source)?;
    Interpreter::new(environment, mode).run(&program)
}
