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

use crate::config::config::{Config, ConfigError};
use crate::environment::environment::Environment;
use crate::error::error::{CosmoError, RunError};
use crate::interpreter::interpreter::{ExecutionMode, ExecutionResult, Interpreter, Output};
use crate::lexer::lexer::Lexer;
use crate::macros::macros::{Dispatcher, MacroRunner};
use crate::parser::parser::Parser;
use crate::utilities::utilities::{Program, SourceText};
use glob::glob;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Calling layer around the language core: compiles scripts, runs them
/// against a deadline and replays their commands through the macro runner.
pub struct Executor {
    config: Config,
    macros: MacroRunner,
}

impl Executor {
    /// Fails when `config` holds timeouts that [`Config::validate`] rejects.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let macros = MacroRunner::new(&config)?;
        Ok(Executor { config, macros })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tokenizes and parses without touching the declaration. Every static
    /// error surfaces here, before anything runs.
    pub fn compile(source: &str) -> Result<(Environment, Program), CosmoError> {
        let source = Lexer::new(source.to_string()).tokenize()?;
        Self::build(source)
    }

    /// Like [`Executor::compile`], with call-site arguments bound to the
    /// declared parameters in order.
    pub fn compile_with_arguments(
        source: &str,
        args: &[String],
    ) -> Result<(Environment, Program), CosmoError> {
        let source = Lexer::new(source.to_string()).tokenize()?;
        let (mut environment, program) = Self::build(source)?;
        environment.inject_arguments(args)?;
        Ok((environment, program))
    }

    fn build(source: SourceText) -> Result<(Environment, Program), CosmoError> {
        let environment = Environment::extract(&source)?;
        let program = Parser::new(source.lines).parse()?;
        Ok((environment, program))
    }

    fn prepare(
        source: &str,
        args: Option<&[String]>,
    ) -> Result<(Environment, Program), CosmoError> {
        match args {
            Some(args) => Self::compile_with_arguments(source, args),
            None => Self::compile(source),
        }
    }

    /// Runs in external-call mode and returns the emitted commands. `args`,
    /// when given, must supply one value per declared parameter.
    pub async fn run_script(
        &self,
        source: &str,
        args: Option<&[String]>,
    ) -> Result<Vec<String>, RunError> {
        let (environment, program) = Self::prepare(source, args)?;
        match self
            .execute(environment, program, ExecutionMode::ExternalCall)
            .await?
        {
            ExecutionResult::Commands(commands) => Ok(commands),
            ExecutionResult::Environment(_) => Err(RunError::Worker(
                "external-call run returned an environment".to_string(),
            )),
        }
    }

    /// Runs in direct mode; PRINT goes to `output`. Returns the final bindings.
    pub async fn run_direct(
        &self,
        source: &str,
        args: Option<&[String]>,
        output: Box<dyn Output>,
    ) -> Result<Environment, RunError> {
        let (environment, program) = Self::prepare(source, args)?;
        match self
            .execute(environment, program, ExecutionMode::Direct(output))
            .await?
        {
            ExecutionResult::Environment(environment) => Ok(environment),
            ExecutionResult::Commands(_) => Err(RunError::Worker(
                "direct run returned commands".to_string(),
            )),
        }
    }

    /// Runs the script and replays everything it emitted through `dispatcher`.
    pub async fn run_and_replay(
        &self,
        source: &str,
        args: Option<&[String]>,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<(), RunError> {
        let commands = self.run_script(source, args).await?;
        self.macros.run_commands(&commands, dispatcher).await
    }

    pub async fn run_macro(&self, text: &str, dispatcher: &mut dyn Dispatcher) -> Result<(), RunError> {
        self.macros.run_text(text, dispatcher).await
    }

    async fn execute(
        &self,
        environment: Environment,
        program: Program,
        mode: ExecutionMode,
    ) -> Result<ExecutionResult, RunError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        info!(statements = program.len(), "running script");

        let result = run_blocking_with_deadline(self.config.interp_timeout(), cancelled, move || {
            Interpreter::new(environment, mode)
                .with_cancellation(flag)
                .run(&program)
        })
        .await?;
        Ok(result?)
    }

    pub fn load_script(&self, path: &Path) -> Result<String, RunError> {
        let extension = &self.config.script_extension;
        if path.extension().and_then(|e| e.to_str()) != Some(extension.as_str()) {
            return Err(RunError::NotAScript {
                path: path.to_path_buf(),
                extension: extension.clone(),
            });
        }
        debug!(path = %path.display(), "loading script");
        std::fs::read_to_string(path).map_err(|source| RunError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Expands `~`, environment variables and wildcards. A pattern matching
    /// nothing is returned as-is so the caller reports the missing file.
    pub fn expand_scripts(&self, pattern: &str) -> Vec<PathBuf> {
        let expanded = shellexpand::full(pattern)
            .map(|expanded| expanded.into_owned())
            .unwrap_or_else(|_| pattern.to_string());
        let matches: Vec<PathBuf> = match glob(&expanded) {
            Ok(paths) => paths.filter_map(Result::ok).collect(),
            Err(_) => Vec::new(),
        };
        if matches.is_empty() {
            vec![PathBuf::from(expanded)]
        } else {
            matches
        }
    }
}

/// Races `work` against `limit`.
pub async fn with_deadline<F, T>(limit: Duration, work: F) -> Result<T, RunError>
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| RunError::Timeout {
            seconds: limit.as_secs_f64(),
        })
}

/// Runs `work` on the blocking pool under `limit`. On expiry `cancelled`
/// is raised so a cooperative worker stops at its next check; the worker
/// itself is left to finish on its own.
pub async fn run_blocking_with_deadline<F, T>(
    limit: Duration,
    cancelled: Arc<AtomicBool>,
    work: F,
) -> Result<T, RunError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let outcome = with_deadline(limit, tokio::task::spawn_blocking(work)).await;
    if matches!(outcome, Err(RunError::Timeout { .. })) {
        cancelled.store(true, Ordering::Relaxed);
        warn!(seconds = limit.as_secs_f64(), "script timed out, cancelling");
    }
    outcome?.map_err(|e| RunError::Worker(e.to_string()))
}
