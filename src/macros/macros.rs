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
use crate::error::error::RunError;
use crate::interpreter::interpreter::SAY_DIRECTIVE;
use async_trait::async_trait;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

pub const WAIT_DIRECTIVE: &str = "wait";

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Wait(Duration),
    Say(String),
    /// Any other command, already carrying the configured prefix.
    Invoke(String),
}

/// Receiver for replayed macro commands.
#[async_trait]
pub trait Dispatcher: Send {
    async fn say(&mut self, text: &str) -> Result<(), String>;
    async fn invoke(&mut self, command: &str) -> Result<(), String>;
}

/// Writes `say` text and invoked commands to stdout.
pub struct ConsoleDispatcher;

#[async_trait]
impl Dispatcher for ConsoleDispatcher {
    async fn say(&mut self, text: &str) -> Result<(), String> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text).map_err(|e| e.to_string())
    }

    async fn invoke(&mut self, command: &str) -> Result<(), String> {
        info!(command, "no command dispatcher attached, echoing");
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "> {}", command).map_err(|e| e.to_string())
    }
}

/// Splits comma-separated macro text into trimmed, non-empty entries.
pub fn split_macro(text: &str) -> Vec<String> {
    text.split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct MacroRunner {
    prefix: String,
    timeout: Duration,
}

impl MacroRunner {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(MacroRunner {
            prefix: config.prefix.clone(),
            timeout: config.macro_timeout(),
        })
    }

    pub fn parse_directive(&self, entry: &str) -> Result<Directive, RunError> {
        let entry = entry.trim();
        let (head, rest) = entry
            .split_once(char::is_whitespace)
            .map(|(head, rest)| (head, rest.trim_start()))
            .unwrap_or((entry, ""));

        if head.eq_ignore_ascii_case(WAIT_DIRECTIVE) {
            let seconds = rest.split_whitespace().next().unwrap_or("");
            let invalid = |reason: &str| RunError::InvalidMacro {
                input: entry.to_string(),
                reason: reason.to_string(),
            };
            let seconds: f64 = seconds
                .parse()
                .map_err(|_| invalid("wait needs a number of seconds"))?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(invalid("wait needs a non-negative number of seconds"));
            }
            // Waits past what a Duration holds still end at the macro deadline.
            let duration = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX);
            Ok(Directive::Wait(duration))
        } else if head.eq_ignore_ascii_case(SAY_DIRECTIVE) {
            Ok(Directive::Say(rest.to_string()))
        } else {
            Ok(Directive::Invoke(format!("{}{}", self.prefix, entry)))
        }
    }

    pub async fn run_text(
        &self,
        text: &str,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<(), RunError> {
        self.run_commands(&split_macro(text), dispatcher).await
    }

    /// Runs every command in order under the macro deadline; the first
    /// failure stops the rest.
    pub async fn run_commands(
        &self,
        commands: &[String],
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<(), RunError> {
        let replay = async {
            for command in commands.iter().filter(|c| !c.trim().is_empty()) {
                let directive = self.parse_directive(command)?;
                debug!(?directive, "running macro command");
                let outcome = match &directive {
                    Directive::Wait(duration) => {
                        tokio::time::sleep(*duration).await;
                        Ok(())
                    }
                    Directive::Say(text) => dispatcher.say(text).await,
                    Directive::Invoke(command) => dispatcher.invoke(command).await,
                };
                outcome.map_err(|reason| RunError::Dispatch {
                    input: command.clone(),
                    reason,
                })?;
            }
            Ok::<(), RunError>(())
        };

        tokio::time::timeout(self.timeout, replay)
            .await
            .map_err(|_| RunError::Timeout {
                seconds: self.timeout.as_secs_f64(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    #[async_trait]
    impl Dispatcher for Recorder {
        async fn say(&mut self, text: &str) -> Result<(), String> {
            self.events.push(format!("say:{}", text));
            Ok(())
        }

        async fn invoke(&mut self, command: &str) -> Result<(), String> {
            if command.ends_with("explode") {
                return Err("no such command".to_string());
            }
            self.events.push(format!("invoke:{}", command));
            Ok(())
        }
    }

    fn runner() -> MacroRunner {
        MacroRunner::new(&Config::default()).unwrap()
    }

    #[test]
    fn splits_and_trims_entries() {
        assert_eq!(
            split_macro(" help, wait 5 ,, version "),
            vec!["help".to_string(), "wait 5".to_string(), "version".to_string()]
        );
    }

    #[test]
    fn directives_are_case_insensitive() {
        let runner = runner();
        assert_eq!(
            runner.parse_directive("WAIT 1.5").unwrap(),
            Directive::Wait(Duration::from_millis(1500))
        );
        assert_eq!(
            runner.parse_directive("Say hello there").unwrap(),
            Directive::Say("hello there".to_string())
        );
        assert_eq!(
            runner.parse_directive("dmuser itchono hi").unwrap(),
            Directive::Invoke("$c dmuser itchono hi".to_string())
        );
    }

    #[test]
    fn wait_needs_seconds() {
        for entry in ["wait", "wait soon", "wait -1"] {
            assert!(matches!(
                runner().parse_directive(entry),
                Err(RunError::InvalidMacro { .. })
            ));
        }
    }

    #[test]
    fn huge_waits_saturate() {
        assert_eq!(
            runner().parse_directive("wait 1e20").unwrap(),
            Directive::Wait(Duration::MAX)
        );
    }

    #[tokio::test]
    async fn huge_waits_end_at_the_deadline() {
        let config = Config {
            macro_timeout_secs: 0.05,
            ..Config::default()
        };
        let mut recorder = Recorder::default();
        let error = MacroRunner::new(&config)
            .unwrap()
            .run_text("say a, wait 1e20, say b", &mut recorder)
            .await
            .unwrap_err();
        assert!(matches!(error, RunError::Timeout { .. }));
        assert_eq!(recorder.events, vec!["say:a".to_string()]);
    }

    #[test]
    fn runner_rejects_an_unvalidated_config() {
        let config = Config {
            macro_timeout_secs: -1.0,
            ..Config::default()
        };
        assert!(matches!(MacroRunner::new(&config), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn replays_in_order() {
        let mut recorder = Recorder::default();
        runner()
            .run_text("say hi, wait 0, version", &mut recorder)
            .await
            .unwrap();
        assert_eq!(
            recorder.events,
            vec!["say:hi".to_string(), "invoke:$c version".to_string()]
        );
    }

    #[tokio::test]
    async fn commands_keep_embedded_commas() {
        let mut recorder = Recorder::default();
        runner()
            .run_commands(&["say a, b".to_string()], &mut recorder)
            .await
            .unwrap();
        assert_eq!(recorder.events, vec!["say:a, b".to_string()]);
    }

    #[tokio::test]
    async fn first_failure_stops_the_macro() {
        let mut recorder = Recorder::default();
        let error = runner()
            .run_text("say one, explode, say two", &mut recorder)
            .await
            .unwrap_err();
        assert!(matches!(error, RunError::Dispatch { ref input, .. } if input == "explode"));
        assert_eq!(recorder.events, vec!["say:one".to_string()]);
    }

    #[tokio::test]
    async fn long_waits_hit_the_deadline() {
        let config = Config {
            macro_timeout_secs: 0.05,
            ..Config::default()
        };
        let mut recorder = Recorder::default();
        let error = MacroRunner::new(&config)
            .unwrap()
            .run_text("say start, wait 10, say never", &mut recorder)
            .await
            .unwrap_err();
        assert!(matches!(error, RunError::Timeout { .. }));
        assert_eq!(recorder.events, vec!["say:start".to_string()]);
    }
}
