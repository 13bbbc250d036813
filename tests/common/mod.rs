use async_trait::async_trait;
use cosmo::{CosmoError, Dispatcher, ExecutionMode, ExecutionResult};

#[allow(dead_code)]
/// Runs `source` in external-call mode and returns the emitted commands.
pub fn commands(source: &str) -> Result<Vec<String>, CosmoError> {
    match cosmo::run(source, ExecutionMode::ExternalCall)? {
        ExecutionResult::Commands(commands) => Ok(commands),
        ExecutionResult::Environment(_) => panic!("external-call run returned an environment"),
    }
}

#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingDispatcher {
    pub said: Vec<String>,
    pub invoked: Vec<String>,
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn say(&mut self, text: &str) -> Result<(), String> {
        self.said.push(text.to_string());
        Ok(())
    }

    async fn invoke(&mut self, command: &str) -> Result<(), String> {
        self.invoked.push(command.to_string());
        Ok(())
    }
}
