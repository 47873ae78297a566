use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collector::traits::CommandRunner;
use crate::error::Error;

/// Canned result for one command line.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// Command succeeds with this standard output.
    Output(String),
    /// Command succeeds with raw (possibly non-UTF-8) output.
    Bytes(Vec<u8>),
    /// Shell reports the command as missing.
    NotFound,
    /// Command exits with this status.
    Exit(i32),
}

/// Command runner that answers from a table instead of spawning processes.
///
/// Unknown commands behave like missing binaries. Call counters are shared
/// handles so tests can inspect them after the runner has been moved.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    responses: HashMap<String, MockResponse>,
    programs: HashSet<String>,
    runs: Arc<AtomicUsize>,
    probes: Arc<AtomicUsize>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `program` as installed, so probes for it succeed.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.programs.insert(program.into());
        self
    }

    /// Answers `command` with `stdout`.
    pub fn with_output(mut self, command: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.responses
            .insert(command.into(), MockResponse::Output(stdout.into()));
        self
    }

    pub fn with_response(mut self, command: impl Into<String>, response: MockResponse) -> Self {
        self.responses.insert(command.into(), response);
        self
    }

    pub fn set_response(&mut self, command: impl Into<String>, response: MockResponse) {
        self.responses.insert(command.into(), response);
    }

    /// Simulates uninstalling `program` mid-run.
    pub fn remove_program(&mut self, program: &str) {
        self.programs.remove(program);
        self.responses
            .retain(|command, _| command.split_whitespace().next() != Some(program));
    }

    /// Handle counting `run` calls.
    pub fn run_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }

    /// Handle counting `probe` calls.
    pub fn probe_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.probes)
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &str) -> Result<Vec<u8>, Error> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(command) {
            Some(MockResponse::Output(text)) => Ok(text.clone().into_bytes()),
            Some(MockResponse::Bytes(bytes)) => Ok(bytes.clone()),
            Some(MockResponse::Exit(code)) => Err(Error::CommandFailed {
                command: command.to_string(),
                code: Some(*code),
                stderr: String::new(),
            }),
            Some(MockResponse::NotFound) | None => Err(Error::CommandNotFound {
                command: command.to_string(),
            }),
        }
    }

    fn probe(&self, program: &str) -> Result<bool, Error> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.programs.contains(program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_answers_table() {
        let runner = MockRunner::new().with_output("nvidia-smi -q", "0, 1\n");
        assert_eq!(runner.run("nvidia-smi -q").unwrap(), b"0, 1\n");
        assert!(matches!(
            runner.run("rocm-smi").unwrap_err(),
            Error::CommandNotFound { .. }
        ));
        assert_eq!(runner.run_counter().load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mock_runner_remove_program() {
        let mut runner = MockRunner::new()
            .with_program("rocm-smi")
            .with_output("rocm-smi --showuse --csv", "device,GPU use (%)\n");
        runner.remove_program("rocm-smi");
        assert!(!runner.probe("rocm-smi").unwrap());
        assert!(runner.run("rocm-smi --showuse --csv").is_err());
    }
}
