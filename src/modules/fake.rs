//! Scripted transport for tests.

use super::error::Result;
use super::transport::{ExecOutput, Transport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Answers commands from a table and records every command it receives.
///
/// Commands without a scripted answer fail with status 127, so a test notices
/// any command it did not expect.
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: HashMap<String, ExecOutput>,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `command` to succeed and print `stdout` verbatim.
    pub fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            ExecOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    /// Scripts a string lookup: the sentinel-wrapped form of `command` yields
    /// `value` the way the remote `echo` would print it.
    pub fn string(self, command: &str, value: &str) -> Self {
        let wrapped = format!("echo `{}`-", command);
        let printed = format!("{}-\n", value);
        self.respond(&wrapped, &printed)
    }

    /// Scripts `command` to exit with `code` and print `stderr`.
    pub fn fail(mut self, command: &str, code: i32, stderr: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            ExecOutput {
                exit_code: code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Shared view of the command log, still readable after the transport has
    /// been moved elsewhere.
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }
}

impl Transport for FakeTransport {
    fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        self.log.lock().push(command.to_string());
        Ok(self
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| ExecOutput {
                exit_code: 127,
                stdout: String::new(),
                stderr: format!("unexpected command: {}", command),
            }))
    }
}
