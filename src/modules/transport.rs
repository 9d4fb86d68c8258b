//! Remote command execution.
//!
//! A [`Transport`] runs one command at a time on the remote machine and hands
//! back its exit status together with everything it printed. Mount setup only
//! ever talks to the remote side through this trait, which keeps the shell
//! protocol testable without a live connection.
//!
//! [`OpenSshSession`] is the implementation used by the binary. It drives the
//! system OpenSSH client, so authentication, host keys and connection sharing
//! come from the user's ssh configuration.

use super::constants::{CATEGORY, DEFAULT_SSH_PROGRAM};
use super::error::{MountError, Result};
use log::debug;
use std::io;
use std::process::{Child, Command, Stdio};

/// Outcome of a single remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit status of the remote process.
    pub exit_code: i32,
    /// Captured standard output, untouched.
    pub stdout: String,
    /// Captured standard error, untouched.
    pub stderr: String,
}

impl ExecOutput {
    /// Whether the remote process exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A channel able to execute commands on the remote machine.
///
/// Methods take `&mut self`: a session runs commands strictly one after the
/// other.
pub trait Transport: Send + 'static {
    /// Runs `command` remotely and waits for it to finish.
    ///
    /// A non-zero exit status is not an error at this level; only a failure to
    /// run the command at all is.
    fn exec(&mut self, command: &str) -> Result<ExecOutput>;
}

/// Session backed by the OpenSSH command line client.
#[derive(Debug, Clone)]
pub struct OpenSshSession {
    program: String,
    options: Vec<String>,
    destination: String,
}

impl OpenSshSession {
    /// Creates a session for `destination` (`[user@]host`).
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            program: DEFAULT_SSH_PROGRAM.to_string(),
            options: Vec::new(),
            destination: destination.into(),
        }
    }

    /// Uses a different ssh binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Appends extra arguments placed before the destination.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// The `[user@]host` this session connects to.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    fn command(&self, remote: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-T")
            .args(&self.options)
            .arg(&self.destination)
            .arg("--")
            .arg(remote);
        cmd
    }

    /// Starts `remote` with piped stdin and stdout and returns immediately.
    ///
    /// Used for long-lived channels such as the sshfs slave process.
    pub fn stream(&self, remote: &str) -> io::Result<Child> {
        debug!(target: CATEGORY, "Opening stream: {}", remote);
        self.command(remote)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
    }
}

impl Transport for OpenSshSession {
    fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        let output = self
            .command(command)
            .stdin(Stdio::null())
            .output()
            .map_err(MountError::Transport)?;

        Ok(ExecOutput {
            // Killed by a signal: no code, report as failure.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
