//! Running commands on the remote machine.
//!
//! Everything mount setup learns about the remote side goes through the three
//! helpers here: [`run_cmd`] for plain commands, [`run_string_cmd`] for lookups
//! whose value may end in whitespace, and [`check_tool_exists`] for the
//! up-front capability probe.

use super::constants::{CATEGORY, STRING_SENTINEL};
use super::error::{MountError, Result};
use super::transport::{ExecOutput, Transport};
use log::{debug, warn};

/// Runs `cmd` once and returns its raw standard output.
///
/// On a non-zero exit `on_error` decides what happens: returning an error
/// aborts, returning `Ok(())` lets the captured output through anyway.
pub fn run_cmd_with<T, F>(session: &mut T, cmd: &str, on_error: F) -> Result<String>
where
    T: Transport + ?Sized,
    F: FnOnce(&ExecOutput) -> Result<()>,
{
    debug!(target: CATEGORY, "Running remote command: {}", cmd);
    let output = session.exec(cmd)?;
    if !output.success() {
        on_error(&output)?;
    }
    Ok(output.stdout)
}

/// Runs `cmd` once, failing with [`MountError::Execution`] on a non-zero exit.
pub fn run_cmd<T>(session: &mut T, cmd: &str) -> Result<String>
where
    T: Transport + ?Sized,
{
    run_cmd_with(session, cmd, |output| {
        Err(MountError::Execution {
            command: cmd.to_string(),
            stderr: output.stderr.clone(),
        })
    })
}

/// Runs a command whose output is a single string that may end in spaces.
///
/// Command substitution drops trailing newlines and the capture would lose
/// trailing blanks, so the command is wrapped as ``echo `cmd`-``. The sentinel
/// survives both, and is removed again once the trailing whitespace has been
/// trimmed.
pub fn run_string_cmd<T>(session: &mut T, cmd: &str) -> Result<String>
where
    T: Transport + ?Sized,
{
    let mut ret = run_cmd(session, &format!("echo `{}`{}", cmd, STRING_SENTINEL))?;

    let trimmed = ret.trim_end().len();
    ret.truncate(trimmed);

    // Exactly one character: the sentinel.
    ret.pop();

    Ok(ret)
}

/// Checks that `tool` is installed remotely.
///
/// A failed probe is reported as [`MountError::MissingCapability`] so callers
/// can tell the user what to install.
pub fn check_tool_exists<T>(session: &mut T, tool: &str) -> Result<()>
where
    T: Transport + ?Sized,
{
    run_cmd_with(session, &format!("which {}", tool), |output| {
        warn!(
            target: CATEGORY,
            "Unable to determine if '{}' is installed: {}", tool, output.stderr
        );
        Err(MountError::MissingCapability {
            tool: tool.to_string(),
        })
    })?;
    Ok(())
}
