//! Error types for mount setup.

use std::io;

use thiserror::Error;

/// Errors raised while preparing or starting a mount.
#[derive(Debug, Error)]
pub enum MountError {
    /// A remote command exited with a non-zero status.
    #[error("remote command `{command}` failed: {stderr}")]
    Execution {
        /// The command as sent to the session.
        command: String,
        /// Captured standard error of the remote process.
        stderr: String,
    },

    /// A tool the mount depends on is not installed remotely.
    #[error("'{tool}' is not installed on the remote machine")]
    MissingCapability {
        /// Name of the missing binary.
        tool: String,
    },

    /// `~user` expansion found no home directory.
    #[error("user {username} does not exist or does not have a home defined")]
    UnknownUser {
        /// The user named after the home shorthand.
        username: String,
    },

    /// A numeric lookup such as `id -u` returned something else.
    #[error("`{command}` returned a non-numeric result: {output:?}")]
    MalformedNumber {
        /// The command that produced the output.
        command: String,
        /// The raw output.
        output: String,
    },

    /// The target cannot be embedded in the remote shell commands.
    #[error("invalid mount target {target:?}: {reason}")]
    UnsafeTarget {
        /// The target as supplied by the caller.
        target: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The session could not run the command at all.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// The background worker could not be created.
    #[error("failed to spawn mount worker: {0}")]
    Spawn(#[source] io::Error),

    /// The engine factory refused to build an engine.
    #[error("failed to create file server: {0}")]
    Engine(#[source] anyhow::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MountError>;
