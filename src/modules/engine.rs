//! The file server a mount runs in the background.
//!
//! The server answers filesystem requests coming back over the SSH session.
//! A mount only builds it, runs it on a worker thread and stops it; how it
//! talks to the remote side is up to the implementation.

use std::collections::HashMap;
use std::path::PathBuf;

/// Host id to remote id translation table.
pub type IdMap = HashMap<u32, u32>;

/// Everything a file server needs once the target has been prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineParams {
    /// Directory on the host being exposed.
    pub source: PathBuf,
    /// Mount point on the remote machine with `~` expanded. A relative path
    /// is relative to the login directory of the session.
    pub target: String,
    /// Host uid to remote uid translation.
    pub uid_map: IdMap,
    /// Host gid to remote gid translation.
    pub gid_map: IdMap,
    /// Remote uid for files without an explicit mapping.
    pub default_uid: u32,
    /// Remote gid for files without an explicit mapping.
    pub default_gid: u32,
}

/// A file server driven by a [`MountSession`](super::session::MountSession).
pub trait FileServer: Send + Sync + 'static {
    /// Serves requests until stopped or until the connection ends.
    fn run(&self) -> anyhow::Result<()>;

    /// Asks a running [`run`](FileServer::run) to return.
    ///
    /// Called from another thread; must not block and must be safe to call
    /// more than once, or before `run` was ever called.
    fn stop(&self);
}
