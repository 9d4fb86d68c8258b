//! Mount configuration.
//!
//! Settings can come from a JSON file; the command line overrides them.
//!
//! ```json
//! {
//!   "ssh_options": ["-p", "2222"],
//!   "sftp_server": "/usr/libexec/sftp-server",
//!   "uid_map": { "501": 1000 },
//!   "gid_map": { "20": 1000 }
//! }
//! ```

use super::constants::{DEFAULT_SFTP_SERVER, DEFAULT_SSH_PROGRAM};
use super::engine::IdMap;
use super::transport::OpenSshSession;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings for connecting and serving a mount.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    /// The ssh client binary.
    pub ssh_program: String,
    /// Extra arguments passed to ssh before the destination.
    pub ssh_options: Vec<String>,
    /// Local SFTP server binary.
    pub sftp_server: String,
    /// Host uid to remote uid translation.
    pub uid_map: IdMap,
    /// Host gid to remote gid translation.
    pub gid_map: IdMap,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            ssh_program: DEFAULT_SSH_PROGRAM.to_string(),
            ssh_options: Vec::new(),
            sftp_server: DEFAULT_SFTP_SERVER.to_string(),
            uid_map: IdMap::new(),
            gid_map: IdMap::new(),
        }
    }
}

impl MountConfig {
    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON for
    /// this structure.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Builds an ssh session to `destination` with these settings.
    pub fn session(&self, destination: &str) -> OpenSshSession {
        OpenSshSession::new(destination)
            .with_program(self.ssh_program.clone())
            .with_options(self.ssh_options.iter().cloned())
    }
}

/// Parses a `HOST:REMOTE` id pair.
pub fn parse_id_pair(s: &str) -> std::result::Result<(u32, u32), String> {
    let (host, remote) = s
        .split_once(':')
        .ok_or_else(|| format!("expected HOST:REMOTE, got {:?}", s))?;
    let host = host
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad host id {:?}: {}", host, e))?;
    let remote = remote
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad remote id {:?}: {}", remote, e))?;
    Ok((host, remote))
}
