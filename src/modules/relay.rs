//! File server built from stock tools.
//!
//! The remote side runs `sshfs -o slave`, which mounts the target and speaks
//! SFTP on its standard streams instead of opening its own connection. Those
//! streams come back through the SSH session and are wired to a local
//! `sftp-server`, so the remote mount reads and writes the host directory.

use super::constants::{CATEGORY, DEFAULT_SFTP_SERVER, ENGINE_POLL_INTERVAL};
use super::engine::{EngineParams, FileServer};
use super::transport::OpenSshSession;
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Serves a host directory to a remote `sshfs -o slave`.
///
/// Every file shows up remotely as owned by the default uid and gid from the
/// [`EngineParams`]; the translation tables are not applied by this server.
pub struct SlaveSshfs {
    session: OpenSshSession,
    params: EngineParams,
    sftp_server: String,
    children: Mutex<Vec<(&'static str, Child)>>,
    stopping: AtomicBool,
}

impl SlaveSshfs {
    /// Creates a server for `params.source`, reached through `session`.
    ///
    /// # Errors
    ///
    /// Fails if the source path cannot be quoted for the remote shell.
    pub fn new(session: OpenSshSession, params: EngineParams) -> Result<Self> {
        let source = params.source.to_string_lossy();
        if source.contains(['"', '\'', '`', '$', '\\', '\n']) {
            bail!("unsupported characters in source path {:?}", source);
        }

        Ok(Self {
            session,
            params,
            sftp_server: DEFAULT_SFTP_SERVER.to_string(),
            children: Mutex::new(Vec::new()),
            stopping: AtomicBool::new(false),
        })
    }

    /// Uses a different local SFTP server binary.
    pub fn with_sftp_server(mut self, sftp_server: impl Into<String>) -> Self {
        self.sftp_server = sftp_server.into();
        self
    }

    /// The parameters this server was built with.
    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// The command run on the remote machine.
    pub fn remote_command(&self) -> String {
        format!(
            "sudo sshfs -o slave -o allow_other -o uid={},gid={} :\"{}\" \"{}\"",
            self.params.default_uid,
            self.params.default_gid,
            self.params.source.display(),
            self.params.target
        )
    }

    fn supervise(&self) -> Result<()> {
        loop {
            if self.stopping.load(Ordering::SeqCst) {
                return Ok(());
            }

            {
                let mut children = self.children.lock();
                for i in 0..children.len() {
                    let Some(status) = children[i].1.try_wait()? else {
                        continue;
                    };
                    // Reaped children are never signalled by `stop`.
                    let (name, _) = children.remove(i);
                    if status.success() || self.stopping.load(Ordering::SeqCst) {
                        debug!(target: CATEGORY, "{} exited: {}", name, status);
                        return Ok(());
                    }
                    return Err(anyhow!("{} exited with {}", name, status));
                }
            }

            thread::sleep(ENGINE_POLL_INTERVAL);
        }
    }

    fn reap(&self) {
        for (name, mut child) in self.children.lock().drain(..) {
            if let Err(e) = child.kill() {
                debug!(target: CATEGORY, "{} already gone: {}", name, e);
            }
            let _ = child.wait();
        }
    }
}

impl FileServer for SlaveSshfs {
    fn run(&self) -> Result<()> {
        if self.stopping.load(Ordering::SeqCst) {
            return Ok(());
        }

        if !self.params.uid_map.is_empty() || !self.params.gid_map.is_empty() {
            warn!(
                target: CATEGORY,
                "Id maps are not applied by the sshfs slave server; files belong to {}:{}",
                self.params.default_uid,
                self.params.default_gid
            );
        }

        let mut remote = self
            .session
            .stream(&self.remote_command())
            .context("failed to start remote sshfs")?;
        let to_remote = remote.stdin.take().context("remote sshfs has no stdin")?;
        let from_remote = remote.stdout.take().context("remote sshfs has no stdout")?;

        let local = Command::new(&self.sftp_server)
            .stdin(Stdio::from(from_remote))
            .stdout(Stdio::from(to_remote))
            .stderr(Stdio::inherit())
            .spawn();
        let local = match local {
            Ok(child) => child,
            Err(e) => {
                let _ = remote.kill();
                let _ = remote.wait();
                return Err(e).with_context(|| format!("failed to start {}", self.sftp_server));
            }
        };

        self.children
            .lock()
            .extend([("remote sshfs", remote), ("sftp-server", local)]);

        let result = self.supervise();
        self.reap();
        result
    }

    fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        for (name, child) in self.children.lock().iter() {
            if let Err(e) = signal::kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM) {
                debug!(target: CATEGORY, "Could not signal {}: {}", name, e);
            }
        }
    }
}
