//! Mount session lifecycle.
//!
//! This module provides the `MountSession` type which prepares the remote
//! mount point over an SSH session, hands the session to a file server and
//! runs that server on a dedicated thread until it is stopped.

use super::constants::{CATEGORY, ENGINE_POLL_INTERVAL, REQUIRED_TOOL};
use super::engine::{EngineParams, FileServer, IdMap};
use super::error::{MountError, Result};
use super::provision::{make_target_dir, set_owner_for};
use super::remote::{check_tool_exists, run_cmd};
use super::target::{resolve_target, ResolvedTarget};
use super::transport::Transport;
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// What to mount and where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountRequest {
    /// Directory on the host.
    pub source: PathBuf,
    /// Mount point on the remote machine; may start with `~` or be relative.
    pub target: String,
    /// Host gid to remote gid translation.
    pub gid_map: IdMap,
    /// Host uid to remote uid translation.
    pub uid_map: IdMap,
}

impl MountRequest {
    /// Creates a request with empty id maps.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    /// Sets the uid translation table.
    pub fn with_uid_map(mut self, uid_map: IdMap) -> Self {
        self.uid_map = uid_map;
        self
    }

    /// Sets the gid translation table.
    pub fn with_gid_map(mut self, gid_map: IdMap) -> Self {
        self.gid_map = gid_map;
        self
    }
}

/// Numeric identity of the remote session user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultIdentity {
    /// Output of `id -u`.
    pub uid: u32,
    /// Output of `id -g`.
    pub gid: u32,
}

/// A running mount.
///
/// Created by [`MountSession::start`], which either returns a session whose
/// file server thread is running or fails without leaving anything behind.
/// Dropping the session stops the server and joins its thread.
///
/// # Example
///
/// ```no_run
/// use sshfs_mount::{MountRequest, MountSession, OpenSshSession, SlaveSshfs};
///
/// # fn main() -> anyhow::Result<()> {
/// let session = OpenSshSession::new("ubuntu@10.0.0.2");
/// let request = MountRequest::new("/home/me/src", "~/src");
///
/// let mut mount = MountSession::start(session, request, |session, params| {
///     Ok(SlaveSshfs::new(session, params)?.with_sftp_server("/usr/libexec/sftp-server"))
/// })?;
///
/// // ... later
/// mount.stop();
/// # Ok(())
/// # }
/// ```
pub struct MountSession<E: FileServer> {
    server: Arc<E>,
    server_thread: Option<JoinHandle<()>>,
    resolved: ResolvedTarget,
    identity: DefaultIdentity,
}

impl<E: FileServer> MountSession<E> {
    /// Prepares the remote target and starts serving it.
    ///
    /// The steps run in order, each on the calling thread: check that sshfs
    /// is installed, expand and split the target, create the missing
    /// directories, hand them to the session user, look up the session's
    /// uid and gid. `make_server` then receives the transport, which is not
    /// used here again, and the resulting server is run on a new thread.
    ///
    /// # Errors
    ///
    /// Any failing step aborts the whole start; no thread is running when an
    /// error is returned.
    pub fn start<T, F>(mut session: T, request: MountRequest, make_server: F) -> Result<Self>
    where
        T: Transport,
        F: FnOnce(T, EngineParams) -> anyhow::Result<E>,
    {
        debug!(
            target: CATEGORY,
            "Starting mount (source = {}, target = {})",
            request.source.display(),
            request.target
        );

        check_tool_exists(&mut session, REQUIRED_TOOL)?;

        let resolved = resolve_target(&mut session, &request.target)?;
        make_target_dir(&mut session, &resolved.existing_root, &resolved.missing)?;
        set_owner_for(&mut session, &resolved.existing_root, &resolved.missing)?;

        let identity = discover_identity(&mut session)?;

        let params = EngineParams {
            source: request.source,
            target: resolved.expanded.clone(),
            uid_map: request.uid_map,
            gid_map: request.gid_map,
            default_uid: identity.uid,
            default_gid: identity.gid,
        };
        let server = make_server(session, params).map_err(MountError::Engine)?;

        let mut mount = Self {
            server: Arc::new(server),
            server_thread: None,
            resolved,
            identity,
        };
        mount.spawn()?;

        Ok(mount)
    }

    fn spawn(&mut self) -> Result<()> {
        let server = Arc::clone(&self.server);
        let target = self.resolved.expanded.clone();

        let handle = thread::Builder::new()
            .name("sshfs-mount".into())
            .spawn(move || {
                info!(target: CATEGORY, "Connected: serving {}", target);
                if let Err(e) = server.run() {
                    error!(target: CATEGORY, "File server error on {}: {:#}", target, e);
                }
                info!(target: CATEGORY, "Stopped serving {}", target);
            })
            .map_err(MountError::Spawn)?;

        self.server_thread = Some(handle);
        Ok(())
    }

    /// Stops the file server and waits for its thread to finish.
    ///
    /// Safe to call repeatedly; later calls return immediately.
    pub fn stop(&mut self) {
        self.server.stop();
        if let Some(handle) = self.server_thread.take() {
            if handle.join().is_err() {
                error!(target: CATEGORY, "File server thread panicked");
            }
        }
    }

    /// Whether the file server thread is still alive.
    pub fn is_running(&self) -> bool {
        self.server_thread
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Blocks until `interrupted` returns true or the file server ends.
    ///
    /// `interrupted` is polled between checks of the worker. Returns `true`
    /// when interrupted and `false` when the server stopped on its own, for
    /// example because the remote side went away.
    pub fn wait<F>(&self, mut interrupted: F) -> bool
    where
        F: FnMut() -> bool,
    {
        loop {
            if interrupted() {
                return true;
            }
            if !self.is_running() {
                return false;
            }
            thread::sleep(ENGINE_POLL_INTERVAL);
        }
    }

    /// The resolved mount point.
    pub fn resolved(&self) -> &ResolvedTarget {
        &self.resolved
    }

    /// Identity of the remote session user.
    pub fn default_identity(&self) -> DefaultIdentity {
        self.identity
    }

    /// The file server.
    pub fn server(&self) -> &E {
        &self.server
    }
}

/// Stops the file server when the session goes out of scope.
impl<E: FileServer> Drop for MountSession<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Looks up the numeric uid and gid of the session user.
pub fn discover_identity<T>(session: &mut T) -> Result<DefaultIdentity>
where
    T: Transport + ?Sized,
{
    let uid = read_number(session, "id -u")?;
    let gid = read_number(session, "id -g")?;
    Ok(DefaultIdentity { uid, gid })
}

fn read_number<T>(session: &mut T, cmd: &str) -> Result<u32>
where
    T: Transport + ?Sized,
{
    let output = run_cmd(session, cmd)?;
    debug!(target: CATEGORY, "`{}` = {}", cmd, output.trim_end());
    output
        .trim()
        .parse()
        .map_err(|_| MountError::MalformedNumber {
            command: cmd.to_string(),
            output,
        })
}
