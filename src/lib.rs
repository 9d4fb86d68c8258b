#![doc(html_root_url = "https://docs.rs/sshfs-mount/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! sshfs-mount: expose a host directory inside a remote machine over SSH
//!
//! The remote machine mounts the host directory with sshfs; the file
//! requests travel back over an SSH session that is already set up.
//!
//! ## Features
//!
//! - `~` and `~user` expansion of the remote mount point
//! - Creation of missing directories, owned by the remote session user
//! - Background file server with clean stop on drop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sshfs_mount::{MountRequest, MountSession, OpenSshSession, SlaveSshfs};
//!
//! # fn main() -> anyhow::Result<()> {
//! let session = OpenSshSession::new("ubuntu@10.0.0.2");
//! let request = MountRequest::new("/home/me/project", "~/project");
//!
//! let mount = MountSession::start(session, request, SlaveSshfs::new)?;
//! println!("mounted at {}", mount.resolved().expanded);
//! # Ok(())
//! # }
//! ```
//!
//! ## Setup steps
//!
//! - Probe: `which sshfs` must succeed remotely
//! - Resolve: expand the home shorthand and find the deepest existing directory
//! - Provision: `mkdir -p` the rest and `chown -R` its top directory
//! - Identify: `id -u` / `id -g` give the default owner for served files

pub mod modules;

pub use modules::engine::{EngineParams, FileServer, IdMap};
pub use modules::error::{MountError, Result};
pub use modules::relay::SlaveSshfs;
pub use modules::session::{DefaultIdentity, MountRequest, MountSession};
pub use modules::transport::{ExecOutput, OpenSshSession, Transport};

// Re-export commonly used types
pub use modules::config::MountConfig;
pub use modules::target::ResolvedTarget;
