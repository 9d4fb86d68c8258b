//! Core mount modules.
//!
//! This module provides the components of a mount, leaf first:
//!
//! - `transport`: Remote command execution over SSH
//! - `remote`: Command, string and capability helpers on top of a transport
//! - `target`: Home expansion and existing/missing path split
//! - `provision`: Creation and ownership of the missing directories
//! - `engine`: The file server interface
//! - `relay`: File server built on `sshfs -o slave` and `sftp-server`
//! - `session`: Mount lifecycle
//! - `config`: Configuration file and command line helpers

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod provision;
pub mod relay;
pub mod remote;
pub mod session;
pub mod target;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;
