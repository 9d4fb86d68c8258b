//! Shared constants.

use std::time::Duration;

// Logging
pub const CATEGORY: &str = "sshfs mount";

// Remote tooling
pub const REQUIRED_TOOL: &str = "sshfs";
pub const DEFAULT_SSH_PROGRAM: &str = "ssh";
pub const DEFAULT_SFTP_SERVER: &str = "/usr/lib/openssh/sftp-server";

// Path handling
pub const HOME_SHORTHAND: char = '~';
pub const SEPARATOR: char = '/';
pub const STRING_SENTINEL: char = '-';

// Engine supervision
pub const ENGINE_POLL_INTERVAL: Duration = Duration::from_millis(100);
