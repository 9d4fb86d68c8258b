//! Resolution of the remote mount target.
//!
//! A target as typed by the user may start with `~` or `~user`, or be
//! relative to the remote login directory. Resolution turns it into an
//! absolute path and splits that into the deepest directory that already
//! exists and the part that still has to be created.

use super::constants::{CATEGORY, HOME_SHORTHAND, SEPARATOR};
use super::error::{MountError, Result};
use super::remote::run_string_cmd;
use super::transport::Transport;

/// Characters that would escape the quoting of the remote shell commands.
const UNSAFE_CHARS: &[char] = &['\'', '"', '`', '$', '\\', '\n'];

/// Characters the shell treats specially in the unquoted user lookup.
const USERNAME_METACHARS: &[char] = &[';', '|', '&', '<', '>', '(', ')', '*', '?', '[', '#'];

/// A mount target after expansion and splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The target with any home shorthand expanded.
    pub expanded: String,
    /// Deepest existing ancestor directory, with a trailing separator.
    pub existing_root: String,
    /// Path of the target relative to `existing_root`; empty when the target
    /// already exists.
    pub missing: String,
}

impl ResolvedTarget {
    /// Whether any directory has to be created.
    pub fn needs_creation(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Expands the target and splits it into existing and missing parts.
///
/// Only read-only commands are issued.
pub fn resolve_target<T>(session: &mut T, target: &str) -> Result<ResolvedTarget>
where
    T: Transport + ?Sized,
{
    if target.is_empty() {
        return Err(MountError::UnsafeTarget {
            target: String::new(),
            reason: "empty path",
        });
    }

    let expanded = expand_home_directory(session, target)?;
    let (existing_root, missing) = split_path(session, &expanded)?;

    Ok(ResolvedTarget {
        expanded,
        existing_root,
        missing,
    })
}

/// Replaces a leading `~` or `~user` with the corresponding home directory.
///
/// `~` alone (or followed by a separator) resolves to the login directory of
/// the session. Paths not starting with `~` are returned unchanged.
pub fn expand_home_directory<T>(session: &mut T, target: &str) -> Result<String>
where
    T: Transport + ?Sized,
{
    let Some(rest) = target.strip_prefix(HOME_SHORTHAND) else {
        return Ok(target.to_string());
    };

    // The separator, if any, stays with the remainder.
    let (username, remainder) = match rest.find(SEPARATOR) {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };

    let home = if username.is_empty() {
        run_string_cmd(session, "pwd")?
    } else {
        if !is_lookup_safe(username) {
            return Err(MountError::UnsafeTarget {
                target: target.to_string(),
                reason: "user name contains whitespace or shell metacharacters",
            });
        }

        let home = run_string_cmd(
            session,
            &format!("getent passwd {} | cut -d : -f 6", username),
        )?;
        if home.is_empty() {
            return Err(MountError::UnknownUser {
                username: username.to_string(),
            });
        }
        home
    };

    Ok(format!("{}{}", home, remainder))
}

fn is_lookup_safe(name: &str) -> bool {
    !name.chars().any(|c| {
        c.is_whitespace() || UNSAFE_CHARS.contains(&c) || USERNAME_METACHARS.contains(&c)
    })
}

/// Splits `target` into its deepest existing ancestor and the relative path
/// from there.
///
/// The probe and the later creation are separate round trips: if the remote
/// tree changes in between, the split may be stale. Nothing guards against
/// that.
pub fn split_path<T>(session: &mut T, target: &str) -> Result<(String, String)>
where
    T: Transport + ?Sized,
{
    let absolute = if target.starts_with(SEPARATOR) {
        normalize_absolute(target)
    } else {
        let home = run_string_cmd(session, "pwd")?;
        normalize_absolute(&format!("{}{}{}", home, SEPARATOR, target))
    };

    if let Some(bad) = absolute.chars().find(|c| UNSAFE_CHARS.contains(c)) {
        log::debug!(target: CATEGORY, "Rejecting target {:?}: contains {:?}", absolute, bad);
        return Err(MountError::UnsafeTarget {
            target: target.to_string(),
            reason: "contains quote, backslash, '$', '`' or newline",
        });
    }

    let existing = run_string_cmd(session, &existing_ancestor_command(&absolute))?;
    let missing = relative_suffix(&existing, &absolute);

    // Later steps create and chown below `existing`; never let them climb out.
    if missing.split(SEPARATOR).any(|c| c == "..") {
        return Err(MountError::UnsafeTarget {
            target: target.to_string(),
            reason: "existing ancestor reported by the remote is not an ancestor",
        });
    }

    Ok((existing, missing))
}

/// Remote loop that strips trailing components of `absolute` until it names
/// an existing directory, then prints that directory with a trailing `/`.
pub fn existing_ancestor_command(absolute: &str) -> String {
    format!(
        "sudo /bin/bash -c 'P=\"{}\"; while [ ! -d \"$P/\" ]; do P=${{P%/*}}; done; echo $P/'",
        absolute
    )
}

/// Lexically cleans an absolute path: collapses repeated separators, drops
/// `.` components and trailing separators, and resolves `..`.
pub fn normalize_absolute(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split(SEPARATOR) {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("{}{}", SEPARATOR, parts.join("/"))
}

/// Path of `target` relative to the directory `base`, without a leading
/// separator. Empty when both name the same directory.
pub fn relative_suffix(base: &str, target: &str) -> String {
    let base: Vec<&str> = components(base).collect();
    let target: Vec<&str> = components(target).collect();

    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat("..").take(base.len() - common);
    ups.chain(target[common..].iter().copied())
        .collect::<Vec<_>>()
        .join("/")
}

/// First component of a relative path: everything before the first
/// separator, or the whole path.
pub fn first_component(relative: &str) -> &str {
    relative
        .split_once(SEPARATOR)
        .map_or(relative, |(first, _)| first)
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|c| !c.is_empty() && *c != ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::fake::FakeTransport;

    fn probe(absolute: &str) -> String {
        format!("echo `{}`-", existing_ancestor_command(absolute))
    }

    #[test]
    fn test_expand_leaves_plain_paths_alone() -> anyhow::Result<()> {
        let mut session = FakeTransport::new();
        let log = session.log();
        for target in ["/mnt/data", "relative/dir", "a~b", "/~"] {
            assert_eq!(expand_home_directory(&mut session, target)?, target);
        }
        assert!(log.lock().is_empty());
        Ok(())
    }

    #[test]
    fn test_expand_tilde_alone() -> anyhow::Result<()> {
        let mut session = FakeTransport::new().string("pwd", "/home/alice");
        assert_eq!(expand_home_directory(&mut session, "~")?, "/home/alice");
        Ok(())
    }

    #[test]
    fn test_expand_tilde_slash() -> anyhow::Result<()> {
        let mut session = FakeTransport::new().string("pwd", "/home/alice");
        assert_eq!(
            expand_home_directory(&mut session, "~/shared/data")?,
            "/home/alice/shared/data"
        );
        Ok(())
    }

    #[test]
    fn test_expand_named_user() -> anyhow::Result<()> {
        let mut session =
            FakeTransport::new().string("getent passwd bob | cut -d : -f 6", "/srv/bob");
        assert_eq!(expand_home_directory(&mut session, "~bob/rest")?, "/srv/bob/rest");
        assert_eq!(expand_home_directory(&mut session, "~bob")?, "/srv/bob");
        Ok(())
    }

    #[test]
    fn test_expand_home_with_trailing_space() -> anyhow::Result<()> {
        let mut session =
            FakeTransport::new().string("getent passwd carol | cut -d : -f 6", "/home/carol ");
        assert_eq!(
            expand_home_directory(&mut session, "~carol/x")?,
            "/home/carol /x"
        );
        Ok(())
    }

    #[test]
    fn test_expand_unknown_user() {
        let mut session = FakeTransport::new().string("getent passwd nobody2 | cut -d : -f 6", "");
        match expand_home_directory(&mut session, "~nobody2/x") {
            Err(MountError::UnknownUser { username }) => assert_eq!(username, "nobody2"),
            other => panic!("expected unknown user, got {:?}", other),
        }
    }

    #[test]
    fn test_expand_rejects_shell_in_username() {
        let mut session = FakeTransport::new();
        let log = session.log();
        assert!(matches!(
            expand_home_directory(&mut session, "~bob;reboot/x"),
            Err(MountError::UnsafeTarget { .. })
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_expand_rejects_quotes_and_spaces_in_username() {
        for target in ["~bo b/x", "~bob$(id)/x", "~'bob'/x", "~bob|cat/x"] {
            let mut session = FakeTransport::new();
            let log = session.log();
            assert!(
                matches!(
                    expand_home_directory(&mut session, target),
                    Err(MountError::UnsafeTarget { .. })
                ),
                "{} should be rejected",
                target
            );
            assert!(log.lock().is_empty());
        }
    }

    #[test]
    fn test_expand_directory_service_user() -> anyhow::Result<()> {
        let mut session = FakeTransport::new()
            .string("getent passwd john@corp | cut -d : -f 6", "/home/john@corp");
        assert_eq!(
            expand_home_directory(&mut session, "~john@corp/x")?,
            "/home/john@corp/x"
        );

        let mut session = FakeTransport::new()
            .string("getent passwd CORP+jane | cut -d : -f 6", "/home/CORP/jane");
        assert_eq!(expand_home_directory(&mut session, "~CORP+jane")?, "/home/CORP/jane");
        Ok(())
    }

    #[test]
    fn test_normalize_absolute() {
        assert_eq!(normalize_absolute("/"), "/");
        assert_eq!(normalize_absolute("/mnt//x/"), "/mnt/x");
        assert_eq!(normalize_absolute("/mnt/./x/../y"), "/mnt/y");
        assert_eq!(normalize_absolute("/../a"), "/a");
    }

    #[test]
    fn test_relative_suffix() {
        assert_eq!(relative_suffix("/home/alice/", "/home/alice/shared"), "shared");
        assert_eq!(relative_suffix("/mnt/", "/mnt/x/y"), "x/y");
        assert_eq!(relative_suffix("/", "/a/b"), "a/b");
        assert_eq!(relative_suffix("/mnt/x/", "/mnt/x"), "");
        assert_eq!(relative_suffix("//", "/"), "");
        assert_eq!(relative_suffix("/a/b/", "/a/c"), "../c");
    }

    #[test]
    fn test_first_component() {
        assert_eq!(first_component("a/b/c"), "a");
        assert_eq!(first_component("shared"), "shared");
        assert_eq!(first_component(""), "");
    }

    #[test]
    fn test_ancestor_command_template() {
        assert_eq!(
            existing_ancestor_command("/mnt/x/y"),
            "sudo /bin/bash -c 'P=\"/mnt/x/y\"; while [ ! -d \"$P/\" ]; do P=${P%/*}; done; echo $P/'"
        );
    }

    #[test]
    fn test_split_absolute_partial() -> anyhow::Result<()> {
        let mut session = FakeTransport::new().respond(&probe("/mnt/x/y"), "/mnt/-\n");
        let (existing, missing) = split_path(&mut session, "/mnt/x/y")?;
        assert_eq!(existing, "/mnt/");
        assert_eq!(missing, "x/y");
        Ok(())
    }

    #[test]
    fn test_split_existing_target() -> anyhow::Result<()> {
        let mut session = FakeTransport::new().respond(&probe("/srv/data"), "/srv/data/-\n");
        let (existing, missing) = split_path(&mut session, "/srv/data/")?;
        assert_eq!(existing, "/srv/data/");
        assert!(missing.is_empty());
        Ok(())
    }

    #[test]
    fn test_split_relative_uses_login_directory() -> anyhow::Result<()> {
        let mut session = FakeTransport::new()
            .string("pwd", "/home/alice")
            .respond(&probe("/home/alice/work/mnt"), "/home/alice/-\n");
        let log = session.log();

        let (existing, missing) = split_path(&mut session, "work/mnt")?;
        assert_eq!(existing, "/home/alice/");
        assert_eq!(missing, "work/mnt");
        assert_eq!(log.lock().len(), 2);
        Ok(())
    }

    #[test]
    fn test_split_rejects_foreign_ancestor() {
        let mut session = FakeTransport::new().respond(&probe("/a/c"), "/a/b/-\n");
        assert!(matches!(
            split_path(&mut session, "/a/c"),
            Err(MountError::UnsafeTarget { .. })
        ));
    }

    #[test]
    fn test_split_rejects_quotes() {
        let mut session = FakeTransport::new();
        let log = session.log();
        assert!(matches!(
            split_path(&mut session, "/mnt/it's"),
            Err(MountError::UnsafeTarget { .. })
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_resolve_rejects_empty_target() {
        let mut session = FakeTransport::new();
        assert!(matches!(
            resolve_target(&mut session, ""),
            Err(MountError::UnsafeTarget { .. })
        ));
    }

    #[test]
    fn test_resolve_home_target() -> anyhow::Result<()> {
        let mut session = FakeTransport::new()
            .string("pwd", "/home/alice")
            .respond(&probe("/home/alice/shared"), "/home/alice/-\n");

        let resolved = resolve_target(&mut session, "~/shared")?;
        assert_eq!(
            resolved,
            ResolvedTarget {
                expanded: "/home/alice/shared".into(),
                existing_root: "/home/alice/".into(),
                missing: "shared".into(),
            }
        );
        assert!(resolved.needs_creation());
        Ok(())
    }
}
