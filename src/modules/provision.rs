//! Creation of the missing part of the mount target.

use super::error::Result;
use super::remote::{run_cmd, run_string_cmd};
use super::target::first_component;
use super::transport::Transport;

/// Creates `relative` below `root` with elevated privileges.
///
/// Does nothing when `relative` is empty.
pub fn make_target_dir<T>(session: &mut T, root: &str, relative: &str) -> Result<()>
where
    T: Transport + ?Sized,
{
    if relative.is_empty() {
        return Ok(());
    }

    run_cmd(session, &mkdir_command(root, relative))?;
    Ok(())
}

/// Hands the newly created tree below `root` to the session user.
///
/// Only the first component of `relative` is changed, recursively: it is the
/// top of what [`make_target_dir`] created, while `root` and its other
/// entries existed before. Expects the directories to exist already. Does
/// nothing when `relative` is empty.
pub fn set_owner_for<T>(session: &mut T, root: &str, relative: &str) -> Result<()>
where
    T: Transport + ?Sized,
{
    if relative.is_empty() {
        return Ok(());
    }

    let vm_user = run_string_cmd(session, "id -nu")?;
    let vm_group = run_string_cmd(session, "id -ng")?;

    run_cmd(
        session,
        &chown_command(root, &vm_user, &vm_group, first_component(relative)),
    )?;
    Ok(())
}

pub(crate) fn mkdir_command(root: &str, relative: &str) -> String {
    format!(
        "sudo /bin/bash -c 'cd \"{}\" && mkdir -p \"{}\"'",
        root, relative
    )
}

pub(crate) fn chown_command(root: &str, user: &str, group: &str, first_dir: &str) -> String {
    format!(
        "sudo /bin/bash -c 'cd \"{}\" && chown -R {}:{} {}'",
        root,
        user,
        group,
        shell_word(first_dir)
    )
}

// Plain names go in bare; anything the shell would split or glob is quoted.
fn shell_word(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._-+,@%:=".contains(c));
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}
