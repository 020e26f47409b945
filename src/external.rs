//! Spawning and wiring of external commands.
//!
//! Two executors live here: [`run_single`] for a plain directive and
//! [`run_pipeline`] for a two-stage `left | right` directive. Both resolve
//! program names against `$PATH`, apply output redirection by handing the
//! child an opened file as its stdout, and either block until their children
//! are reaped or register them as background jobs.

use crate::env::Environment;
use crate::parser::{Redirect, RedirectMode};
use anyhow::{Context, Result, anyhow};
use std::env as stdenv;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Resolve a command name the way a typical shell would.
///
/// - Absolute path: returned if it exists.
/// - Path with a directory component (e.g. `bin/tool`, `./tool`): resolved
///   against the interpreter's working directory if it exists there.
/// - Bare name: the first existing match in the `$PATH` directories.
/// - Empty name: `None`.
pub(crate) fn resolve_program(env: &Environment, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let path = Path::new(name);
    if path.is_absolute() {
        return path.exists().then(|| path.to_path_buf());
    }
    if path.components().count() > 1 {
        let candidate = env.current_dir.join(path);
        return candidate.exists().then_some(candidate);
    }
    let search_paths = env.get_var("PATH")?;
    for dir in stdenv::split_paths(&search_paths) {
        let candidate = dir.join(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Build the `Command` for one argument vector, with the interpreter's
/// variables and working directory applied. Fails with a recoverable error
/// when the program name does not resolve.
fn command_for(argv: &[String], env: &Environment) -> Result<Command> {
    let program = resolve_program(env, &argv[0])
        .ok_or_else(|| anyhow!("command not found: {}", argv[0]))?;
    let mut cmd = Command::new(program);
    cmd.args(&argv[1..])
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);
    Ok(cmd)
}

/// Open the redirection target for use as a child's stdout.
///
/// `>` truncates, `>>` appends; the file is created either way, with default
/// permissions (0666 before umask). Relative paths resolve against the
/// interpreter's working directory.
fn open_redirect(redirect: &Redirect, env: &Environment) -> Result<File> {
    let path = env.current_dir.join(&redirect.path);
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match redirect.mode {
        RedirectMode::Truncate => options.truncate(true),
        RedirectMode::Append => options.append(true),
    };
    options
        .open(&path)
        .with_context(|| format!("cannot open {}", redirect.path))
}

/// Execute a non-piped directive as one child process.
///
/// Foreground: blocks until the child is reaped, discarding its exit status.
/// Background: registers the child in `jobs` and returns immediately.
pub(crate) fn run_single(
    argv: &[String],
    background: bool,
    redirect: Option<&Redirect>,
    env: &Environment,
    jobs: &mut Vec<Child>,
) -> Result<()> {
    let mut cmd = command_for(argv, env)?;
    if let Some(redirect) = redirect {
        cmd.stdout(open_redirect(redirect, env)?);
    }
    let mut child = cmd
        .spawn()
        .with_context(|| format!("cannot start {}", argv[0]))?;
    if background {
        jobs.push(child);
    } else {
        child
            .wait()
            .with_context(|| format!("wait for {} failed", argv[0]))?;
    }
    Ok(())
}

/// Execute a `left | right` directive as two children joined by one pipe.
///
/// The pipe exists before either child runs; once both spawn attempts have
/// returned, the parent holds no pipe descriptor (the write end lives only in
/// the left child, the read end is moved into the right child's stdin).
/// Redirection applies to the right stage only. Foreground: both children are
/// reaped, in either order, before this returns.
pub(crate) fn run_pipeline(
    left: &[String],
    right: &[String],
    background: bool,
    redirect: Option<&Redirect>,
    env: &Environment,
    jobs: &mut Vec<Child>,
) -> Result<()> {
    // Resolve both stages up front, so a bad right-hand command is reported
    // before the left one is ever spawned.
    let mut left_cmd = command_for(left, env)?;
    let mut right_cmd = command_for(right, env)?;

    left_cmd.stdout(Stdio::piped());
    if let Some(redirect) = redirect {
        right_cmd.stdout(open_redirect(redirect, env)?);
    }

    let mut left_child = left_cmd
        .spawn()
        .with_context(|| format!("cannot start {}", left[0]))?;
    let pipe_read = left_child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("no pipe attached to {}", left[0]))?;

    right_cmd.stdin(Stdio::from(pipe_read));
    let right_child = match right_cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            // Close the read end so the left child sees a broken pipe instead
            // of blocking on a reader that will never come.
            drop(right_cmd);
            if background {
                jobs.push(left_child);
            } else {
                let _ = left_child.wait();
            }
            return Err(e).with_context(|| format!("cannot start {}", right[0]));
        }
    };

    if background {
        jobs.push(left_child);
        jobs.push(right_child);
    } else {
        // Both children must be reaped, in either order, before the directive
        // counts as finished. Statuses are observed and discarded.
        for mut child in [left_child, right_child] {
            let _ = child.wait();
        }
    }
    Ok(())
}
