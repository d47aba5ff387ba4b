//! External command execution.
//!
//! Wrapped tools (site builder, container tool, deploy command) run with
//! inherited stdio so their output and prompts reach the terminal untouched.
//! Their exit status is handed back to the caller, which turns it into the
//! exit code of quire itself.

use anyhow::{Context, Result};
use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::{Command, ExitCode, ExitStatus},
};

// ============================================================================
// Argument Conversion
// ============================================================================

/// Convert to OsString.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Convert a configured command line to Vec<OsString>.
#[inline]
pub fn to_cmd_vec(cmd: &[String]) -> Vec<OsString> {
    cmd.iter().map(OsString::from).collect()
}

/// Filter out empty args.
#[inline]
pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|a| !a.is_empty()).cloned().collect()
}

// ============================================================================
// Command Execution
// ============================================================================

/// How to launch a command: where, and with which `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Launch<'a> {
    /// Working directory
    pub root: Option<&'a Path>,
    /// Resolved program, replacing `cmd[0]` when set
    pub program: Option<&'a Path>,
    /// Replacement `PATH` for the child
    pub path_env: Option<&'a OsStr>,
}

/// Run a command to completion with inherited stdio.
///
/// # Errors
/// Returns error only if the command cannot be started. A non-zero exit is
/// reported through the returned status.
pub fn run(launch: Launch<'_>, cmd: &[OsString], args: &[OsString]) -> Result<ExitStatus> {
    let (name, mut command) = prepare(launch, cmd, args)?;

    command
        .status()
        .with_context(|| format!("Failed to execute `{name}`"))
}

/// Prepare a Command from components.
fn prepare(launch: Launch<'_>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let first = cmd.first().filter(|s| !s.is_empty()).context("Empty command")?;
    let name = first.to_string_lossy().into_owned();

    let mut command = match launch.program {
        Some(program) => Command::new(program),
        None => Command::new(first),
    };
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = launch.root {
        command.current_dir(dir);
    }
    if let Some(path) = launch.path_env {
        command.env("PATH", path);
    }

    Ok((name, command))
}

/// Map a child's exit status onto our own exit code.
///
/// Statuses without a code (killed by a signal) become a generic failure.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

// ============================================================================
// Tests
// ============================================================================
