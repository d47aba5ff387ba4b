//! The environment wrapped tools run in.
//!
//! `[toolchain.path]` entries are put in front of `PATH` so tooling
//! installed outside the usual locations (gem bin dirs, vendored bundles)
//! is found both by our own `which` checks and by the tools themselves.

use crate::{
    config::SiteConfig,
    utils::command::{self, Launch, to_cmd_vec},
};
use anyhow::{Context, Result, bail};
use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::ExitStatus,
};

/// Project root plus the `PATH` every child process sees.
#[derive(Debug, Clone)]
pub struct Toolchain {
    root: PathBuf,
    /// Extended `PATH`, `None` when nothing is added
    path: Option<OsString>,
}

impl Toolchain {
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(config.get_root(), &config.toolchain.path, env::var_os("PATH"))
    }

    fn new(root: &Path, extra: &[PathBuf], inherited: Option<OsString>) -> Result<Self> {
        let path = if extra.is_empty() {
            None
        } else {
            let dirs = extra
                .iter()
                .cloned()
                .chain(inherited.iter().flat_map(env::split_paths));
            Some(env::join_paths(dirs).context("[toolchain.path] contains an invalid entry")?)
        };

        Ok(Self {
            root: root.to_path_buf(),
            path,
        })
    }

    /// `PATH` as handed to child processes.
    pub fn path_var(&self) -> Option<OsString> {
        self.path.clone().or_else(|| env::var_os("PATH"))
    }

    /// Find `program` on the extended `PATH`.
    pub fn locate(&self, program: &str) -> Result<PathBuf> {
        which::which_in(program, self.path_var(), &self.root)
            .with_context(|| format!("`{program}` not found. Please install it first."))
    }

    /// Check that the program of a configured command line is installed.
    pub fn ensure_installed(&self, field: &str, command: &[String]) -> Result<PathBuf> {
        match command.first() {
            Some(program) if !program.is_empty() => self.locate(program),
            _ => bail!("{field} must have at least one element"),
        }
    }

    /// Run a configured command line in the project root.
    ///
    /// `args` follow the configured arguments verbatim.
    pub fn run(&self, field: &str, cmd: &[String], args: &[OsString]) -> Result<ExitStatus> {
        let program = self.ensure_installed(field, cmd)?;
        let launch = Launch {
            root: Some(&self.root),
            program: Some(&program),
            path_env: self.path.as_deref(),
        };
        command::run(launch, &to_cmd_vec(cmd), args)
    }
}
