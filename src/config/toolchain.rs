//! `[toolchain]` section configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// `[toolchain]` section in quire.toml - where installed tooling lives.
///
/// Directories listed in `path` are prepended to `PATH` for every command
/// quire runs. `~` is expanded, relative entries resolve against the root.
///
/// # Example
/// ```toml
/// [toolchain]
/// path = ["~/.gem/ruby/2.7.0/bin", "vendor/bundle/bin"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub path: Vec<PathBuf>,
}
