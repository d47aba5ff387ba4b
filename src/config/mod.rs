//! Project configuration from `quire.toml`.
//!
//! # Sections
//!
//! | Section       | Purpose                                          |
//! |---------------|--------------------------------------------------|
//! | `[content]`   | Posts/drafts directories, permalink pattern      |
//! | `[build]`     | Site builder command, output pointer, releases   |
//! | `[serve]`     | Static server (interface, port, workers)         |
//! | `[container]` | Toolchain image build                            |
//! | `[deploy]`    | Deploy command and target                        |
//! | `[toolchain]` | Extra `PATH` entries for installed tooling       |
//!
//! Every section is optional; a project without `quire.toml` runs on
//! defaults that match a stock Jekyll blog.
//!
//! # Example
//!
//! ```toml
//! [content]
//! permalink = "/log/:year/:month/:day/:title"
//!
//! [build]
//! command = ["bundle", "exec", "jekyll", "build"]
//! keep = 3
//!
//! [serve]
//! port = 4000
//!
//! [deploy]
//! target = "www@example.com:/srv/blog"
//! ```

mod build;
mod container;
mod content;
pub mod defaults;
mod deploy;
mod error;
mod serve;
mod toolchain;

use build::BuildConfig;
use container::ContainerConfig;
use content::ContentConfig;
use deploy::DeployConfig;
pub use error::ConfigError;
use serve::ServeConfig;
use toolchain::ToolchainConfig;

use crate::{
    cli::{Cli, Commands},
    content::Permalink,
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::Deserialize;
use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading, may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Content corpus layout
    #[serde(default)]
    pub content: ContentConfig,

    /// Site builder and release settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Static server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Toolchain image settings
    #[serde(default)]
    pub container: ContainerConfig,

    /// Deployment settings
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Toolchain lookup settings
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load, apply CLI overrides, and validate for the CLI's command.
    ///
    /// A missing default `quire.toml` means "all defaults"; a config file
    /// named with `-C` must exist.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_name = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults::CONFIG_FILE));
        let config_path = root.join(&config_name);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else if cli.config.is_some() {
            bail!(ConfigError::NotFound(config_path));
        } else {
            Self::default()
        };

        config.update_with_cli(cli, root, &config_name);
        config.validate(cli)?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli, root: &Path, config_name: &Path) {
        self.update_path_with_root(root, config_name);

        match &cli.command {
            Commands::Serve {
                interface,
                port,
                workers,
                ..
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.workers, workers.as_ref());
            }
            Commands::Deploy { target, .. } => {
                if let Some(target) = target {
                    self.deploy.target = Some(target.clone());
                }
            }
            Commands::Container { tag, .. } => {
                Self::update_option(&mut self.container.tag, tag.as_ref());
            }
            _ => {}
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths against the root and normalize them to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config_name: &Path) {
        let root = Self::normalize_path(root);

        self.config_path = Self::normalize_path(&root.join(config_name));
        self.content.posts = Self::normalize_path(&root.join(&self.content.posts));
        self.content.drafts = Self::normalize_path(&root.join(&self.content.drafts));
        self.build.releases = Self::normalize_path(&root.join(&self.build.releases));
        self.container.dockerfile = Self::normalize_path(&root.join(&self.container.dockerfile));
        self.container.context = Self::normalize_path(&root.join(&self.container.context));

        // The output pointer is a symlink: canonicalizing would resolve it
        // to whatever release it names today.
        self.build.output = Self::absolute_path(&root.join(&self.build.output));

        self.toolchain.path = self
            .toolchain
            .path
            .iter()
            .map(|dir| {
                let expanded = PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned());
                if expanded.is_relative() {
                    Self::normalize_path(&root.join(expanded))
                } else {
                    Self::normalize_path(&expanded)
                }
            })
            .collect();

        self.root = root;
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize()
            .unwrap_or_else(|_| Self::absolute_path(path))
    }

    /// Make a path absolute without following symlinks
    fn absolute_path(path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Validate configuration for the current command
    pub fn validate(&self, cli: &Cli) -> Result<()> {
        if let Err(err) = self.content.permalink.parse::<Permalink>() {
            bail!(ConfigError::Validation(format!("[content.permalink] {err}")));
        }

        if self.content.extensions.is_empty() {
            bail!(ConfigError::Validation(
                "[content.extensions] must have at least one element".into()
            ));
        }

        if self.build.keep == 0 {
            bail!(ConfigError::Validation(
                "[build.keep] must be at least 1 (the current release)".into()
            ));
        }

        if self.build.output == self.build.releases
            || self.build.output.starts_with(&self.build.releases)
        {
            bail!(ConfigError::Validation(
                "[build.output] must not live inside [build.releases]".into()
            ));
        }

        if cli.runs_builder() {
            Self::check_command("[build.command]", &self.build.command)?;
            if self.build.destination_flag.is_empty() {
                bail!(ConfigError::Validation(
                    "[build.destination_flag] must not be empty".into()
                ));
            }
        }

        match &cli.command {
            Commands::Serve { .. } => {
                if self.serve.interface.parse::<IpAddr>().is_err() {
                    bail!(ConfigError::Validation(format!(
                        "[serve.interface] `{}` is not an IP address",
                        self.serve.interface
                    )));
                }
                if self.serve.workers == 0 {
                    bail!(ConfigError::Validation(
                        "[serve.workers] must be at least 1".into()
                    ));
                }
            }
            Commands::Container { .. } => {
                Self::check_command("[container.command]", &self.container.command)?;
                if !self.container.dockerfile.is_file() {
                    bail!(ConfigError::Validation(format!(
                        "[container.dockerfile] `{}` not found",
                        self.container.dockerfile.display()
                    )));
                }
                if self.container.tag.is_empty() {
                    bail!(ConfigError::Validation(
                        "[container.tag] must not be empty".into()
                    ));
                }
            }
            Commands::Deploy { .. } => {
                Self::check_command("[deploy.command]", &self.deploy.command)?;
                if self.deploy.target.as_deref().is_none_or(str::is_empty) {
                    bail!(ConfigError::Validation(
                        "[deploy.target] is required for deploy".into()
                    ));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Check that a command line has a program to run
    fn check_command(field: &str, command: &[String]) -> Result<()> {
        if command.first().is_none_or(|program| program.is_empty()) {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
