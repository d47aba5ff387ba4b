//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quire blog toolkit CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (default: quire.toml).
    ///
    /// When given explicitly the file must exist.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared arguments for commands that run the site builder
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Render drafts as well as published posts
    #[arg(long)]
    pub drafts: bool,

    /// Extra flags handed to the site builder verbatim (after `--`)
    #[arg(last = true)]
    pub passthrough: Vec<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site into a new release and make it current
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Serve the current release, falling back to the index page for unknown paths
    Serve {
        /// Build a new release before serving
        #[arg(short, long)]
        build: bool,

        #[command(flatten)]
        build_args: BuildArgs,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// Number of request worker threads
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Build the site, then push the current release to the deploy target
    Deploy {
        /// Push the current release without building first
        #[arg(long)]
        no_build: bool,

        /// Override `[deploy.target]`
        #[arg(short, long)]
        target: Option<String>,

        /// Extra flags handed to the deploy command verbatim (after `--`)
        #[arg(last = true)]
        passthrough: Vec<String>,
    },

    /// Remove the output pointer and every release
    Clean,

    /// Build the toolchain container image
    Container {
        /// Override `[container.tag]`
        #[arg(short, long)]
        tag: Option<String>,

        /// Extra flags handed to the container tool verbatim (after `--`)
        #[arg(last = true)]
        passthrough: Vec<String>,
    },

    /// Validate posts and drafts, and look for published routes missing from the current release
    Check,

    /// List posts (and optionally drafts) with their routes
    Posts {
        /// Include drafts
        #[arg(long)]
        drafts: bool,
    },

    /// Build twice and make sure both builds are byte-identical
    Verify {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// List releases, marking the current one
    Releases,
}

#[allow(unused)]
impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_deploy(&self) -> bool {
        matches!(self.command, Commands::Deploy { .. })
    }
    pub const fn is_container(&self) -> bool {
        matches!(self.command, Commands::Container { .. })
    }

    /// Whether this invocation runs the site builder.
    pub const fn runs_builder(&self) -> bool {
        match &self.command {
            Commands::Build { .. } | Commands::Verify { .. } => true,
            Commands::Serve { build, .. } => *build,
            Commands::Deploy { no_build, .. } => !*no_build,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_with_passthrough() {
        let cli = Cli::parse_from(["quire", "build", "--drafts", "--", "--trace", "--future"]);
        match cli.command {
            Commands::Build { build_args } => {
                assert!(build_args.drafts);
                assert_eq!(build_args.passthrough, vec!["--trace", "--future"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["quire", "-r", "blog", "serve", "-p", "8080", "-w", "2"]);
        assert!(cli.is_serve());
        assert!(!cli.runs_builder());
        assert_eq!(cli.root, Some(PathBuf::from("blog")));
        match cli.command {
            Commands::Serve { port, workers, build, .. } => {
                assert_eq!(port, Some(8080));
                assert_eq!(workers, Some(2));
                assert!(!build);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_runs_builder() {
        assert!(Cli::parse_from(["quire", "build"]).runs_builder());
        assert!(Cli::parse_from(["quire", "verify"]).runs_builder());
        assert!(Cli::parse_from(["quire", "serve", "--build"]).runs_builder());
        assert!(Cli::parse_from(["quire", "deploy"]).runs_builder());
        assert!(!Cli::parse_from(["quire", "deploy", "--no-build"]).runs_builder());
        assert!(!Cli::parse_from(["quire", "check"]).runs_builder());
    }

    #[test]
    fn test_parse_container_tag() {
        let cli = Cli::parse_from(["quire", "container", "-t", "blog:latest", "--", "--no-cache"]);
        assert!(cli.is_container());
        match cli.command {
            Commands::Container { tag, passthrough } => {
                assert_eq!(tag.as_deref(), Some("blog:latest"));
                assert_eq!(passthrough, vec!["--no-cache"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
