//! Quire - build, verify, deploy and serve a Jekyll-style Markdown blog.

mod build;
mod check;
mod cli;
mod config;
mod container;
mod content;
mod deploy;
mod digest;
mod logger;
mod release;
mod resolve;
mod serve;
mod toolchain;
mod utils;

use anyhow::Result;
use build::{BuildOutcome, build_site, verify_site};
use check::{check_site, list_posts, list_releases};
use clap::Parser;
use cli::{BuildArgs, Cli, Commands};
use config::SiteConfig;
use container::build_image;
use deploy::deploy_site;
use release::Releases;
use serve::serve_site;
use std::{process::ExitCode, sync::Arc};
use utils::command::exit_code;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            log!("error"; "{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatch a parsed command line.
///
/// Failures of wrapped tools come back as their exit code, not as errors.
fn run(cli: &Cli) -> Result<ExitCode> {
    let config = SiteConfig::load(cli)?;

    match &cli.command {
        Commands::Build { build_args } => build_site(&config, build_args).map(outcome_code),
        Commands::Verify { build_args } => verify_site(&config, build_args).map(outcome_code),
        Commands::Serve {
            build, build_args, ..
        } => {
            if *build && let BuildOutcome::Failed(status) = build_site(&config, build_args)? {
                return Ok(exit_code(status));
            }
            serve_site(Arc::new(config))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Deploy {
            no_build,
            passthrough,
            ..
        } => {
            if !*no_build
                && let BuildOutcome::Failed(status) = build_site(&config, &BuildArgs::default())?
            {
                return Ok(exit_code(status));
            }
            deploy_site(&config, passthrough).map(exit_code)
        }
        Commands::Container { passthrough, .. } => {
            build_image(&config, passthrough).map(exit_code)
        }
        Commands::Clean => {
            Releases::from_config(&config).clean()?;
            log!("clean"; "removed {} and all releases", config.build.output.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let report = check_site(&config)?;
            Ok(if report.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Posts { drafts } => list_posts(&config, *drafts).map(|()| ExitCode::SUCCESS),
        Commands::Releases => list_releases(&config).map(|()| ExitCode::SUCCESS),
    }
}

fn outcome_code(outcome: BuildOutcome) -> ExitCode {
    match outcome {
        BuildOutcome::Built(_) => ExitCode::SUCCESS,
        BuildOutcome::Failed(status) => exit_code(status),
    }
}
