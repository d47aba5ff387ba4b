//! Toolchain image builds.
//!
//! Runs `<container.command> build -f <dockerfile> -t <tag> [...] <context>`
//! so the site builder can run inside a pinned Ruby environment.

use crate::{config::SiteConfig, log, toolchain::Toolchain, utils::command::to_os};
use anyhow::Result;
use std::{ffi::OsString, process::ExitStatus};

/// Arguments appended to `[container.command]`.
fn container_args(config: &SiteConfig, passthrough: &[String]) -> Vec<OsString> {
    let container = &config.container;

    let mut args = vec![
        to_os("build"),
        to_os("-f"),
        to_os(&container.dockerfile),
        to_os("-t"),
        to_os(&container.tag),
    ];
    args.extend(passthrough.iter().map(to_os));
    args.push(to_os(&container.context));
    args
}

/// Build the toolchain image.
pub fn build_image(config: &SiteConfig, passthrough: &[String]) -> Result<ExitStatus> {
    let toolchain = Toolchain::from_config(config)?;
    log!("container"; "building image {}", config.container.tag);

    let status = toolchain.run(
        "[container.command]",
        &config.container.command,
        &container_args(config, passthrough),
    )?;

    if status.success() {
        log!("container"; "image {} ready", config.container.tag);
    } else {
        log!("error"; "image build failed ({status})");
    }
    Ok(status)
}
