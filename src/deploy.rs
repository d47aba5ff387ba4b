//! Site deployment module.
//!
//! Pushes the current release with `[deploy.command]` (rsync by default).
//! The release directory is resolved once, so a build finishing mid-upload
//! cannot change what is being sent.

use crate::{
    config::SiteConfig,
    log,
    release::Releases,
    toolchain::Toolchain,
    utils::command::to_os,
};
use anyhow::{Context, Result, bail};
use std::{ffi::OsString, path::Path, process::ExitStatus};

/// Arguments appended to `[deploy.command]`.
///
/// The trailing slash makes rsync copy the release's contents rather than
/// the release directory itself.
fn deploy_args(release: &Path, target: &str, passthrough: &[String]) -> Vec<OsString> {
    let mut source = release.as_os_str().to_os_string();
    source.push("/");

    passthrough
        .iter()
        .map(to_os)
        .chain([source, to_os(target)])
        .collect()
}

/// Push the current release to `[deploy.target]`.
pub fn deploy_site(config: &SiteConfig, passthrough: &[String]) -> Result<ExitStatus> {
    let Some(target) = config.deploy.target.as_deref() else {
        bail!("[deploy.target] is required for deploy");
    };

    let Some(current) = Releases::from_config(config).current() else {
        bail!(
            "{} does not point at a release, run `quire build` first",
            config.build.output.display()
        );
    };
    let release = current
        .path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", current.path.display()))?;

    let toolchain = Toolchain::from_config(config)?;
    log!("deploy"; "release {} → {target}", current.id);

    let status = toolchain.run(
        "[deploy.command]",
        &config.deploy.command,
        &deploy_args(&release, target, passthrough),
    )?;

    if status.success() {
        log!("deploy"; "done");
    } else {
        log!("error"; "deploy command failed ({status})");
    }
    Ok(status)
}
