//! Site building orchestration.
//!
//! The site generator itself is an external tool (`[build.command]`). Each
//! build writes into a fresh release directory; only a successful build is
//! made current.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── adopt_legacy_output() ──► move an in-place `_site/` into a release
//!     │
//!     ├── build_release()
//!     │       │
//!     │       └── <build.command> --destination .releases/<id> [--drafts] [-- ...]
//!     │           (failure → release discarded, exit code propagated)
//!     │
//!     ├── activate() ──► swap `_site` to the new release
//!     │
//!     └── prune() ──► keep the newest `[build.keep]` releases
//! ```

use crate::{
    cli::BuildArgs,
    config::SiteConfig,
    digest::tree_digest,
    log,
    release::{Release, Releases},
    toolchain::Toolchain,
    utils::command::{filter_args, to_os},
};
use anyhow::{Result, bail};
use std::{ffi::OsString, process::ExitStatus, time::Instant};

/// Result of one builder run.
#[derive(Debug)]
pub enum BuildOutcome {
    /// The tool succeeded; the release holds its output
    Built(Release),
    /// The tool exited unsuccessfully; nothing was activated
    Failed(ExitStatus),
}

/// Arguments appended to `[build.command]` for one release.
fn builder_args(config: &SiteConfig, release: &Release, args: &BuildArgs) -> Vec<OsString> {
    let drafts = args.drafts || config.build.drafts;

    let mut argv = filter_args(&[
        to_os(&config.build.destination_flag),
        to_os(&release.path),
        if drafts {
            to_os(&config.build.drafts_flag)
        } else {
            OsString::new()
        },
    ]);
    argv.extend(args.passthrough.iter().map(to_os));
    argv
}

/// Run the builder into a new, not yet activated release.
///
/// The release is removed again when the tool fails or cannot be started.
pub fn build_release(
    config: &SiteConfig,
    toolchain: &Toolchain,
    releases: &Releases,
    args: &BuildArgs,
) -> Result<BuildOutcome> {
    let release = releases.prepare()?;
    let argv = builder_args(config, &release, args);

    match toolchain.run("[build.command]", &config.build.command, &argv) {
        Ok(status) if status.success() => Ok(BuildOutcome::Built(release)),
        Ok(status) => {
            releases.discard(&release)?;
            Ok(BuildOutcome::Failed(status))
        }
        Err(err) => {
            releases.discard(&release)?;
            Err(err)
        }
    }
}

/// Build the site and make the result current.
pub fn build_site(config: &SiteConfig, args: &BuildArgs) -> Result<BuildOutcome> {
    let toolchain = Toolchain::from_config(config)?;
    let releases = Releases::from_config(config);

    if let Some(adopted) = releases.adopt_legacy_output()? {
        log!("release"; "adopted existing {} as {}", releases.pointer().display(), adopted.id);
    }

    let started = Instant::now();
    log!("build"; "building into a new release...");

    let release = match build_release(config, &toolchain, &releases, args)? {
        BuildOutcome::Built(release) => release,
        BuildOutcome::Failed(status) => {
            log!("error"; "build failed ({status}), current release left untouched");
            return Ok(BuildOutcome::Failed(status));
        }
    };

    if let Err(err) = releases.activate(&release) {
        releases.discard(&release)?;
        return Err(err);
    }
    let digest = tree_digest(&release.path)?;
    log!(
        "build";
        "release {} is live ({} files, digest {}, {:.2}s)",
        release.id,
        digest.file_count(),
        digest.short(),
        started.elapsed().as_secs_f64()
    );

    for pruned in releases.prune(config.build.keep)? {
        log!("release"; "pruned {}", pruned.id);
    }

    Ok(BuildOutcome::Built(release))
}

/// Build twice and require byte-identical output.
///
/// Neither build is activated and both are removed afterwards.
pub fn verify_site(config: &SiteConfig, args: &BuildArgs) -> Result<BuildOutcome> {
    let toolchain = Toolchain::from_config(config)?;
    let releases = Releases::from_config(config);

    log!("verify"; "first build...");
    let first = match build_release(config, &toolchain, &releases, args)? {
        BuildOutcome::Built(release) => release,
        failed => return Ok(failed),
    };

    log!("verify"; "second build...");
    let second = match build_release(config, &toolchain, &releases, args) {
        Ok(BuildOutcome::Built(release)) => release,
        other => {
            releases.discard(&first)?;
            return other;
        }
    };

    let digests = tree_digest(&first.path).and_then(|a| Ok((a, tree_digest(&second.path)?)));
    releases.discard(&first)?;
    releases.discard(&second)?;
    let (a, b) = digests?;

    if a != b {
        let differing = a.diff(&b);
        bail!(
            "builds differ in {} file(s):\n  {}",
            differing.len(),
            differing.join("\n  ")
        );
    }

    log!("verify"; "builds are identical ({} files, digest {})", a.file_count(), a.short());
    Ok(BuildOutcome::Built(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn project(config_toml: &str) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let mut config = SiteConfig::from_str(config_toml).unwrap();
        config.root = root.clone();
        config.build.output = root.join("_site");
        config.build.releases = root.join(".releases");
        (dir, config)
    }

    fn release_in(root: &Path) -> Release {
        Release {
            id: "20150428T000000000".into(),
            path: root.join(".releases/20150428T000000000"),
        }
    }

    #[test]
    fn test_builder_args_default() {
        let (dir, config) = project("");
        let release = release_in(dir.path());
        let argv = builder_args(&config, &release, &BuildArgs::default());

        assert_eq!(argv, [to_os("--destination"), to_os(&release.path)]);
    }

    #[test]
    fn test_builder_args_drafts_and_passthrough() {
        let (dir, config) = project("");
        let release = release_in(dir.path());
        let args = BuildArgs {
            drafts: true,
            passthrough: vec!["--trace".into()],
        };
        let argv = builder_args(&config, &release, &args);

        assert_eq!(
            argv,
            [
                to_os("--destination"),
                to_os(&release.path),
                to_os("--drafts"),
                to_os("--trace"),
            ]
        );
    }

    #[test]
    fn test_builder_args_drafts_from_config() {
        let (dir, config) = project("[build]\ndrafts = true\ndrafts_flag = \"--unpublished\"");
        let argv = builder_args(&config, &release_in(dir.path()), &BuildArgs::default());
        assert_eq!(argv.last(), Some(&to_os("--unpublished")));
    }

    #[cfg(unix)]
    fn fake_builder(script: &str) -> String {
        format!(
            r#"[build]
command = ["sh", "-c", '''
while [ $# -gt 0 ]; do
  if [ "$1" = "--destination" ]; then dest="$2"; shift; fi
  shift
done
{script}
''', "builder"]
"#
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_build_site_activates_release() {
        let (_dir, config) = project(&fake_builder(r#"echo home > "$dest/index.html""#));

        let outcome = build_site(&config, &BuildArgs::default()).unwrap();
        let BuildOutcome::Built(release) = outcome else {
            panic!("build should succeed");
        };

        let served = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert_eq!(served, "home\n");
        assert_eq!(Releases::from_config(&config).current(), Some(release));
    }

    #[cfg(unix)]
    #[test]
    fn test_release_is_discarded_when_activation_fails() {
        // The builder runs in the project root and leaves a real `_site/`
        // behind, which cannot be swapped for a link.
        let (_dir, config) = project(&fake_builder(
            r#"echo home > "$dest/index.html"; mkdir _site"#,
        ));

        let err = build_site(&config, &BuildArgs::default()).unwrap_err();
        assert!(err.to_string().contains("not a release pointer"));

        let releases = Releases::from_config(&config);
        assert!(releases.list().unwrap().is_empty());
        assert!(releases.current().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_build_keeps_current_release() {
        let (_dir, mut config) = project(&fake_builder(r#"echo v1 > "$dest/index.html""#));
        build_site(&config, &BuildArgs::default()).unwrap();
        let releases = Releases::from_config(&config);
        let live = releases.current().unwrap();

        let failing = SiteConfig::from_str(&fake_builder(r#"echo v2 > "$dest/index.html"; exit 4"#))
            .unwrap();
        config.build.command = failing.build.command;

        let outcome = build_site(&config, &BuildArgs::default()).unwrap();
        let BuildOutcome::Failed(status) = outcome else {
            panic!("build should fail");
        };
        assert_eq!(status.code(), Some(4));

        assert_eq!(releases.current(), Some(live));
        assert_eq!(releases.list().unwrap().len(), 1);
        let served = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert_eq!(served, "v1\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_identical_builds() {
        let (_dir, config) = project(&fake_builder(r#"echo same > "$dest/index.html""#));

        let outcome = verify_site(&config, &BuildArgs::default()).unwrap();
        assert!(matches!(outcome, BuildOutcome::Built(_)));

        let releases = Releases::from_config(&config);
        assert!(releases.list().unwrap().is_empty());
        assert!(releases.current().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_detects_nondeterminism() {
        let (_dir, config) = project(&fake_builder(
            r#"echo same > "$dest/index.html"; basename "$dest" > "$dest/stamp.txt""#,
        ));

        let err = verify_site(&config, &BuildArgs::default()).unwrap_err();
        assert!(err.to_string().contains("stamp.txt"));
        assert!(Releases::from_config(&config).list().unwrap().is_empty());
    }
}
