//! `[build]` section configuration.
//!
//! How the site builder is invoked and where releases are kept.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[build]` section in quire.toml - site builder and release settings.
///
/// # Example
/// ```toml
/// [build]
/// command = ["bundle", "exec", "jekyll", "build"]
/// destination_flag = "--destination"
/// output = "_site"       # pointer to the current release
/// releases = ".releases" # one directory per build
/// keep = 5
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Site builder command line; the release directory is appended.
    #[serde(default = "defaults::build::command")]
    #[educe(Default = defaults::build::command())]
    pub command: Vec<String>,

    /// Flag that introduces the output directory for the site builder.
    #[serde(default = "defaults::build::destination_flag")]
    #[educe(Default = defaults::build::destination_flag())]
    pub destination_flag: String,

    /// Flag that asks the site builder to render drafts.
    #[serde(default = "defaults::build::drafts_flag")]
    #[educe(Default = defaults::build::drafts_flag())]
    pub drafts_flag: String,

    /// Always render drafts, as if `--drafts` were given.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub drafts: bool,

    /// Path served to visitors. A symlink to the current release.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Directory holding one subdirectory per release.
    #[serde(default = "defaults::build::releases")]
    #[educe(Default = defaults::build::releases())]
    pub releases: PathBuf,

    /// Number of releases kept after a successful build (current included).
    #[serde(default = "defaults::build::keep")]
    #[educe(Default = defaults::build::keep())]
    pub keep: usize,
}
