//! `[container]` section configuration.
//!
//! Settings for building the toolchain image that runs the site builder.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[container]` section in quire.toml - toolchain image build.
///
/// # Example
/// ```toml
/// [container]
/// command = ["podman"]
/// dockerfile = "Dockerfile"
/// context = "."
/// tag = "blog-ruby:2.7"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Container tool; `build -f <dockerfile> -t <tag> <context>` is appended.
    #[serde(default = "defaults::container::command")]
    #[educe(Default = defaults::container::command())]
    pub command: Vec<String>,

    /// Dockerfile path, relative to the project root.
    #[serde(default = "defaults::container::dockerfile")]
    #[educe(Default = defaults::container::dockerfile())]
    pub dockerfile: PathBuf,

    /// Build context, relative to the project root.
    #[serde(default = "defaults::container::context")]
    #[educe(Default = defaults::container::context())]
    pub context: PathBuf,

    /// Image tag.
    #[serde(default = "defaults::container::tag")]
    #[educe(Default = defaults::container::tag())]
    pub tag: String,
}
