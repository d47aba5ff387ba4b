//! `[deploy]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[deploy]` section in quire.toml - where the current release is pushed.
///
/// The command receives `<current release>/` and `target` as its last two
/// arguments.
///
/// # Example
/// ```toml
/// [deploy]
/// command = ["rsync", "-az", "--delete"]
/// target = "www@example.com:/srv/blog"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// Deploy command line.
    #[serde(default = "defaults::deploy::command")]
    #[educe(Default = defaults::deploy::command())]
    pub command: Vec<String>,

    /// Destination handed to the deploy command. Required by `deploy`.
    #[serde(default)]
    pub target: Option<String>,
}
