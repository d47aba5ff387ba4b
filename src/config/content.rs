//! `[content]` section configuration.
//!
//! Where posts and drafts live and how published posts map to routes.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[content]` section in quire.toml - the content corpus layout.
///
/// # Example
/// ```toml
/// [content]
/// posts = "_posts"
/// drafts = "_drafts"
/// extensions = ["md", "markdown"]
/// permalink = "/log/:year/:month/:day/:title"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Published posts, named `YYYY-MM-DD-<title>.<ext>`.
    #[serde(default = "defaults::content::posts")]
    #[educe(Default = defaults::content::posts())]
    pub posts: PathBuf,

    /// Unpublished drafts, no date prefix required.
    #[serde(default = "defaults::content::drafts")]
    #[educe(Default = defaults::content::drafts())]
    pub drafts: PathBuf,

    /// File extensions treated as markdown (without the dot).
    #[serde(default = "defaults::content::extensions")]
    #[educe(Default = defaults::content::extensions())]
    pub extensions: Vec<String>,

    /// Route pattern for published posts.
    ///
    /// Placeholders: `:year`, `:month`, `:day`, `:title`.
    #[serde(default = "defaults::content::permalink")]
    #[educe(Default = defaults::content::permalink())]
    pub permalink: String,
}

impl ContentConfig {
    /// Whether `ext` (without the dot) names a markdown file.
    pub fn is_markdown_ext(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
