//! Content error types.

use thiserror::Error;

/// Problems with a single markdown document or the permalink pattern
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("cannot read file")]
    Io(#[from] std::io::Error),

    #[error("cannot read directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("missing front matter (expected a leading `---` line)")]
    MissingFrontMatter,

    #[error("front matter is not closed by a `---` line")]
    UnterminatedFrontMatter,

    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("file name `{0}` does not start with YYYY-MM-DD-")]
    MissingDatePrefix(String),

    #[error("invalid date `{0}`")]
    InvalidDate(String),

    #[error("missing or empty `title`")]
    MissingTitle,

    #[error("{0}")]
    Permalink(String),
}
