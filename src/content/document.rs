//! A single markdown document: front matter, date, slug.

use super::{ContentError, Permalink};
use crate::config::defaults;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use educe::Educe;
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// `YYYY-MM-DD-<slug>` file stems of published posts.
static RE_DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{2})-(?P<d>[0-9]{2})-(?P<slug>.+)$").unwrap());

/// Where a document sits in the publishing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DocumentKind {
    Post,
    Draft,
}

impl DocumentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Draft => "draft",
        }
    }
}

/// YAML front matter between the leading `---` lines.
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,

    /// Overrides the date taken from the file name.
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub layout: Option<String>,

    /// `published: false` keeps a post out of the site.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub published: bool,

    /// Everything else (tags, categories, custom keys)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

/// A parsed content document.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
    /// File stem without the date prefix; `:title` in permalinks.
    pub slug: String,
    pub date: Option<NaiveDateTime>,
    pub front: FrontMatter,
    /// Whitespace-separated words in the body.
    pub words: usize,
}

impl Document {
    /// Parse `source`, read from `path` inside a directory of `dir_kind` documents.
    pub fn parse(path: &Path, source: &str, dir_kind: DocumentKind) -> Result<Self, ContentError> {
        let (yaml, body) = split_front_matter(source)?;
        let front: FrontMatter = if yaml.trim().is_empty() {
            FrontMatter::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (file_date, slug) = match RE_DATE_PREFIX.captures(&stem) {
            Some(caps) => {
                let date = parse_ymd(&caps["y"], &caps["m"], &caps["d"])
                    .ok_or_else(|| {
                        let ymd = format!("{}-{}-{}", &caps["y"], &caps["m"], &caps["d"]);
                        ContentError::InvalidDate(ymd)
                    })?;
                (Some(date), caps["slug"].to_owned())
            }
            None if dir_kind == DocumentKind::Post => {
                let name = path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                return Err(ContentError::MissingDatePrefix(name));
            }
            None => (None, stem),
        };

        let front_date = front.date.as_deref().map(parse_date).transpose()?;
        let date = front_date.or_else(|| file_date.map(|d| d.and_time(NaiveTime::MIN)));

        if front.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(ContentError::MissingTitle);
        }

        let kind = match dir_kind {
            DocumentKind::Post if !front.published => DocumentKind::Draft,
            kind => kind,
        };

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            slug,
            date,
            words: body.split_whitespace().count(),
            front,
        })
    }

    pub fn title(&self) -> &str {
        self.front.title.as_deref().map_or("", str::trim)
    }

    /// Public route of a published post. Drafts have none.
    pub fn route(&self, permalink: &Permalink) -> Option<String> {
        match (self.kind, self.date) {
            (DocumentKind::Post, Some(date)) => Some(permalink.render(date.date(), &self.slug)),
            _ => None,
        }
    }
}

/// Split a document into its front matter and body.
///
/// The front matter opens with a `---` first line and closes with the next
/// `---` (or `...`) line.
pub fn split_front_matter(source: &str) -> Result<(&str, &str), ContentError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut lines = source.split_inclusive('\n');
    let first = lines.next().ok_or(ContentError::MissingFrontMatter)?;
    if first.trim_end() != "---" {
        return Err(ContentError::MissingFrontMatter);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let yaml = &source[yaml_start..offset];
            let body = &source[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(ContentError::UnterminatedFrontMatter)
}

fn parse_ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// Parse a front matter date in the forms Jekyll accepts.
///
/// Dates with an offset keep their local wall-clock time.
fn parse_date(s: &str) -> Result<NaiveDateTime, ContentError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| ContentError::InvalidDate(s.to_owned()))
}
