//! Request path → file resolution for the built site.
//!
//! Rules are tried in order, first match wins:
//!
//! | # | Candidate            | Outcome                 |
//! |---|----------------------|-------------------------|
//! | 1 | `root/P`             | [`Resolution::Exact`]          |
//! | 2 | `root/P.html`        | [`Resolution::HtmlSuffix`]     |
//! | 3 | `root/P/index.html`  | [`Resolution::DirectoryIndex`] |
//! | 4 | `root/index.html`    | [`Resolution::FallbackNotFound`] |
//!
//! The visitor always gets a page with a success status. Rule 3 on `/` and
//! rule 4 serve the same bytes, but they are different outcomes: the first is
//! real traffic to the home page, the second a broken link.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Directory index and fallback page name
pub const INDEX_FILE: &str = "index.html";

/// Content type of every fallback response, whatever page is shown.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Served when the fallback page itself cannot be read.
const FALLBACK_TEMPLATE: &str = include_str!("embed/fallback.html");

/// Which rule matched a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `root/P` is a file.
    Exact(PathBuf),
    /// `root/P.html` is a file.
    HtmlSuffix(PathBuf),
    /// `root/P/index.html` is a file.
    DirectoryIndex(PathBuf),
    /// Nothing matched; the root index page stands in.
    FallbackNotFound,
}

impl Resolution {
    /// The matched file, `None` for the fallback.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Exact(path) | Self::HtmlSuffix(path) | Self::DirectoryIndex(path) => Some(path),
            Self::FallbackNotFound => None,
        }
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackNotFound)
    }

    /// Short rule name for logs.
    pub const fn rule(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::HtmlSuffix(_) => "html",
            Self::DirectoryIndex(_) => "index",
            Self::FallbackNotFound => "fallback",
        }
    }
}

/// Response body and content type for a resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Resolve a normalized request path (see [`normalize_request_path`]) under `root`.
///
/// Paths that try to leave the root never touch the disk. File system
/// errors count as "no match".
pub fn resolve(root: &Path, request_path: &str) -> Resolution {
    if !is_contained(request_path) {
        return Resolution::FallbackNotFound;
    }

    // `/` is the root directory itself, only the index rule applies
    if request_path.is_empty() {
        let index = root.join(INDEX_FILE);
        return if index.is_file() {
            Resolution::DirectoryIndex(index)
        } else {
            Resolution::FallbackNotFound
        };
    }

    let exact = root.join(request_path);
    if exact.is_file() {
        return Resolution::Exact(exact);
    }

    let html = root.join(format!("{request_path}.html"));
    if html.is_file() {
        return Resolution::HtmlSuffix(html);
    }

    let index = exact.join(INDEX_FILE);
    if index.is_file() {
        return Resolution::DirectoryIndex(index);
    }

    Resolution::FallbackNotFound
}

/// Resolve and read a request in one step.
///
/// A matched file that cannot be read (removed between the lookup and the
/// read) is downgraded to the fallback, so the returned resolution always
/// describes the bytes in the page.
pub fn lookup(root: &Path, request_path: &str) -> (Resolution, Page) {
    let resolution = resolve(root, request_path);

    if let Some(path) = resolution.file()
        && let Ok(body) = fs::read(path)
    {
        let page = Page {
            body,
            content_type: guess_content_type(path),
        };
        return (resolution, page);
    }

    (Resolution::FallbackNotFound, fallback_page(root))
}

/// The root index page as HTML, or the embedded page if it is unreadable.
pub fn fallback_page(root: &Path) -> Page {
    let body = fs::read(root.join(INDEX_FILE))
        .unwrap_or_else(|_| FALLBACK_TEMPLATE.as_bytes().to_vec());
    Page {
        body,
        content_type: HTML_CONTENT_TYPE,
    }
}

/// Turn a raw request URL into the path [`resolve`] expects.
///
/// Drops the query string and fragment, decodes percent escapes, and trims
/// leading and trailing slashes. `"/log/a%20b/?x=1"` becomes `"log/a b"`.
pub fn normalize_request_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_owned());
    decoded.trim_matches('/').to_owned()
}

/// Whether a relative request path stays inside the root.
fn is_contained(request_path: &str) -> bool {
    !request_path.contains('\0')
        && !request_path.contains('\\')
        && Path::new(request_path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => HTML_CONTENT_TYPE,
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("atom") => "application/atom+xml; charset=utf-8",
        Some("rss") => "application/rss+xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md" | "markdown") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}
