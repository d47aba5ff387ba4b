//! The content corpus: published posts and drafts.
//!
//! quire never renders markdown (the site builder does). It reads the corpus
//! to list documents, validate their front matter, and compute the route
//! every published post is expected to have in the built site.
//!
//! ```text
//! _posts/2015-04-28-Play-Typed-Action.md  ──►  /log/2015/04/28/Play-Typed-Action
//! _drafts/actors.md                       ──►  (no route)
//! ```

mod document;
mod error;
mod permalink;

pub use document::{Document, DocumentKind};
pub use error::ContentError;
pub use permalink::Permalink;

use crate::config::SiteConfig;
use anyhow::Result;
use rayon::prelude::*;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Every document found under the posts and drafts directories.
#[derive(Debug)]
pub struct Corpus {
    permalink: Permalink,
    /// Posts newest first, then drafts by path.
    documents: Vec<Document>,
    /// Files that could not be parsed. They do not hide the others.
    errors: Vec<(PathBuf, ContentError)>,
}

impl Corpus {
    /// Load and parse all markdown files of the configured corpus.
    pub fn load(config: &SiteConfig) -> Result<Self> {
        let permalink: Permalink = config.content.permalink.parse()?;

        let mut errors = Vec::new();
        let posts = collect_markdown(&config.content.posts, config, &mut errors);
        let drafts = collect_markdown(&config.content.drafts, config, &mut errors);

        let files: Vec<_> = posts
            .into_iter()
            .map(|path| (path, DocumentKind::Post))
            .chain(drafts.into_iter().map(|path| (path, DocumentKind::Draft)))
            .collect();

        let parsed: Vec<_> = files
            .into_par_iter()
            .map(|(path, kind)| {
                let result = fs::read_to_string(&path)
                    .map_err(ContentError::from)
                    .and_then(|source| Document::parse(&path, &source, kind));
                (path, result)
            })
            .collect();

        let mut documents = Vec::with_capacity(parsed.len());
        for (path, result) in parsed {
            match result {
                Ok(doc) => documents.push(doc),
                Err(err) => errors.push((path, err)),
            }
        }

        documents.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| b.date.cmp(&a.date))
                .then_with(|| a.path.cmp(&b.path))
        });

        Ok(Self {
            permalink,
            documents,
            errors,
        })
    }

    /// Published posts, newest first.
    pub fn posts(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .filter(|doc| doc.kind == DocumentKind::Post)
    }

    /// Drafts, including posts marked `published: false`.
    pub fn drafts(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .filter(|doc| doc.kind == DocumentKind::Draft)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn errors(&self) -> &[(PathBuf, ContentError)] {
        &self.errors
    }

    /// Route of a document under the configured permalink.
    pub fn route(&self, doc: &Document) -> Option<String> {
        doc.route(&self.permalink)
    }

    /// Routes claimed by more than one post, with the posts claiming them.
    pub fn route_conflicts(&self) -> Vec<(String, Vec<&Document>)> {
        let mut by_route: HashMap<String, Vec<&Document>> = HashMap::new();
        for doc in self.posts() {
            if let Some(route) = self.route(doc) {
                by_route.entry(route).or_default().push(doc);
            }
        }

        let mut conflicts: Vec<_> = by_route
            .into_iter()
            .filter(|(_, docs)| docs.len() > 1)
            .collect();
        conflicts.sort_by(|a, b| a.0.cmp(&b.0));
        conflicts
    }
}

/// Collect markdown files under `dir`, skipping hidden entries.
///
/// A missing directory yields nothing. Entries that cannot be read are
/// pushed to `errors` so they show up next to parse errors.
fn collect_markdown(
    dir: &Path,
    config: &SiteConfig,
    errors: &mut Vec<(PathBuf, ContentError)>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 && is_not_found(&err) => continue,
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                errors.push((path, ContentError::from(err)));
                continue;
            }
        };

        let is_markdown = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.content.is_markdown_ext(ext));
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }

    files
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(dir: &TempDir) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.content.posts = dir.path().join("_posts");
        config.content.drafts = dir.path().join("_drafts");
        config
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_corpus() {
        let dir = TempDir::new().unwrap();
        write(&dir, "_posts/2015-04-28-Play-Typed-Action.md", "---\ntitle: Play\n---\n");
        write(&dir, "_posts/2016-01-03-futures.markdown", "---\ntitle: Futures\n---\n");
        write(&dir, "_posts/2016-02-01-later.md", "---\ntitle: Later\npublished: false\n---\n");
        write(&dir, "_drafts/actors.md", "---\ntitle: Actors\n---\n");
        write(&dir, "_posts/notes.txt", "not markdown");
        write(&dir, "_posts/.2015-01-01-hidden.md", "---\ntitle: Hidden\n---\n");

        let corpus = Corpus::load(&site(&dir)).unwrap();

        let posts: Vec<_> = corpus.posts().map(|d| d.slug.as_str()).collect();
        assert_eq!(posts, ["futures", "Play-Typed-Action"]);

        let drafts: Vec<_> = corpus.drafts().map(|d| d.slug.as_str()).collect();
        assert_eq!(drafts, ["later", "actors"]);

        assert!(corpus.errors().is_empty());
        assert_eq!(corpus.documents().len(), 4);
    }

    #[test]
    fn test_bad_file_does_not_hide_others() {
        let dir = TempDir::new().unwrap();
        write(&dir, "_posts/2015-04-28-good.md", "---\ntitle: Good\n---\n");
        write(&dir, "_posts/undated.md", "---\ntitle: Undated\n---\n");
        write(&dir, "_posts/2015-04-29-no-front.md", "# just markdown\n");

        let corpus = Corpus::load(&site(&dir)).unwrap();

        assert_eq!(corpus.posts().count(), 1);
        assert_eq!(corpus.errors().len(), 2);
    }

    #[test]
    fn test_missing_directories() {
        let dir = TempDir::new().unwrap();
        let corpus = Corpus::load(&site(&dir)).unwrap();

        assert!(corpus.documents().is_empty());
        assert!(corpus.errors().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(&dir, "_posts/2015-04-28-good.md", "---\ntitle: Good\n---\n");
        write(&dir, "_posts/2015/2015-04-29-hidden.md", "---\ntitle: Hidden\n---\n");
        let locked = dir.path().join("_posts/2015");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let corpus = Corpus::load(&site(&dir)).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(corpus.posts().count(), 1);
        assert_eq!(corpus.errors().len(), 1);
        let (path, err) = &corpus.errors()[0];
        assert_eq!(path, &locked);
        assert!(matches!(err, ContentError::Walk(_)));
    }

    #[test]
    fn test_route_conflicts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "_posts/2015-04-28-same.md", "---\ntitle: A\n---\n");
        write(&dir, "_posts/2015/2015-04-28-same.md", "---\ntitle: B\n---\n");
        write(&dir, "_posts/2015-04-27-moved.md", "---\ntitle: C\ndate: 2015-04-28\n---\n");
        write(&dir, "_posts/2015-04-28-moved.md", "---\ntitle: D\n---\n");
        write(&dir, "_posts/2015-04-28-alone.md", "---\ntitle: E\n---\n");

        let corpus = Corpus::load(&site(&dir)).unwrap();
        let conflicts = corpus.route_conflicts();

        let routes: Vec<_> = conflicts.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(routes, ["/log/2015/04/28/moved", "/log/2015/04/28/same"]);
        assert!(conflicts.iter().all(|(_, docs)| docs.len() == 2));
    }
}
