//! Corpus validation and listings.
//!
//! `check` parses every document, looks for posts sharing a route, and,
//! when a release is current, asks the resolver for every post route. A
//! route that only reaches the fallback page is a broken link: the server
//! would still answer 200, but with the home page.

use crate::{
    config::SiteConfig,
    content::{Corpus, Document},
    log,
    release::Releases,
    resolve::{Resolution, resolve},
};
use anyhow::Result;
use std::path::Path;

/// Problems found by [`check_site`].
#[derive(Debug, Default)]
pub struct CheckReport {
    pub documents: usize,
    pub parse_errors: usize,
    pub route_conflicts: usize,
    /// Post routes missing from the current release
    pub broken_routes: Vec<String>,
    /// Whether a current release was available to check routes against
    pub checked_release: bool,
}

impl CheckReport {
    pub fn problems(&self) -> usize {
        self.parse_errors + self.route_conflicts + self.broken_routes.len()
    }

    pub fn is_ok(&self) -> bool {
        self.problems() == 0
    }
}

/// Validate the corpus and, if possible, the current release.
pub fn check_site(config: &SiteConfig) -> Result<CheckReport> {
    let corpus = Corpus::load(config)?;
    let mut report = CheckReport {
        documents: corpus.documents().len(),
        ..CheckReport::default()
    };

    for (path, err) in corpus.errors() {
        log!("error"; "{}: {err}", display_path(config, path));
        report.parse_errors += 1;
    }

    for (route, docs) in corpus.route_conflicts() {
        let paths: Vec<_> = docs.iter().map(|doc| display_path(config, &doc.path)).collect();
        log!("error"; "{route} is claimed by {}", paths.join(", "));
        report.route_conflicts += 1;
    }

    match Releases::from_config(config).current() {
        Some(release) => {
            report.checked_release = true;
            for (route, doc) in broken_routes(&corpus, &release.path) {
                log!("error"; "{route} ({}) is not in release {}", display_path(config, &doc.path), release.id);
                report.broken_routes.push(route);
            }
        }
        None => log!("warn"; "no current release, skipping route check"),
    }

    if report.is_ok() {
        log!("check"; "{} documents, no problems", report.documents);
    } else {
        log!("check"; "{} documents, {} problem(s)", report.documents, report.problems());
    }
    Ok(report)
}

/// Post routes that resolve to the fallback page under `release`.
fn broken_routes<'a>(corpus: &'a Corpus, release: &Path) -> Vec<(String, &'a Document)> {
    corpus
        .posts()
        .filter_map(|doc| {
            let route = corpus.route(doc)?;
            let resolution = resolve(release, route.trim_matches('/'));
            matches!(resolution, Resolution::FallbackNotFound).then_some((route, doc))
        })
        .collect()
}

/// Print documents with their routes, newest first.
pub fn list_posts(config: &SiteConfig, drafts: bool) -> Result<()> {
    let corpus = Corpus::load(config)?;

    for doc in corpus.posts() {
        let date = doc.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let route = corpus.route(doc).unwrap_or_default();
        println!("{date:<10}  {:<5}  {route}  {}", doc.kind.as_str(), doc.title());
    }
    if drafts {
        for doc in corpus.drafts() {
            println!(
                "{:<10}  {:<5}  {}  {}",
                "-",
                doc.kind.as_str(),
                display_path(config, &doc.path),
                doc.title()
            );
        }
    }

    for (path, err) in corpus.errors() {
        log!("warn"; "{}: {err}", display_path(config, path));
    }
    Ok(())
}

/// Print releases oldest first, marking the current one.
pub fn list_releases(config: &SiteConfig) -> Result<()> {
    let releases = Releases::from_config(config);
    let current = releases.current();
    let all = releases.list()?;

    if all.is_empty() {
        log!("release"; "no releases yet");
        return Ok(());
    }

    for release in &all {
        let marker = if current.as_ref() == Some(release) { "*" } else { " " };
        println!("{marker} {}", release.id);
    }
    Ok(())
}

/// Path relative to the project root, for messages.
fn display_path(config: &SiteConfig, path: &Path) -> String {
    path.strip_prefix(config.get_root())
        .unwrap_or(path)
        .display()
        .to_string()
}
