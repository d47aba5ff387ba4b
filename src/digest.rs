//! Content digests of a built site.
//!
//! Two builds of an unchanged corpus must produce the same tree. The digest
//! covers every file's relative path and bytes, visited in sorted order, so
//! it only changes when the served content does.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};
use walkdir::WalkDir;

/// Per-file hashes of a tree plus one hash over all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDigest {
    /// `/`-separated relative path → blake3 of the content
    files: BTreeMap<String, blake3::Hash>,
    root: blake3::Hash,
}

impl TreeDigest {
    /// Hex encoding of the combined hash.
    pub fn hex(&self) -> String {
        hex::encode(self.root.as_bytes())
    }

    /// Short form for logs.
    pub fn short(&self) -> String {
        self.hex()[..12].to_owned()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Relative paths whose content differs, or that exist on one side only.
    pub fn diff(&self, other: &Self) -> Vec<String> {
        let names: BTreeSet<&String> = self.files.keys().chain(other.files.keys()).collect();
        names
            .into_iter()
            .filter(|name| self.files.get(*name) != other.files.get(*name))
            .cloned()
            .collect()
    }
}

/// Hash every file below `root`.
///
/// Symlinks are hashed by their target path, not followed.
pub fn tree_digest(root: &Path) -> Result<TreeDigest> {
    let entries: Vec<_> = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to walk {}", root.display()))?;

    let files: BTreeMap<String, blake3::Hash> = entries
        .par_iter()
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| {
            let path = entry.path();
            let hash = if entry.path_is_symlink() {
                let target = fs::read_link(path)
                    .with_context(|| format!("Failed to read link {}", path.display()))?;
                blake3::hash(target.to_string_lossy().as_bytes())
            } else {
                let content =
                    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
                blake3::hash(&content)
            };
            Ok((relative_name(root, path), hash))
        })
        .collect::<Result<_>>()?;

    let mut hasher = blake3::Hasher::new();
    for (name, hash) in &files {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
    }

    Ok(TreeDigest {
        root: hasher.finalize(),
        files,
    })
}

/// Relative path with `/` separators on every platform.
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    const FILES: &[(&str, &str)] = &[
        ("index.html", "home"),
        ("log/2015/04/28/Play-Typed-Action.html", "post"),
        ("css/main.css", "body{}"),
    ];

    #[test]
    fn test_identical_trees_have_identical_digests() {
        let a = tree_digest(site(FILES).path()).unwrap();
        let b = tree_digest(site(FILES).path()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.hex(), b.hex());
        assert_eq!(a.hex().len(), 64);
        assert_eq!(a.short().len(), 12);
        assert_eq!(a.file_count(), 3);
        assert!(a.diff(&b).is_empty());
    }

    #[test]
    fn test_content_change_is_detected() {
        let a = tree_digest(site(FILES).path()).unwrap();
        let changed = site(&[
            ("index.html", "home"),
            ("log/2015/04/28/Play-Typed-Action.html", "post, edited"),
            ("css/main.css", "body{}"),
        ]);
        let b = tree_digest(changed.path()).unwrap();

        assert_ne!(a.hex(), b.hex());
        assert_eq!(a.diff(&b), ["log/2015/04/28/Play-Typed-Action.html"]);
    }

    #[test]
    fn test_rename_is_detected() {
        let a = tree_digest(site(&[("a.html", "x")]).path()).unwrap();
        let b = tree_digest(site(&[("b.html", "x")]).path()).unwrap();

        assert_ne!(a.hex(), b.hex());
        assert_eq!(a.diff(&b), ["a.html", "b.html"]);
    }

    #[test]
    fn test_empty_directories_do_not_count() {
        let a = site(FILES);
        let b = site(FILES);
        fs::create_dir_all(b.path().join("empty/nested")).unwrap();

        assert_eq!(
            tree_digest(a.path()).unwrap().hex(),
            tree_digest(b.path()).unwrap().hex()
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(tree_digest(&dir.path().join("missing")).is_err());
    }
}
