//! Immutable, versioned releases of the built site.
//!
//! Every build writes into a fresh directory under `[build.releases]`. Once
//! the build succeeds, the output path (`[build.output]`, `_site` by default)
//! is re-pointed at it with a symlink swap, so a request never sees a
//! half-written site and a failed build leaves the live one untouched.
//!
//! ```text
//! _site ──► .releases/20240501T101500123
//!           .releases/20240430T220012871
//!           .releases/20240429T081133004
//! ```

use crate::config::SiteConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Release pointer errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("`{0}` is a real directory, not a release pointer")]
    PointerIsDirectory(PathBuf),

    #[error("`{0}` has no file name")]
    InvalidPointer(PathBuf),
}

/// One built artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Directory name, a UTC timestamp (`YYYYMMDDTHHMMSSfff[-n]`)
    pub id: String,
    pub path: PathBuf,
}

/// The releases directory and the pointer naming the current release.
#[derive(Debug, Clone)]
pub struct Releases {
    dir: PathBuf,
    pointer: PathBuf,
}

impl Releases {
    pub fn new(dir: impl Into<PathBuf>, pointer: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pointer: pointer.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(&config.build.releases, &config.build.output)
    }

    pub fn pointer(&self) -> &Path {
        &self.pointer
    }

    /// Create an empty directory for a new release.
    pub fn prepare(&self) -> Result<Release> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f").to_string();
        let mut attempt = 0u32;
        loop {
            let id = release_id(&stamp, attempt);
            let path = self.dir.join(&id);
            match fs::create_dir(&path) {
                Ok(()) => return Ok(Release { id, path }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to create {}", path.display()));
                }
            }
        }
    }

    /// Make `release` current by atomically re-pointing the output path.
    pub fn activate(&self, release: &Release) -> Result<()> {
        if is_real_dir(&self.pointer) {
            return Err(ReleaseError::PointerIsDirectory(self.pointer.clone()).into());
        }

        let name = self
            .pointer
            .file_name()
            .ok_or_else(|| ReleaseError::InvalidPointer(self.pointer.clone()))?;
        let parent = self.pointer.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        // Relative targets keep the project movable
        let target = release
            .path
            .strip_prefix(parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| release.path.clone());

        let swap = parent.join(format!(
            ".{}.{}.swap",
            name.to_string_lossy(),
            std::process::id()
        ));
        remove_link(&swap).ok();

        symlink_dir(&target, &swap)
            .with_context(|| format!("Failed to link {}", swap.display()))?;
        replace_link(&swap, &self.pointer)
            .with_context(|| format!("Failed to re-point {}", self.pointer.display()))?;

        Ok(())
    }

    /// Remove a release that never became current (failed or scratch build).
    pub fn discard(&self, release: &Release) -> Result<()> {
        match fs::remove_dir_all(&release.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err)
                .with_context(|| format!("Failed to remove {}", release.path.display())),
            _ => Ok(()),
        }
    }

    /// The release the pointer names, if it is a release of ours.
    pub fn current(&self) -> Option<Release> {
        let target = fs::read_link(&self.pointer).ok()?;
        let id = target.file_name()?.to_string_lossy().into_owned();
        let path = self.dir.join(&id);
        path.is_dir().then_some(Release { id, path })
    }

    /// All releases, oldest first.
    pub fn list(&self) -> Result<Vec<Release>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", self.dir.display()));
            }
        };

        let mut releases: Vec<_> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| {
                let id = entry.file_name().into_string().ok()?;
                (!id.starts_with('.')).then(|| Release {
                    path: entry.path(),
                    id,
                })
            })
            .collect();

        releases.sort_by(|a, b| sort_key(&a.id).cmp(&sort_key(&b.id)));
        Ok(releases)
    }

    /// Delete the oldest releases until at most `keep` remain.
    ///
    /// The current release is never deleted and always counts as kept.
    pub fn prune(&self, keep: usize) -> Result<Vec<Release>> {
        let keep = keep.max(1);
        let current = self.current();
        let releases = self.list()?;

        let mut excess = releases.len().saturating_sub(keep);
        let mut removed = Vec::new();
        for release in releases {
            if excess == 0 {
                break;
            }
            if current.as_ref() == Some(&release) {
                continue;
            }
            self.discard(&release)?;
            removed.push(release);
            excess -= 1;
        }

        Ok(removed)
    }

    /// Move an output directory left by an in-place build into the releases
    /// directory and point at it.
    pub fn adopt_legacy_output(&self) -> Result<Option<Release>> {
        if !is_real_dir(&self.pointer) {
            return Ok(None);
        }

        let placeholder = self.prepare()?;
        fs::remove_dir(&placeholder.path)
            .with_context(|| format!("Failed to remove {}", placeholder.path.display()))?;
        fs::rename(&self.pointer, &placeholder.path).with_context(|| {
            format!(
                "Failed to move {} to {}",
                self.pointer.display(),
                placeholder.path.display()
            )
        })?;

        self.activate(&placeholder)?;
        Ok(Some(placeholder))
    }

    /// Remove the pointer and every release.
    pub fn clean(&self) -> Result<()> {
        if is_real_dir(&self.pointer) {
            fs::remove_dir_all(&self.pointer)
                .with_context(|| format!("Failed to remove {}", self.pointer.display()))?;
        } else if fs::symlink_metadata(&self.pointer).is_ok() {
            remove_link(&self.pointer)
                .with_context(|| format!("Failed to remove {}", self.pointer.display()))?;
        }

        match fs::remove_dir_all(&self.dir) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => {
                Err(err).with_context(|| format!("Failed to remove {}", self.dir.display()))
            }
            _ => Ok(()),
        }
    }
}

fn release_id(stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        stamp.to_owned()
    } else {
        format!("{stamp}-{attempt}")
    }
}

/// Order ids by timestamp, then by collision counter numerically.
fn sort_key(id: &str) -> (&str, u32) {
    match id.split_once('-') {
        Some((stamp, n)) => (stamp, n.parse().unwrap_or(0)),
        None => (id, 0),
    }
}

/// A directory that is not reached through a symlink.
fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_dir(link)
}

/// `rename(2)` replaces the old link in one step.
#[cfg(unix)]
fn replace_link(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

/// Windows cannot rename over a directory link; there is a short window
/// without a pointer.
#[cfg(windows)]
fn replace_link(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(to).is_ok() {
        fs::remove_dir(to)?;
    }
    fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn releases(dir: &TempDir) -> Releases {
        Releases::new(dir.path().join(".releases"), dir.path().join("_site"))
    }

    fn release_with_index(releases: &Releases, body: &str) -> Release {
        let release = releases.prepare().unwrap();
        fs::write(release.path.join("index.html"), body).unwrap();
        release
    }

    #[test]
    fn test_prepare_creates_unique_dirs() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);

        let a = releases.prepare().unwrap();
        let b = releases.prepare().unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.path.is_dir() && b.path.is_dir());
        assert_eq!(releases.list().unwrap(), [a, b]);
    }

    #[test]
    fn test_sort_key_orders_collisions_numerically() {
        let mut ids = vec!["20240101T000000000-10", "20240101T000000000-2", "20240101T000000000"];
        ids.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        assert_eq!(
            ids,
            ["20240101T000000000", "20240101T000000000-2", "20240101T000000000-10"]
        );
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(releases(&dir).list().unwrap().is_empty());
        assert!(releases(&dir).current().is_none());
    }

    #[test]
    fn test_discard_missing_release_is_ok() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);
        let release = releases.prepare().unwrap();

        releases.discard(&release).unwrap();
        assert!(!release.path.exists());
        releases.discard(&release).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_activate_swaps_pointer() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);

        let first = release_with_index(&releases, "first");
        releases.activate(&first).unwrap();
        assert_eq!(releases.current(), Some(first.clone()));
        assert_eq!(fs::read_to_string(dir.path().join("_site/index.html")).unwrap(), "first");

        let second = release_with_index(&releases, "second");
        releases.activate(&second).unwrap();
        assert_eq!(releases.current(), Some(second));
        assert_eq!(fs::read_to_string(dir.path().join("_site/index.html")).unwrap(), "second");

        // The link is relative to its parent directory
        let target = fs::read_link(dir.path().join("_site")).unwrap();
        assert!(target.is_relative());

        // No swap links are left behind
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".swap"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_prune_keeps_current_and_newest() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);

        let all: Vec<_> = (0..4).map(|i| release_with_index(&releases, &i.to_string())).collect();
        // Roll back to the oldest release, then prune to two
        releases.activate(&all[0]).unwrap();

        let removed = releases.prune(2).unwrap();
        assert_eq!(removed, [all[1].clone(), all[2].clone()]);
        assert_eq!(releases.list().unwrap(), [all[0].clone(), all[3].clone()]);
        assert_eq!(releases.current(), Some(all[0].clone()));
    }

    #[cfg(unix)]
    #[test]
    fn test_prune_zero_keeps_current() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);

        let old = release_with_index(&releases, "old");
        let new = release_with_index(&releases, "new");
        releases.activate(&new).unwrap();

        assert_eq!(releases.prune(0).unwrap(), [old]);
        assert_eq!(releases.list().unwrap(), [new]);
    }

    #[cfg(unix)]
    #[test]
    fn test_activate_refuses_real_directory() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);
        fs::create_dir(dir.path().join("_site")).unwrap();

        let release = releases.prepare().unwrap();
        let err = releases.activate(&release).unwrap_err();
        assert!(err.downcast_ref::<ReleaseError>().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_adopt_legacy_output() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);
        fs::create_dir(dir.path().join("_site")).unwrap();
        fs::write(dir.path().join("_site/index.html"), "legacy").unwrap();

        let adopted = releases.adopt_legacy_output().unwrap().unwrap();
        assert_eq!(releases.current(), Some(adopted.clone()));
        assert_eq!(fs::read_to_string(adopted.path.join("index.html")).unwrap(), "legacy");
        assert_eq!(fs::read_to_string(dir.path().join("_site/index.html")).unwrap(), "legacy");

        // Already a pointer: nothing to adopt
        assert!(releases.adopt_legacy_output().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_removes_pointer_and_releases() {
        let dir = TempDir::new().unwrap();
        let releases = releases(&dir);
        let release = release_with_index(&releases, "x");
        releases.activate(&release).unwrap();

        releases.clean().unwrap();
        assert!(fs::symlink_metadata(dir.path().join("_site")).is_err());
        assert!(!dir.path().join(".releases").exists());

        // Cleaning twice is fine
        releases.clean().unwrap();
    }
}
