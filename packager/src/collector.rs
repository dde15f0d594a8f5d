//! Artefact collection into the staging directory.
//!
//! Copies run in order and independently: a failure partway leaves the stage
//! partially populated.

use crate::config::ensure_subpath;
use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use std::fs;
use walkdir::WalkDir;

/// An item copied into the release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A single file copied into the stage root under its own file name.
    File {
        /// Source file, relative to the project root.
        source: Utf8PathBuf,
    },
    /// A directory tree copied to a subdirectory of the stage.
    Tree {
        /// Source directory, relative to the project root.
        source: Utf8PathBuf,
        /// Destination, relative to the stage.
        dest: Utf8PathBuf,
    },
}

impl Artifact {
    /// Return the source path of the artefact.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        match self {
            Self::File { source } | Self::Tree { source, .. } => source,
        }
    }
}

/// Copies artefacts from a project root into a staging directory.
#[derive(Debug, Clone)]
pub struct Collector {
    root: Utf8PathBuf,
    stage_dir: Utf8PathBuf,
}

impl Collector {
    /// Create a collector resolving sources against `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, stage_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            stage_dir: stage_dir.into(),
        }
    }

    /// Copy one artefact into the stage and return its staged path.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::MissingSource`] if the source does not exist,
    /// [`PackagerError::UnsafePath`] if a tree destination leaves the stage,
    /// [`PackagerError::DestinationExists`] if a tree destination is already
    /// present, or [`PackagerError::Copy`] if copying fails.
    pub fn collect(&self, artifact: &Artifact) -> Result<Utf8PathBuf> {
        match artifact {
            Artifact::File { source } => self.collect_file(source),
            Artifact::Tree { source, dest } => {
                ensure_subpath("tree destination", dest)?;
                let from = self.root.join(source);
                let to = self.stage_dir.join(dest);
                let copied = copy_tree(&from, &to)?;
                debug!("copied {copied} file(s) from {from} to {to}");
                Ok(to)
            }
        }
    }

    /// Copy every artefact in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Collector::collect`].
    pub fn collect_all(&self, artifacts: &[Artifact]) -> Result<Vec<Utf8PathBuf>> {
        artifacts.iter().map(|a| self.collect(a)).collect()
    }

    fn collect_file(&self, source: &Utf8Path) -> Result<Utf8PathBuf> {
        let from = self.root.join(source);
        if !from.is_file() {
            return Err(PackagerError::MissingSource { path: from });
        }
        let file_name = from
            .file_name()
            .ok_or_else(|| PackagerError::MissingSource { path: from.clone() })?;
        let to = self.stage_dir.join(file_name);

        copy_file(&from, &to)?;
        debug!("copied {from} to {to}");
        Ok(to)
    }
}

/// Recursively copy the directory `source` to `dest`.
///
/// `dest` must not exist yet. Symlinks inside the tree are followed and their
/// targets copied. Returns the number of files copied.
///
/// # Errors
///
/// Returns [`PackagerError::MissingSource`] if `source` is not a directory,
/// [`PackagerError::DestinationExists`] if `dest` exists, or
/// [`PackagerError::Copy`] if any entry cannot be copied.
pub fn copy_tree(source: &Utf8Path, dest: &Utf8Path) -> Result<usize> {
    if !source.is_dir() {
        return Err(PackagerError::MissingSource {
            path: source.to_owned(),
        });
    }
    if fs::symlink_metadata(dest).is_ok() {
        return Err(PackagerError::DestinationExists {
            path: dest.to_owned(),
        });
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| copy_error(source, dest, e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| non_utf8(entry.path()))?;
        let relative = Utf8Path::from_path(relative).ok_or_else(|| non_utf8(entry.path()))?;
        let target = dest.join(relative);
        let from = Utf8Path::from_path(entry.path()).ok_or_else(|| non_utf8(entry.path()))?;

        if entry.file_type().is_dir() {
            trace!("creating {target}");
            fs::create_dir_all(&target).map_err(|e| copy_error(from, &target, e))?;
        } else {
            copy_file(from, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    trace!("copying {from} to {to}");
    fs::copy(from, to).map_err(|e| copy_error(from, to, e))?;
    Ok(())
}

fn copy_error(from: &Utf8Path, to: &Utf8Path, source: std::io::Error) -> PackagerError {
    PackagerError::Copy {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    }
}

fn non_utf8(path: &std::path::Path) -> PackagerError {
    PackagerError::NonUtf8Path {
        path: path.display().to_string(),
    }
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
