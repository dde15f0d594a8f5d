//! Staging directory management.
//!
//! The stage is owned by the packager for the duration of one run. Resetting
//! it destroys whatever a previous run left behind.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::ErrorKind;

/// Handles the transient directory that release contents are assembled in.
#[derive(Debug, Clone)]
pub struct Stage {
    path: Utf8PathBuf,
}

impl Stage {
    /// Create a stage rooted at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the staging directory path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Remove any existing entry at the stage path and recreate it empty.
    ///
    /// Directories are removed recursively; a plain file or symlink at the
    /// path is removed as well.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::StageReset`] if removal or creation fails.
    pub fn reset(&self) -> Result<()> {
        self.remove_existing().map_err(|source| self.reset_error(source))?;
        fs::create_dir(&self.path).map_err(|source| self.reset_error(source))?;
        debug!("staging directory {} is ready", self.path);
        Ok(())
    }

    /// Return true when the stage exists and holds no entries.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be read.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(fs::read_dir(&self.path)?.next().is_none())
    }

    fn remove_existing(&self) -> std::io::Result<()> {
        let metadata = match fs::symlink_metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        debug!("removing previous staging contents at {}", self.path);
        if metadata.is_dir() {
            fs::remove_dir_all(&self.path)
        } else {
            fs::remove_file(&self.path)
        }
    }

    fn reset_error(&self, source: std::io::Error) -> PackagerError {
        PackagerError::StageReset {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_root() -> TempDir {
        TempDir::new().expect("temp dir creation succeeds")
    }

    fn stage_in(dir: &TempDir) -> Stage {
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir is UTF-8");
        Stage::new(root.join("release"))
    }

    #[rstest]
    fn reset_creates_missing_stage(temp_root: TempDir) {
        let stage = stage_in(&temp_root);
        assert!(!stage.path().exists());

        stage.reset().expect("reset succeeds");

        assert!(stage.path().is_dir());
        assert!(stage.is_empty().expect("stage readable"));
    }

    #[rstest]
    fn reset_is_idempotent_and_clears_contents(temp_root: TempDir) {
        let stage = stage_in(&temp_root);
        fs::create_dir_all(stage.path().join("data/nested")).expect("seed dirs");
        fs::write(stage.path().join("rendertoy.exe"), b"old").expect("seed file");
        fs::write(stage.path().join("data/nested/shader.glsl"), b"old").expect("seed file");

        stage.reset().expect("first reset succeeds");
        assert!(stage.is_empty().expect("stage readable"));

        fs::write(stage.path().join("leftover.txt"), b"x").expect("seed file");
        stage.reset().expect("second reset succeeds");
        assert!(stage.is_empty().expect("stage readable"));
    }

    #[rstest]
    fn reset_replaces_plain_file(temp_root: TempDir) {
        let stage = stage_in(&temp_root);
        fs::write(stage.path(), b"not a directory").expect("seed file");

        stage.reset().expect("reset succeeds");

        assert!(stage.path().is_dir());
    }

    #[test]
    fn reset_reports_path_on_failure() {
        let stage = Stage::new("/nonexistent-parent-for-packager-tests/release");
        let err = stage.reset().expect_err("reset should fail");
        assert!(matches!(err, PackagerError::StageReset { ref path, .. } if path == stage.path()));
    }
}
