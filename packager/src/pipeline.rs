//! Release pipeline orchestration.
//!
//! The steps run strictly in order: reset the stage, run the build tool,
//! collect artefacts, write the archive. The first error aborts the run and
//! leaves the stage as the last completed step left it.

use crate::archive::{ArchiveSummary, create_archive, verify_archive};
use crate::builder::{BuildInvoker, BuildOutcome, CommandExecutor};
use crate::collector::{Artifact, Collector};
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::naming::ArchiveName;
use crate::stage::Stage;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use serde::Serialize;

/// Switches that change which steps run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Package existing build output without running the build tool.
    pub skip_build: bool,
    /// Re-read the archive and compare it with the stage after writing.
    pub verify: bool,
}

/// A pipeline step, reported as it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Removing and recreating the staging directory.
    ResetStage,
    /// Running the external build tool.
    Build,
    /// Copying artefacts into the stage.
    Collect,
    /// Writing the zip archive.
    Archive,
    /// Comparing the archive with the stage.
    Verify,
}

/// Result of a completed release run.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutput {
    /// Whether the build tool succeeded; `None` when the build was skipped.
    pub build_succeeded: Option<bool>,
    /// Paths created directly inside the stage, one per artefact.
    pub staged: Vec<Utf8PathBuf>,
    /// The written archive.
    pub archive: ArchiveSummary,
    /// Number of files checked against the stage, when verification ran.
    pub verified_files: Option<usize>,
}

/// A release run for one project root.
pub struct Pipeline<'a> {
    root: Utf8PathBuf,
    config: &'a ReleaseConfig,
    executor: &'a dyn CommandExecutor,
    stage: Stage,
    archive_name: ArchiveName,
}

impl<'a> Pipeline<'a> {
    /// Prepare a pipeline for the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PackagerError::UnsafePath`] if the stage or a
    /// tree destination would leave its base directory, or
    /// [`crate::error::PackagerError::InvalidName`] if the configured archive
    /// name is unusable.
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        config: &'a ReleaseConfig,
        executor: &'a dyn CommandExecutor,
    ) -> Result<Self> {
        config.validate()?;
        let root = root.into();
        let stage = Stage::new(root.join(&config.stage.dir));
        let archive_name = config.archive_name()?;
        Ok(Self {
            root,
            config,
            executor,
            stage,
            archive_name,
        })
    }

    /// Return the project root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Return the staging directory handler.
    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Return the archive name.
    #[must_use]
    pub fn archive_name(&self) -> &ArchiveName {
        &self.archive_name
    }

    /// Return where the archive will be written.
    #[must_use]
    pub fn archive_path(&self) -> Utf8PathBuf {
        self.root.join(self.archive_name.filename())
    }

    /// Return the build invoker for this project.
    #[must_use]
    pub fn build_invoker(&self) -> BuildInvoker<'_> {
        BuildInvoker::new(self.root.clone(), &self.config.build, self.executor)
    }

    /// Return the artefacts to collect.
    #[must_use]
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.config.artifacts()
    }

    /// Remove and recreate the staging directory.
    ///
    /// # Errors
    ///
    /// See [`Stage::reset`].
    pub fn reset_stage(&self) -> Result<()> {
        self.stage.reset()
    }

    /// Run the build tool.
    ///
    /// # Errors
    ///
    /// See [`BuildInvoker::invoke`].
    pub fn build(&self) -> Result<BuildOutcome> {
        self.build_invoker().invoke()
    }

    /// Copy all artefacts into the stage.
    ///
    /// # Errors
    ///
    /// See [`Collector::collect_all`].
    pub fn collect(&self) -> Result<Vec<Utf8PathBuf>> {
        Collector::new(self.root.clone(), self.stage.path()).collect_all(&self.artifacts())
    }

    /// Compress the stage into the release archive.
    ///
    /// # Errors
    ///
    /// See [`create_archive`].
    pub fn archive(&self) -> Result<ArchiveSummary> {
        create_archive(self.stage.path(), &self.archive_path())
    }

    /// Compare the written archive with the stage.
    ///
    /// # Errors
    ///
    /// See [`verify_archive`].
    pub fn verify(&self) -> Result<usize> {
        verify_archive(&self.archive_path(), self.stage.path())
    }

    /// Run every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step; later steps do not run.
    pub fn run(&self, options: RunOptions) -> Result<ReleaseOutput> {
        self.run_reporting(options, &mut |_| {})
    }

    /// Run every step in order, calling `progress` as each step starts.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step; later steps do not run.
    pub fn run_reporting(
        &self,
        options: RunOptions,
        progress: &mut dyn FnMut(Step),
    ) -> Result<ReleaseOutput> {
        progress(Step::ResetStage);
        self.reset_stage()?;

        let build_succeeded = if options.skip_build {
            info!("skipping build tool");
            None
        } else {
            progress(Step::Build);
            Some(self.build()?.succeeded())
        };

        progress(Step::Collect);
        let staged = self.collect()?;
        progress(Step::Archive);
        let archive = self.archive()?;
        let verified_files = if options.verify {
            progress(Step::Verify);
            Some(self.verify()?)
        } else {
            None
        };

        info!("release archive {} is ready", archive.path);
        Ok(ReleaseOutput {
            build_succeeded,
            staged,
            archive,
            verified_files,
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
