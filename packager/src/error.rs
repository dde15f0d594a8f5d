//! Error types for the release packager.
//!
//! Every failure aborts the run; nothing is retried. Variants name the path
//! or value involved so the printed diagnostic is enough to locate the
//! problem.

use camino::Utf8PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while packaging a release.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// A source artefact was not found, usually because the build step
    /// failed silently or never ran.
    #[error("source artefact not found: {path}")]
    MissingSource {
        /// Path that was expected to exist.
        path: Utf8PathBuf,
    },

    /// A tree copy destination already exists inside the staging directory.
    #[error("destination already exists: {path}")]
    DestinationExists {
        /// The pre-existing destination path.
        path: Utf8PathBuf,
    },

    /// The staging directory could not be removed or recreated.
    #[error("failed to reset staging directory {path}")]
    StageReset {
        /// Path to the staging directory.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A copy into the staging directory failed.
    #[error("failed to copy {from} to {to}")]
    Copy {
        /// Source path of the copy.
        from: Utf8PathBuf,
        /// Destination path of the copy.
        to: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The build tool could not be started.
    #[error("failed to launch build tool {tool}")]
    BuildToolLaunch {
        /// Path of the build tool.
        tool: Utf8PathBuf,
        /// The underlying spawn failure.
        #[source]
        source: std::io::Error,
    },

    /// The build tool exited unsuccessfully while success was required.
    #[error("build tool {tool} exited with {status}")]
    BuildFailed {
        /// Path of the build tool.
        tool: Utf8PathBuf,
        /// Exit status reported by the tool.
        status: ExitStatus,
    },

    /// Writing or reading the zip archive failed.
    #[error("archive error for {path}: {source}")]
    Archive {
        /// Path to the archive.
        path: Utf8PathBuf,
        /// The underlying zip failure.
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive contents do not match the staging directory.
    #[error("archive {path} does not match staging directory: {reason}")]
    ArchiveMismatch {
        /// Path to the archive.
        path: Utf8PathBuf,
        /// Description of the first difference found.
        reason: String,
    },

    /// A staged path is not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing file.
        path: Utf8PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("invalid configuration in {path}: {reason}")]
    Config {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// A value used to form the archive name is unusable.
    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidName {
        /// Which naming component was rejected.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A configured path would resolve outside the directory it belongs to.
    #[error("unsafe {field} \"{path}\": {reason}")]
    UnsafePath {
        /// Which configured path was rejected.
        field: &'static str,
        /// The rejected path.
        path: Utf8PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The release summary could not be serialized.
    #[error("failed to serialize release summary: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl PackagerError {
    /// Return true when the error reports a missing source artefact.
    #[must_use]
    pub fn is_missing_source(&self) -> bool {
        matches!(self, Self::MissingSource { .. })
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
