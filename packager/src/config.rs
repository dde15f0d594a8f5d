//! Release configuration.
//!
//! Defaults reproduce the fixed rendertoy release layout. An optional
//! `release.toml` in the project root overrides any subset of them, and the
//! CLI applies its own overrides on top (see [`crate::cli`]).

use crate::collector::Artifact;
use crate::error::{PackagerError, Result};
use crate::naming::{
    ArchiveName, DEFAULT_PLATFORM, DEFAULT_PREFIX, DEFAULT_VERSION, VersionLabel,
};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "release.toml";

const BUILD_OUTPUT_DIR: &str = "t2-output/win64-msvc-release-default";

/// Complete release configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Archive naming.
    pub archive: ArchiveSection,
    /// External build tool invocation.
    pub build: BuildSection,
    /// Staging directory location.
    pub stage: StageSection,
    /// Artefacts copied into the stage.
    pub collect: CollectSection,
}

/// `[archive]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveSection {
    /// Product prefix of the archive name.
    pub prefix: String,
    /// Version label of the archive name.
    pub version: String,
    /// Platform suffix of the archive name.
    pub platform: String,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            platform: DEFAULT_PLATFORM.to_owned(),
        }
    }
}

/// `[build]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Build tool executable, relative to the project root.
    pub tool: Utf8PathBuf,
    /// Arguments passed to the build tool.
    pub args: Vec<String>,
    /// Abort when the build tool exits unsuccessfully.
    pub require_success: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            tool: Utf8PathBuf::from("tools/tundra/bin-win32/tundra2.exe"),
            args: vec!["release".to_owned()],
            require_success: false,
        }
    }
}

/// `[stage]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageSection {
    /// Staging directory, relative to the project root.
    pub dir: Utf8PathBuf,
}

impl Default for StageSection {
    fn default() -> Self {
        Self {
            dir: Utf8PathBuf::from("release"),
        }
    }
}

/// `[collect]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectSection {
    /// Individual files copied into the stage root.
    pub files: Vec<Utf8PathBuf>,
    /// Directory trees copied into named stage subdirectories.
    pub trees: Vec<TreeEntry>,
}

impl Default for CollectSection {
    fn default() -> Self {
        let build_output = Utf8Path::new(BUILD_OUTPUT_DIR);
        Self {
            files: vec![
                build_output.join("rendertoy.exe"),
                build_output.join("FreeImage.dll"),
            ],
            trees: vec![
                TreeEntry::new("data", "data"),
                TreeEntry::new("tools/sublimePlugin", "sublimePlugin"),
            ],
        }
    }
}

/// A directory tree to copy, with its destination inside the stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeEntry {
    /// Source directory, relative to the project root.
    pub source: Utf8PathBuf,
    /// Destination subdirectory, relative to the stage.
    pub dest: Utf8PathBuf,
}

impl TreeEntry {
    /// Create a tree entry.
    #[must_use]
    pub fn new(source: impl Into<Utf8PathBuf>, dest: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

impl ReleaseConfig {
    /// Load configuration for the project at `root`.
    ///
    /// An explicit path must exist. Without one, `release.toml` in `root` is
    /// used when present and the built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigNotFound`] if `explicit` does not exist,
    /// or [`PackagerError::Config`] if the file cannot be parsed.
    pub fn load(root: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(PackagerError::ConfigNotFound {
                    path: path.to_owned(),
                });
            }
            Some(path) => path.to_owned(),
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    debug!("no {CONFIG_FILE_NAME} in {root}; using built-in layout");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        debug!("loading release configuration from {path}");
        let contents = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&path, &contents)
    }

    /// Parse configuration from TOML text; `path` is used for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] if the text is not a valid
    /// configuration.
    pub fn from_toml_str(path: &Utf8Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PackagerError::Config {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Check that the stage and every tree destination stay inside their
    /// base directories.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::UnsafePath`] for the first offending path.
    pub fn validate(&self) -> Result<()> {
        ensure_subpath("stage directory", &self.stage.dir)?;
        for tree in &self.collect.trees {
            ensure_subpath("tree destination", &tree.dest)?;
        }
        Ok(())
    }

    /// Build the archive name from the `[archive]` table.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidName`] if any component is unusable.
    pub fn archive_name(&self) -> Result<ArchiveName> {
        let version = VersionLabel::try_from(self.archive.version.as_str())?;
        ArchiveName::new(&self.archive.prefix, version, &self.archive.platform)
    }

    /// Return the artefacts to collect, files first and then trees.
    #[must_use]
    pub fn artifacts(&self) -> Vec<Artifact> {
        let files = self.collect.files.iter().map(|source| Artifact::File {
            source: source.clone(),
        });
        let trees = self.collect.trees.iter().map(|tree| Artifact::Tree {
            source: tree.source.clone(),
            dest: tree.dest.clone(),
        });
        files.chain(trees).collect()
    }
}

/// Require `path` to name a location strictly below the directory it is
/// joined onto: non-empty, relative, and made only of plain names.
///
/// # Errors
///
/// Returns [`PackagerError::UnsafePath`] naming `field` otherwise.
pub fn ensure_subpath(field: &'static str, path: &Utf8Path) -> Result<()> {
    let reason = if path.as_str().trim().is_empty() {
        "must not be empty"
    } else if path.is_absolute() || path.has_root() {
        "must be relative"
    } else if !path
        .components()
        .all(|c| matches!(c, Utf8Component::Normal(_)))
    {
        "must only contain plain directory names"
    } else {
        return Ok(());
    };
    Err(PackagerError::UnsafePath {
        field,
        path: path.to_owned(),
        reason,
    })
}
