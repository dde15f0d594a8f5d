//! Archive naming policy for release bundles.
//!
//! Release archives are named `<prefix>_<version>_<platform>.zip`. Each
//! component ends up in a file name, so empty values and path separators are
//! rejected up front.

use crate::error::{PackagerError, Result};
use std::fmt;

/// Product prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "rendertoy";

/// Version label used when none is configured.
pub const DEFAULT_VERSION: &str = "0.2";

/// Platform suffix used when none is configured.
pub const DEFAULT_PLATFORM: &str = "64";

const ARCHIVE_EXTENSION: &str = ".zip";

/// A release version label, such as `0.2`.
///
/// The label is opaque: no versioning scheme is parsed or enforced.
///
/// # Examples
///
/// ```
/// use rendertoy_packager::naming::VersionLabel;
///
/// let version = VersionLabel::try_from("0.2").expect("valid label");
/// assert_eq!(version.as_str(), "0.2");
/// assert!(VersionLabel::try_from("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionLabel(String);

impl VersionLabel {
    /// Return the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VersionLabel {
    fn default() -> Self {
        Self(DEFAULT_VERSION.to_owned())
    }
}

impl TryFrom<&str> for VersionLabel {
    type Error = PackagerError;

    fn try_from(value: &str) -> Result<Self> {
        validate_component("version", value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for VersionLabel {
    type Error = PackagerError;

    fn try_from(value: String) -> Result<Self> {
        validate_component("version", &value)?;
        Ok(Self(value))
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully-qualified release archive name.
///
/// # Examples
///
/// ```
/// use rendertoy_packager::naming::{ArchiveName, VersionLabel};
///
/// let version = VersionLabel::try_from("0.2").expect("valid label");
/// let name = ArchiveName::new("rendertoy", version, "64").expect("valid name");
/// assert_eq!(name.filename(), "rendertoy_0.2_64.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    prefix: String,
    version: VersionLabel,
    platform: String,
}

impl ArchiveName {
    /// Create an archive name from its components.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidName`] if the prefix or platform is
    /// empty or contains a path separator.
    pub fn new(prefix: &str, version: VersionLabel, platform: &str) -> Result<Self> {
        validate_component("prefix", prefix)?;
        validate_component("platform", platform)?;
        Ok(Self {
            prefix: prefix.to_owned(),
            version,
            platform: platform.to_owned(),
        })
    }

    /// Return the product prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Return the version label.
    #[must_use]
    pub fn version(&self) -> &VersionLabel {
        &self.version
    }

    /// Return the platform suffix.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Return the archive base name without the `.zip` extension.
    #[must_use]
    pub fn base_name(&self) -> String {
        format!("{}_{}_{}", self.prefix, self.version, self.platform)
    }

    /// Return the archive file name.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl Default for ArchiveName {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            version: VersionLabel::default(),
            platform: DEFAULT_PLATFORM.to_owned(),
        }
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ARCHIVE_EXTENSION}", self.base_name())
    }
}

fn validate_component(field: &'static str, value: &str) -> Result<()> {
    let reason = if value.trim().is_empty() {
        "must not be empty"
    } else if value.contains(['/', '\\']) {
        "must not contain path separators"
    } else {
        return Ok(());
    };
    Err(PackagerError::InvalidName {
        field,
        value: value.to_owned(),
        reason,
    })
}
