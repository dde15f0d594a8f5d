//! Zip archive creation and verification for release bundles.
//!
//! Archive entries mirror the staging directory: every path is relative to
//! the stage and uses `/` separators. Subdirectories get explicit entries and
//! everything is emitted in sorted order, so the layout of an archive depends
//! only on the staged tree.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entries at or above this size need ZIP64 extra fields.
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// A hex-encoded SHA-256 digest of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Return the digest as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Description of an archive written by [`create_archive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Location of the archive.
    pub path: Utf8PathBuf,
    /// Number of file entries.
    pub files: usize,
    /// Number of directory entries.
    pub directories: usize,
    /// Digest of the finished archive.
    pub sha256: Sha256Digest,
}

/// Compute the SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`PackagerError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<Sha256Digest> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Sha256Digest(format!("{:x}", hasher.finalize())))
}

/// Compress the contents of `stage_dir` into a zip file at `archive_path`.
///
/// A partially written archive is removed if any step fails.
///
/// # Errors
///
/// Returns [`PackagerError::Archive`] if the zip writer fails,
/// [`PackagerError::Io`] if a staged file cannot be read, or
/// [`PackagerError::NonUtf8Path`] for entries that cannot be named.
pub fn create_archive(stage_dir: &Utf8Path, archive_path: &Utf8Path) -> Result<ArchiveSummary> {
    match write_archive(stage_dir, archive_path) {
        Ok((files, directories)) => {
            let sha256 = compute_sha256(archive_path)?;
            debug!("wrote {archive_path} with {files} file(s) and {directories} directory entries");
            Ok(ArchiveSummary {
                path: archive_path.to_owned(),
                files,
                directories,
                sha256,
            })
        }
        Err(err) => {
            let _ = fs::remove_file(archive_path);
            Err(err)
        }
    }
}

fn write_archive(stage_dir: &Utf8Path, archive_path: &Utf8Path) -> Result<(usize, usize)> {
    let zip_err = |source: zip::result::ZipError| PackagerError::Archive {
        path: archive_path.to_owned(),
        source,
    };

    let output = fs::File::create(archive_path)?;
    let mut writer = ZipWriter::new(output);
    let base_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let (mut files, mut directories) = (0, 0);

    for entry in WalkDir::new(stage_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let name = entry_name(stage_dir, &entry)?;

        if entry.file_type().is_dir() {
            trace!("adding directory {name}/");
            writer
                .add_directory(format!("{name}/"), base_options)
                .map_err(zip_err)?;
            directories += 1;
        } else {
            trace!("adding {name}");
            let options = file_options(base_options, &entry)?;
            writer.start_file(name, options).map_err(zip_err)?;
            let mut source = fs::File::open(entry.path())?;
            io::copy(&mut source, &mut writer)?;
            files += 1;
        }
    }

    writer.finish().map_err(zip_err)?;
    Ok((files, directories))
}

/// Check that the archive holds exactly the files of `stage_dir`.
///
/// Directory entries are not compared. Returns the number of verified files.
///
/// # Errors
///
/// Returns [`PackagerError::ArchiveMismatch`] on the first missing,
/// unexpected, or differing entry, and [`PackagerError::Archive`] if the
/// archive cannot be read.
pub fn verify_archive(archive_path: &Utf8Path, stage_dir: &Utf8Path) -> Result<usize> {
    let zip_err = |source: zip::result::ZipError| PackagerError::Archive {
        path: archive_path.to_owned(),
        source,
    };
    let mismatch = |reason: String| PackagerError::ArchiveMismatch {
        path: archive_path.to_owned(),
        reason,
    };

    let mut expected = staged_files(stage_dir)?;
    let mut archive = ZipArchive::new(fs::File::open(archive_path)?).map_err(zip_err)?;
    let mut verified = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_err)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_owned();
        let Some(staged) = expected.remove(&name) else {
            return Err(mismatch(format!("unexpected entry {name}")));
        };

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        if contents != fs::read(&staged)? {
            return Err(mismatch(format!("contents differ for {name}")));
        }
        verified += 1;
    }

    if let Some(name) = expected.keys().next() {
        return Err(mismatch(format!("missing entry {name}")));
    }
    Ok(verified)
}

fn staged_files(stage_dir: &Utf8Path) -> Result<BTreeMap<String, Utf8PathBuf>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(stage_dir).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry_name(stage_dir, &entry)?;
        let path = Utf8Path::from_path(entry.path()).ok_or_else(|| non_utf8(&entry))?;
        files.insert(name, path.to_owned());
    }
    Ok(files)
}

/// Archive name of `entry`: its path relative to the stage, `/`-separated.
fn entry_name(stage_dir: &Utf8Path, entry: &DirEntry) -> Result<String> {
    let relative = entry
        .path()
        .strip_prefix(stage_dir)
        .map_err(|_| non_utf8(entry))?;
    let relative = Utf8Path::from_path(relative).ok_or_else(|| non_utf8(entry))?;
    let parts: Vec<&str> = relative.components().map(|c| c.as_str()).collect();
    Ok(parts.join("/"))
}

fn file_options(base: SimpleFileOptions, entry: &DirEntry) -> Result<SimpleFileOptions> {
    let metadata = fs::metadata(entry.path())?;
    let options = base.large_file(needs_zip64(metadata.len()));
    Ok(with_permissions(options, &metadata))
}

fn needs_zip64(len: u64) -> bool {
    len >= ZIP64_THRESHOLD
}

#[cfg(unix)]
fn with_permissions(options: SimpleFileOptions, metadata: &fs::Metadata) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;

    options.unix_permissions(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn with_permissions(options: SimpleFileOptions, _metadata: &fs::Metadata) -> SimpleFileOptions {
    options
}

fn non_utf8(entry: &DirEntry) -> PackagerError {
    PackagerError::NonUtf8Path {
        path: entry.path().display().to_string(),
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
