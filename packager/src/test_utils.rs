//! Shared test utilities for the packager crate.

use crate::builder::CommandExecutor;
use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::process::ExitStatus;
use walkdir::WalkDir;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Represents an expected build tool invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program expected to run.
    pub program: String,
    /// The arguments expected to be passed.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<ExitStatus>,
}

impl ExpectedCall {
    /// Expect `program` to run with `args` and exit with `code`.
    #[must_use]
    pub fn exiting(program: &str, args: &[&str], code: i32) -> Self {
        Self {
            program: program.to_owned(),
            args: args.iter().map(|&a| a.to_owned()).collect(),
            result: Ok(exit_status(code)),
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to drive the pipeline without launching a build tool.
#[derive(Debug, Default)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Returns true if every expected invocation has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.expected.borrow().is_empty()
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, program: &Utf8Path, args: &[&str], _cwd: &Utf8Path) -> Result<ExitStatus> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(PackagerError::StubMismatch {
                message: format!("unexpected invocation of {program}"),
            });
        };

        if call.program != program.as_str() || call.args.iter().ne(args.iter()) {
            return Err(PackagerError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {program} {args:?}",
                    call.program, call.args
                ),
            });
        }
        call.result
    }
}

/// Relative paths of the default file artefacts.
pub const FAKE_FILES: [&str; 2] = [
    "t2-output/win64-msvc-release-default/rendertoy.exe",
    "t2-output/win64-msvc-release-default/FreeImage.dll",
];

/// Populate `root` with fake sources matching the default release layout.
///
/// # Errors
///
/// Returns any I/O error raised while writing the files.
pub fn seed_release_sources(root: &Utf8Path) -> std::io::Result<()> {
    fs::create_dir_all(root.join("t2-output/win64-msvc-release-default"))?;
    fs::write(root.join(FAKE_FILES[0]), b"MZ fake rendertoy executable")?;
    fs::write(root.join(FAKE_FILES[1]), b"MZ fake FreeImage library")?;

    fs::create_dir_all(root.join("data/shaders/include"))?;
    fs::create_dir_all(root.join("data/empty"))?;
    fs::write(root.join("data/shaders/main.glsl"), b"void main() {}\n")?;
    fs::write(root.join("data/shaders/include/common.glsl"), b"#define PI 3.14159\n")?;
    fs::write(root.join("data/scene.json"), b"{\"nodes\": []}\n")?;

    fs::create_dir_all(root.join("tools/sublimePlugin"))?;
    fs::write(
        root.join("tools/sublimePlugin/rendertoy.py"),
        b"import sublime\n",
    )?;
    fs::write(
        root.join("tools/sublimePlugin/rendertoy.sublime-settings"),
        b"{}\n",
    )?;
    Ok(())
}

/// Map every file under `dir` to its bytes, keyed by `/`-separated relative
/// path. Directories are recorded with a trailing `/` and no content.
///
/// # Errors
///
/// Returns any I/O error raised while walking or reading the tree.
pub fn snapshot_tree(dir: &Utf8Path) -> std::io::Result<BTreeMap<String, Vec<u8>>> {
    let mut snapshot = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(std::io::Error::other)?
            .to_string_lossy()
            .replace('\\', "/");
        if entry.file_type().is_dir() {
            snapshot.insert(format!("{relative}/"), Vec::new());
        } else {
            snapshot.insert(relative, fs::read(entry.path())?);
        }
    }
    Ok(snapshot)
}
