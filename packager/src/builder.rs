//! External build tool invocation.
//!
//! The build tool runs synchronously with inherited stdio so its progress is
//! visible. By default its exit status is reported but not acted upon: a
//! failed build surfaces later as a missing artefact during collection.
//! Setting `require_success` turns a failed build into an immediate error.

use crate::config::BuildSection;
use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use std::process::{Command, ExitStatus};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `program` with `args` in `cwd`, waiting for it to exit.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning the process.
    fn run(&self, program: &Utf8Path, args: &[&str], cwd: &Utf8Path) -> Result<ExitStatus>;
}

/// Executes commands on the host system, inheriting stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &Utf8Path, args: &[&str], cwd: &Utf8Path) -> Result<ExitStatus> {
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .status()
            .map_err(|source| PackagerError::BuildToolLaunch {
                tool: program.to_owned(),
                source,
            })
    }
}

/// Outcome of a completed build tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Exit status reported by the build tool.
    pub status: ExitStatus,
}

impl BuildOutcome {
    /// Returns true if the build tool exited successfully.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status.success()
    }
}

/// Runs the configured build tool for a project root.
pub struct BuildInvoker<'a> {
    root: Utf8PathBuf,
    config: &'a BuildSection,
    executor: &'a dyn CommandExecutor,
}

impl<'a> BuildInvoker<'a> {
    /// Create an invoker running `config` from `root` through `executor`.
    #[must_use]
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        config: &'a BuildSection,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            executor,
        }
    }

    /// Return the build tool path resolved against the project root.
    #[must_use]
    pub fn tool_path(&self) -> Utf8PathBuf {
        self.root.join(&self.config.tool)
    }

    /// Run the build tool and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::BuildToolLaunch`] if the tool cannot be
    /// started, or [`PackagerError::BuildFailed`] if it exits unsuccessfully
    /// while `require_success` is set.
    pub fn invoke(&self) -> Result<BuildOutcome> {
        let tool = self.tool_path();
        let args: Vec<&str> = self.config.args.iter().map(String::as_str).collect();

        info!("running {tool} {}", args.join(" "));
        let status = self.executor.run(&tool, &args, &self.root)?;
        let outcome = BuildOutcome { status };

        if !outcome.succeeded() {
            if self.config.require_success {
                return Err(PackagerError::BuildFailed { tool, status });
            }
            warn!("build tool {tool} exited with {status}; continuing with existing build output");
        }

        Ok(outcome)
    }
}
