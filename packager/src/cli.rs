//! CLI argument definitions for the release packager.
//!
//! With no arguments the packager reproduces the fixed rendertoy release:
//! reset `release/`, run tundra, collect artefacts, write
//! `rendertoy_0.2_64.zip` in the current directory.

use crate::config::ReleaseConfig;
use crate::pipeline::RunOptions;
use camino::Utf8PathBuf;
use clap::Parser;

/// Package a rendertoy build into a versioned zip archive.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rendertoy-package")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build and package with the built-in layout:\n",
    "    $ rendertoy-package\n\n",
    "  Package existing build output as version 0.3:\n",
    "    $ rendertoy-package --skip-build --release-version 0.3\n\n",
    "  Preview without touching the filesystem:\n",
    "    $ rendertoy-package --dry-run\n",
))]
pub struct Cli {
    /// Project root containing the build tool and sources [default: current directory].
    #[arg(long, value_name = "DIR")]
    pub root: Option<Utf8PathBuf>,

    /// Configuration file [default: release.toml in the project root, if present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Override the version label used in the archive name.
    #[arg(long, value_name = "LABEL")]
    pub release_version: Option<String>,

    /// Override the platform suffix used in the archive name.
    #[arg(long, value_name = "SUFFIX")]
    pub platform: Option<String>,

    /// Package existing build output without running the build tool.
    #[arg(long)]
    pub skip_build: bool,

    /// Abort when the build tool exits unsuccessfully.
    #[arg(long)]
    pub require_build_success: bool,

    /// Re-read the archive and compare it with the staging directory.
    #[arg(long)]
    pub verify: bool,

    /// Show the resolved release plan and exit without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print a JSON summary of the produced archive on stdout.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut ReleaseConfig) {
        if let Some(version) = &self.release_version {
            config.archive.version.clone_from(version);
        }
        if let Some(platform) = &self.platform {
            config.archive.platform.clone_from(platform);
        }
        if self.require_build_success {
            config.build.require_success = true;
        }
    }

    /// Return the pipeline switches selected on the command line.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            skip_build: self.skip_build,
            verify: self.verify,
        }
    }

    /// Return the log level filter implied by `-v` and `-q`.
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
