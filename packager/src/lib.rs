//! Release packager for rendertoy builds.
//!
//! This crate turns a finished rendertoy build into a distributable zip
//! archive. It is used by the `rendertoy-package` binary and can be driven
//! programmatically for tests or custom release flows.
//!
//! # Modules
//!
//! - [`archive`] - Zip archive creation, digests and verification
//! - [`builder`] - External build tool invocation
//! - [`cli`] - Command-line argument definitions
//! - [`collector`] - Copying artefacts into the staging directory
//! - [`config`] - Release layout configuration
//! - [`error`] - Error types
//! - [`naming`] - Archive naming policy
//! - [`pipeline`] - Step orchestration
//! - [`stage`] - Staging directory reset

pub mod archive;
pub mod builder;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod stage;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
