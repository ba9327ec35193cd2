//! Release builder for the qchat command line application.
//!
//! This library provides the release pipeline used by the `qchat_release`
//! binary:
//! - compilation through cargo (universal binary on macOS)
//! - remote code signing of the macOS binary
//! - multi-format Linux archives with checksums and GPG signatures
//! - staging upload of the results
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, ReleaseError, Result};
