//! Error types for the command line surface.
//!
//! Pipeline failures are [`crate::bundler::Error`]; this layer adds argument
//! problems and maps everything to a process exit.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Top-level error returned by [`crate::cli::run`]
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Release pipeline errors
    #[error("Release failed: {0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl ReleaseError {
    /// Process exit code for this error.
    ///
    /// Argument problems exit with 2 like clap's own usage errors; every
    /// pipeline failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cli(CliError::InvalidArguments { .. } | CliError::MissingArgument { .. }) => 2,
            Self::Bundler(crate::bundler::Error::Configuration(_)) => 2,
            _ => 1,
        }
    }
}
