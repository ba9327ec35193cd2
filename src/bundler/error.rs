//! Error types for the release pipeline.
//!
//! Every stage failure is fatal. Variants carry enough context (endpoint,
//! command, HTTP status, path) for an operator to tell which stage broke.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, signing, packaging or uploading a release
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete release parameters
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Signing service kept answering HTTP 429 past the attempt budget
    #[error("request failed: {endpoint} was still rate limited after {attempts} attempts")]
    RateLimited {
        /// Method and path of the request
        endpoint: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Signing service rejected the request credentials
    #[error("authentication rejected by {endpoint} (HTTP {status})")]
    Authentication {
        /// Method and path of the request
        endpoint: String,
        /// HTTP status code
        status: u16,
    },

    /// Signing service answered with a status that is neither success nor retryable
    #[error("unexpected response from {endpoint} (HTTP {status}): {body}")]
    UnexpectedResponse {
        /// Method and path of the request
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body, lossily decoded
        body: String,
    },

    /// Remote signing job reported `failure`
    #[error("signing request {request_id} failed")]
    SigningFailed {
        /// Service-assigned request id
        request_id: String,
    },

    /// Remote signing job did not reach a terminal status before the deadline
    #[error(
        "signing request {request_id} did not complete within {seconds}s, check signer logs"
    )]
    SigningTimeout {
        /// Service-assigned request id
        request_id: String,
        /// Poll deadline in seconds
        seconds: u64,
    },

    /// External tool exited unsuccessfully or could not be spawned
    #[error("`{command}` failed (exit code {code:?}): {stderr}")]
    ToolInvocation {
        /// Rendered command line
        command: String,
        /// Exit code, if the process ran
        code: Option<i32>,
        /// Captured stderr or spawn error
        stderr: String,
    },

    /// File system operation failed on a known path
    #[error("{context} {}: {source}", .path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// IO errors without path context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive errors
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Shorthand for a [`Error::Configuration`].
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}

/// Attach a message to a missing value or a foreign error.
pub trait Context<T> {
    /// Converts the failure case into [`Error::GenericError`] carrying `context`.
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.into()))
    }
}

impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {}", context.into(), e)))
    }
}

/// Attach a path and an action to IO failures.
pub trait ErrorExt<T> {
    /// Converts an IO failure into [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Return early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)).into())
    };
}
