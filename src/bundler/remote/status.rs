//! Signing job status as reported by the signing service.

use serde::Deserialize;
use std::fmt;

/// Status of a remote signing job.
///
/// `Success` and `Failure` are terminal. Anything the service reports that
/// is not one of the known values is kept as [`SigningStatus::Unrecognized`]
/// and treated as still running.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "String")]
pub enum SigningStatus {
    Created,
    Processing,
    InProgress,
    Success,
    Failure,
    Unrecognized(String),
}

impl SigningStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl From<String> for SigningStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "created" => Self::Created,
            "processing" => Self::Processing,
            "inProgress" => Self::InProgress,
            "success" => Self::Success,
            "failure" => Self::Failure,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<&str> for SigningStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl fmt::Display for SigningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Processing => f.write_str("processing"),
            Self::InProgress => f.write_str("inProgress"),
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
            Self::Unrecognized(other) => f.write_str(other),
        }
    }
}
