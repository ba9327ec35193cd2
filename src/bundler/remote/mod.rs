//! Client for the remote code-signing service.
//!
//! A signing job is submitted with a [`SigningManifest`], started against a
//! package already uploaded to the signing bucket, then polled until it
//! reaches a terminal [`SigningStatus`]. Rate-limited requests back off
//! exponentially; polling stops at an absolute deadline.

mod auth;
mod client;
mod manifest;
mod status;
mod transport;

pub use auth::{RequestSigner, SIGNING_SERVICE, host_header};
pub use client::{MAX_ATTEMPTS, POLL_INTERVAL, SigningClient, SigningJob, backoff_delay};
pub use manifest::{ManifestApp, ManifestOutput, SigningManifest, SigningRequirements};
pub use status::SigningStatus;
pub use transport::{HttpTransport, SigningResponse, SigningTransport};
