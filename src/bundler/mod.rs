//! Release pipeline for the `qchat` binary.
//!
//! Compiles the binary, packages it for the host platform and stages the
//! results:
//!
//! - **macOS**: a universal binary signed by the remote signing service
//! - **Linux**: `.tar.gz`, `.tar.xz`, `.tar.zst` and `.zip` archives, each
//!   with a SHA-256 file and an optional GPG detached signature
//!
//! Start from [`SettingsBuilder`] and hand the result to
//! [`ReleaseOrchestrator`].

pub mod archive;
pub mod artifact;
pub mod builder;
pub mod error;
pub mod platform;
pub mod remote;
pub mod settings;
pub mod sign;
pub mod storage;
pub mod toolchain;
pub mod utils;

pub use artifact::{ArtifactFormat, ArtifactOutput, ReleaseArtifact};
pub use builder::ReleaseOrchestrator;
pub use error::{Error, Result};
pub use platform::HostPlatform;
pub use settings::{
    AwsCredentials, BuildTarget, GpgSettings, PackageSettings, Settings, SettingsBuilder,
    SigningCredentials, Stage,
};
