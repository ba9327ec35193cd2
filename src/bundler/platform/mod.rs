//! Platform-specific packaging.
//!
//! The host platform is decided once per process and selects exactly one
//! packaging path:
//!
//! - **macOS**: [`macos::bundle_project`], a remotely signed binary
//! - **Linux**: [`linux::bundle_project`], multi-format archives

pub mod linux;
pub mod macos;

pub use macos::{PostSigningStage, RemoteSigning};

use crate::bundler::{Result, artifact::ReleaseArtifact, settings::Settings, sign::DetachedSigner};
use std::{fmt, path::Path};

/// Operating system the release is produced on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HostPlatform {
    MacOs,
    Linux,
}

impl HostPlatform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => f.write_str("macos"),
            Self::Linux => f.write_str("linux"),
        }
    }
}

/// Dispatches a built binary to its platform's packaging path.
pub struct Packager {
    platform: HostPlatform,
    remote: Option<RemoteSigning>,
    post_signing: Vec<Box<dyn PostSigningStage>>,
}

impl fmt::Debug for Packager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packager")
            .field("platform", &self.platform)
            .field("remote", &self.remote)
            .field(
                "post_signing",
                &self.post_signing.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Packager {
    pub fn new(platform: HostPlatform) -> Self {
        Self {
            platform,
            remote: None,
            post_signing: macos::default_stages(),
        }
    }

    pub fn with_remote_signing(mut self, remote: Option<RemoteSigning>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_post_signing_stages(mut self, stages: Vec<Box<dyn PostSigningStage>>) -> Self {
        self.post_signing = stages;
        self
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    /// Packages `binary_path`. `signer` is only consulted on Linux.
    pub async fn package(
        &self,
        settings: &Settings,
        binary_path: &Path,
        signer: &mut dyn DetachedSigner,
    ) -> Result<ReleaseArtifact> {
        match self.platform {
            HostPlatform::MacOs => {
                macos::bundle_project(
                    settings,
                    binary_path,
                    self.remote.as_ref(),
                    &self.post_signing,
                )
                .await
            }
            HostPlatform::Linux => linux::bundle_project(settings, binary_path, signer).await,
        }
    }
}
