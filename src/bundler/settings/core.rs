//! Core Settings struct and implementations.

use super::{AwsCredentials, BuildTarget, GpgSettings, PackageSettings, SigningCredentials, Stage};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default signing service endpoint.
pub const SIGNING_API_BASE_URL: &str = "https://api.signer.builder-tools.aws.dev";

/// Default region the signing service is signed against.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Default deadline for a remote signing job.
pub const DEFAULT_SIGNING_TIMEOUT: Duration = Duration::from_secs(180);

/// Validated configuration for one release run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder), which applies
/// the stage and signing-credential policies. Immutable afterwards.
#[derive(Clone, Debug)]
pub struct Settings {
    pub(super) package: PackageSettings,
    pub(super) workspace_dir: PathBuf,
    pub(super) build_dir: PathBuf,
    pub(super) release: bool,
    pub(super) targets: Vec<BuildTarget>,
    pub(super) stage: Stage,
    pub(super) output_bucket: Option<String>,
    pub(super) signing: Option<SigningCredentials>,
    pub(super) aws_credentials: Option<AwsCredentials>,
    pub(super) aws_region: String,
    pub(super) gpg: Option<GpgSettings>,
    pub(super) run_tests: bool,
    pub(super) run_lints: bool,
    pub(super) signing_service_url: String,
    pub(super) signing_timeout: Duration,
}

impl Settings {
    /// Package identity.
    pub fn package(&self) -> &PackageSettings {
        &self.package
    }

    /// Cargo package to build.
    pub fn package_name(&self) -> &str {
        &self.package.package_name
    }

    /// Canonical binary name.
    pub fn binary_name(&self) -> &str {
        &self.package.binary_name
    }

    /// Directory cargo runs in; `target/` lives here.
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Directory all release outputs are written to.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Whether this is an optimized release build.
    pub fn is_release(&self) -> bool {
        self.release
    }

    /// Cargo profile directory name under `target/<triple>/`.
    pub fn profile_dir(&self) -> &'static str {
        if self.release { "release" } else { "debug" }
    }

    /// Targets to compile, never empty.
    pub fn targets(&self) -> &[BuildTarget] {
        &self.targets
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Bucket final artifacts are staged to, if any.
    pub fn output_bucket(&self) -> Option<&str> {
        self.output_bucket.as_deref()
    }

    /// Remote signing credentials; `None` means the release is unsigned.
    pub fn signing(&self) -> Option<&SigningCredentials> {
        self.signing.as_ref()
    }

    /// AWS keys for request signing.
    pub fn aws_credentials(&self) -> Option<&AwsCredentials> {
        self.aws_credentials.as_ref()
    }

    pub fn aws_region(&self) -> &str {
        &self.aws_region
    }

    /// GPG detached-signature settings; `None` means no detached signatures.
    pub fn gpg(&self) -> Option<&GpgSettings> {
        self.gpg.as_ref()
    }

    pub fn run_tests(&self) -> bool {
        self.run_tests
    }

    pub fn run_lints(&self) -> bool {
        self.run_lints
    }

    pub fn signing_service_url(&self) -> &str {
        &self.signing_service_url
    }

    /// Deadline for a remote signing job to reach a terminal status.
    pub fn signing_timeout(&self) -> Duration {
        self.signing_timeout
    }
}
