//! Builder for constructing Settings.

use super::{
    AwsCredentials, BuildTarget, GpgSettings, PackageSettings, Settings, SigningCredentials,
    Stage,
    core::{DEFAULT_REGION, DEFAULT_SIGNING_TIMEOUT, SIGNING_API_BASE_URL},
};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    platform::HostPlatform,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Builder for constructing [`Settings`].
///
/// Release parameters arrive as loose optional values (CLI flags and
/// environment); [`SettingsBuilder::build`] turns them into a validated
/// [`Settings`]:
///
/// - the stage name must be `prod`, `gamma` or unset
/// - remote signing is enabled only when the signing bucket, account id,
///   secret id and role name are *all* present; anything less is downgraded
///   to an unsigned release
/// - an empty target list falls back to the host platform defaults
///
/// # Examples
///
/// ```no_run
/// use qchat_release::bundler::SettingsBuilder;
///
/// # fn example() -> qchat_release::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .build_dir("build")
///     .stage_name(Some("gamma".into()))
///     .signing_bucket(Some("signing-bucket".into()))
///     .build()?;
///
/// // Only one of the four signing parameters was given.
/// assert!(settings.signing().is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SettingsBuilder {
    package: PackageSettings,
    workspace_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    release: bool,
    targets: Vec<BuildTarget>,
    stage_name: Option<String>,
    output_bucket: Option<String>,
    signing_bucket: Option<String>,
    aws_account_id: Option<String>,
    apple_id_secret: Option<String>,
    signing_role_name: Option<String>,
    aws_credentials: Option<AwsCredentials>,
    aws_region: Option<String>,
    gpg: Option<GpgSettings>,
    run_tests: bool,
    run_lints: bool,
    signing_service_url: Option<String>,
    signing_timeout: Duration,
    platform: HostPlatform,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            package: PackageSettings::default(),
            workspace_dir: None,
            build_dir: None,
            release: true,
            targets: Vec::new(),
            stage_name: None,
            output_bucket: None,
            signing_bucket: None,
            aws_account_id: None,
            apple_id_secret: None,
            signing_role_name: None,
            aws_credentials: None,
            aws_region: None,
            gpg: None,
            run_tests: true,
            run_lints: true,
            signing_service_url: None,
            signing_timeout: DEFAULT_SIGNING_TIMEOUT,
            platform: HostPlatform::current(),
        }
    }
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets package identity.
    ///
    /// Default: [`PackageSettings::default`] (the `qchat` package)
    pub fn package_settings(mut self, package: PackageSettings) -> Self {
        self.package = package;
        self
    }

    /// Sets the directory cargo is invoked from.
    ///
    /// Default: current directory
    pub fn workspace_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.workspace_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory for all release artifacts.
    ///
    /// Default: `build`
    pub fn build_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Chooses between a release (optimized) and debug build.
    ///
    /// Default: release
    pub fn release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Sets the compilation targets.
    ///
    /// Default: host platform defaults
    pub fn targets(mut self, targets: Vec<BuildTarget>) -> Self {
        self.targets = targets;
        self
    }

    /// Sets the stage name (`prod`, `gamma`, or unset).
    pub fn stage_name(mut self, stage_name: Option<String>) -> Self {
        self.stage_name = stage_name.filter(|s| !s.trim().is_empty());
        self
    }

    /// Sets the bucket final artifacts are staged to.
    pub fn output_bucket(mut self, bucket: Option<String>) -> Self {
        self.output_bucket = bucket.filter(|b| !b.trim().is_empty());
        self
    }

    /// Sets the signing scratch bucket.
    pub fn signing_bucket(mut self, bucket: Option<String>) -> Self {
        self.signing_bucket = bucket;
        self
    }

    /// Sets the account owning the signing role.
    pub fn aws_account_id(mut self, account_id: Option<String>) -> Self {
        self.aws_account_id = account_id;
        self
    }

    /// Sets the notarization secret id.
    pub fn apple_id_secret(mut self, secret_id: Option<String>) -> Self {
        self.apple_id_secret = secret_id;
        self
    }

    /// Sets the signing role name.
    pub fn signing_role_name(mut self, role_name: Option<String>) -> Self {
        self.signing_role_name = role_name;
        self
    }

    /// Sets the AWS keys used to sign signing-service requests.
    pub fn aws_credentials(mut self, credentials: Option<AwsCredentials>) -> Self {
        self.aws_credentials = credentials;
        self
    }

    /// Default: `us-west-2`
    pub fn aws_region(mut self, region: Option<String>) -> Self {
        self.aws_region = region.filter(|r| !r.trim().is_empty());
        self
    }

    /// Sets GPG detached-signature settings.
    pub fn gpg(mut self, gpg: Option<GpgSettings>) -> Self {
        self.gpg = gpg;
        self
    }

    /// Default: true
    pub fn run_tests(mut self, run: bool) -> Self {
        self.run_tests = run;
        self
    }

    /// Default: true
    pub fn run_lints(mut self, run: bool) -> Self {
        self.run_lints = run;
        self
    }

    /// Overrides the signing service endpoint.
    pub fn signing_service_url(mut self, url: impl Into<String>) -> Self {
        self.signing_service_url = Some(url.into());
        self
    }

    /// Default: 180 seconds
    pub fn signing_timeout(mut self, timeout: Duration) -> Self {
        self.signing_timeout = timeout;
        self
    }

    /// Overrides the host platform used for target defaults.
    pub fn platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Validates and builds the settings.
    ///
    /// # Errors
    ///
    /// - unknown stage name
    /// - remote signing enabled on macOS without an Apple team id
    /// - build or workspace directory cannot be made absolute
    pub fn build(self) -> Result<Settings> {
        let stage = Stage::parse(self.stage_name.as_deref())?;
        log::info!("Building for {}", stage);

        let any_signing_part = [
            &self.signing_bucket,
            &self.aws_account_id,
            &self.apple_id_secret,
            &self.signing_role_name,
        ]
        .iter()
        .any(|part| part.is_some());

        let signing = SigningCredentials::from_parts(
            self.signing_bucket,
            self.aws_account_id,
            self.apple_id_secret,
            self.signing_role_name,
        );

        if signing.is_none() && any_signing_part {
            log::info!(
                "Signing configuration is incomplete (need signing bucket, account id, \
                 secret id and role name); building unsigned"
            );
        }

        if signing.is_some()
            && self.platform == HostPlatform::MacOs
            && self.package.apple_team_id.is_none()
        {
            return Err(Error::configuration(
                "remote signing is configured but no Apple team id was given",
            ));
        }

        let targets = if self.targets.is_empty() {
            BuildTarget::defaults_for(self.platform)
        } else {
            self.targets
        };

        let workspace_dir = self.workspace_dir.unwrap_or_else(|| PathBuf::from("."));
        let workspace_dir = std::path::absolute(&workspace_dir)
            .fs_context("resolving workspace directory", &workspace_dir)?;
        let build_dir = self.build_dir.unwrap_or_else(|| PathBuf::from("build"));
        let build_dir = std::path::absolute(&build_dir)
            .fs_context("resolving build directory", &build_dir)?;

        Ok(Settings {
            package: self.package,
            workspace_dir,
            build_dir,
            release: self.release,
            targets,
            stage,
            output_bucket: self.output_bucket,
            signing,
            aws_credentials: self.aws_credentials,
            aws_region: self.aws_region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            gpg: self.gpg,
            run_tests: self.run_tests,
            run_lints: self.run_lints,
            signing_service_url: self
                .signing_service_url
                .unwrap_or_else(|| SIGNING_API_BASE_URL.to_string()),
            signing_timeout: self.signing_timeout,
        })
    }
}
