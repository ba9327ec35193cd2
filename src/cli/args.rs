//! Command line argument parsing and validation.
//!
//! Every release parameter can come from a flag or from the environment
//! variable named in its help text.

use crate::bundler::{
    AwsCredentials, BuildTarget, GpgSettings, HostPlatform, PackageSettings, Settings,
    SettingsBuilder,
};
use crate::error::{CliError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Release builder for the qchat CLI
#[derive(Parser, Debug)]
#[command(
    name = "qchat_release",
    version,
    about = "Builds, signs and packages qchat releases",
    long_about = "Builds, signs and packages qchat releases.

On macOS the binary is merged into a universal binary and, when signing
parameters are given, signed by the remote signing service. On Linux the
binary is packed into tar.gz, tar.xz, tar.zst and zip archives, each with a
sha256 file and an optional GPG signature (QCHAT_GPG_KEY_ID,
QCHAT_GPG_SECRET_KEY, QCHAT_GPG_PASSPHRASE).

Usage:
  qchat_release build
  qchat_release build --not-release --skip-lints
  qchat_release build --stage-name gamma --output-bucket my-artifacts"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a release of qchat
    Build(BuildArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Build a debug binary instead of a release one
    #[arg(long)]
    pub not_release: bool,

    /// Skip `cargo test`
    #[arg(long)]
    pub skip_tests: bool,

    /// Skip `cargo clippy`
    #[arg(long)]
    pub skip_lints: bool,

    /// Bucket final artifacts are copied to under `staging/`
    #[arg(long, env = "OUTPUT_BUCKET", value_name = "BUCKET")]
    pub output_bucket: Option<String>,

    /// Bucket used as signing scratch space
    #[arg(long, env = "SIGNING_BUCKET", value_name = "BUCKET")]
    pub signing_bucket: Option<String>,

    /// Account owning the signing role
    #[arg(long, env = "AWS_ACCOUNT_ID", value_name = "ID")]
    pub aws_account_id: Option<String>,

    /// Secret id of the notarization credentials
    #[arg(long, env = "APPLE_ID_SECRET", value_name = "SECRET_ID")]
    pub apple_id_secret: Option<String>,

    /// Role the signing service assumes
    #[arg(long, env = "SIGNING_ROLE_NAME", value_name = "ROLE")]
    pub signing_role_name: Option<String>,

    /// Apple team id used as the signing certificate's app id prefix
    #[arg(long, env = "APPLE_TEAM_ID", value_name = "TEAM_ID")]
    pub apple_team_id: Option<String>,

    /// Deployment stage: prod (default) or gamma
    #[arg(long, env = "STAGE_NAME", value_name = "STAGE")]
    pub stage_name: Option<String>,

    /// Region signing requests are signed for
    #[arg(long, env = "AWS_REGION", value_name = "REGION")]
    pub aws_region: Option<String>,

    /// Target triple to build; repeat for several (default: host platform targets)
    #[arg(long = "target", value_name = "TRIPLE")]
    pub targets: Vec<BuildTarget>,

    /// Output directory for all artifacts
    #[arg(long, env = "BUILD_DIR", default_value = "build", value_name = "DIR")]
    pub build_dir: PathBuf,

    /// Directory cargo is run from
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub workspace_dir: PathBuf,

    /// Seconds to wait for the remote signing job
    #[arg(long, default_value_t = 180, value_name = "SECONDS")]
    pub signing_timeout: u64,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl BuildArgs {
    fn signing_parts(&self) -> [&Option<String>; 4] {
        [
            &self.signing_bucket,
            &self.aws_account_id,
            &self.apple_id_secret,
            &self.signing_role_name,
        ]
    }

    /// Validate arguments for consistency on the host platform
    pub fn validate(&self) -> Result<()> {
        self.validate_for(HostPlatform::current())
    }

    /// Validate arguments for a release built on `platform`.
    ///
    /// The Apple team id is only needed where remote signing runs.
    pub fn validate_for(&self, platform: HostPlatform) -> Result<()> {
        if self.signing_timeout == 0 {
            return Err(CliError::InvalidArguments {
                reason: "--signing-timeout must be greater than zero".to_string(),
            }
            .into());
        }

        let signing_complete = self
            .signing_parts()
            .iter()
            .all(|part| part.as_deref().is_some_and(|p| !p.trim().is_empty()));
        if signing_complete && platform == HostPlatform::MacOs && self.apple_team_id.is_none() {
            return Err(CliError::MissingArgument {
                argument: "--apple-team-id".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Builds validated [`Settings`], reading AWS and GPG credentials from
    /// the environment.
    pub fn to_settings(&self) -> Result<Settings> {
        let gpg = GpgSettings::from_env()?;
        self.settings_builder()
            .aws_credentials(AwsCredentials::from_env())
            .gpg(gpg)
            .build()
            .map_err(Into::into)
    }

    /// Settings from the flags alone, without touching the environment.
    pub fn settings_builder(&self) -> SettingsBuilder {
        SettingsBuilder::new()
            .package_settings(PackageSettings {
                apple_team_id: self.apple_team_id.clone(),
                ..Default::default()
            })
            .workspace_dir(&self.workspace_dir)
            .build_dir(&self.build_dir)
            .release(!self.not_release)
            .targets(self.targets.clone())
            .stage_name(self.stage_name.clone())
            .output_bucket(self.output_bucket.clone())
            .signing_bucket(self.signing_bucket.clone())
            .aws_account_id(self.aws_account_id.clone())
            .apple_id_secret(self.apple_id_secret.clone())
            .signing_role_name(self.signing_role_name.clone())
            .aws_region(self.aws_region.clone())
            .run_tests(!self.skip_tests)
            .run_lints(!self.skip_lints)
            .signing_timeout(Duration::from_secs(self.signing_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_args(extra: &[&str]) -> BuildArgs {
        let argv = ["qchat_release", "build"].iter().chain(extra);
        match Args::try_parse_from(argv).unwrap().command {
            Command::Build(args) => args,
        }
    }

    #[test]
    fn flags_map_onto_settings() {
        let args = build_args(&[
            "--not-release",
            "--skip-tests",
            "--target",
            "aarch64-unknown-linux-gnu",
            "--stage-name",
            "gamma",
        ]);
        args.validate().unwrap();

        let settings = args.settings_builder().build().unwrap();
        assert!(!settings.is_release());
        assert!(!settings.run_tests());
        assert!(settings.run_lints());
        assert_eq!(settings.targets()[0].triple(), "aarch64-unknown-linux-gnu");
        assert_eq!(settings.stage().as_str(), "gamma");
    }

    #[test]
    fn malformed_target_is_rejected_by_parser() {
        let result = Args::try_parse_from(["qchat_release", "build", "--target", "linux"]);
        assert!(result.is_err());
    }

    const COMPLETE_SIGNING: [&str; 8] = [
        "--signing-bucket",
        "b",
        "--aws-account-id",
        "1",
        "--apple-id-secret",
        "s",
        "--signing-role-name",
        "r",
    ];

    #[test]
    fn complete_signing_needs_team_id_on_macos() {
        let mut args = build_args(&COMPLETE_SIGNING);
        args.apple_team_id = None;

        assert!(matches!(
            args.validate_for(HostPlatform::MacOs),
            Err(crate::error::ReleaseError::Cli(CliError::MissingArgument { .. }))
        ));
    }

    #[test]
    fn complete_signing_on_linux_needs_no_team_id() {
        let mut args = build_args(&COMPLETE_SIGNING);
        args.apple_team_id = None;

        args.validate_for(HostPlatform::Linux).unwrap();
        let settings = args
            .settings_builder()
            .platform(HostPlatform::Linux)
            .build()
            .unwrap();
        assert!(settings.signing().is_some());
    }

    #[test]
    fn empty_stage_name_is_unset() {
        let args = build_args(&["--stage-name", ""]);
        let settings = args
            .settings_builder()
            .platform(HostPlatform::Linux)
            .build()
            .unwrap();
        assert_eq!(settings.stage().as_str(), "prod");
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let args = build_args(&["--signing-timeout", "0"]);
        assert!(args.validate().is_err());
    }
}
