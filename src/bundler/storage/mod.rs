//! Object storage for signing scratch space and release staging.

use crate::bundler::{Error, Result, utils::command};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Key prefix the unsigned package is uploaded under.
pub const PRE_SIGNED_PREFIX: &str = "pre-signed";
/// Key prefix the signing service writes its output under.
pub const SIGNED_PREFIX: &str = "signed";
/// Key prefix final release artifacts are copied to.
pub const STAGING_PREFIX: &str = "staging";

/// A bucket of objects addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// Deletes every object under `prefix`. Succeeds when nothing matches.
    async fn remove_prefix(&self, prefix: &str) -> Result<()>;

    async fn upload(&self, local: &Path, key: &str) -> Result<()>;

    async fn download(&self, key: &str, local: &Path) -> Result<()>;
}

/// [`ObjectStore`] backed by the `aws s3` CLI.
#[derive(Clone, Debug)]
pub struct AwsCliStore {
    aws_path: PathBuf,
    bucket: String,
    region: Option<String>,
}

impl AwsCliStore {
    /// Uses `aws` from `PATH`.
    pub fn new(bucket: impl Into<String>) -> Result<Self> {
        let aws_path = which::which("aws")
            .map_err(|e| Error::configuration(format!("aws CLI not found: {e}")))?;
        Ok(Self::with_program(aws_path, bucket))
    }

    pub fn with_program(aws_path: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            aws_path: aws_path.into(),
            bucket: bucket.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    fn uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    fn s3(&self) -> Command {
        let mut cmd = Command::new(&self.aws_path);
        if let Some(region) = &self.region {
            cmd.arg("--region").arg(region);
        }
        cmd.arg("s3");
        cmd
    }
}

#[async_trait]
impl ObjectStore for AwsCliStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<()> {
        let mut cmd = self.s3();
        cmd.args(["rm", "--recursive"]).arg(self.uri(prefix));
        command::run_captured(cmd).await?;
        log::debug!("Cleared {}", self.uri(prefix));
        Ok(())
    }

    async fn upload(&self, local: &Path, key: &str) -> Result<()> {
        let mut cmd = self.s3();
        cmd.arg("cp").arg(local).arg(self.uri(key));
        command::run_captured(cmd).await?;
        log::info!("✓ Uploaded {} to {}", local.display(), self.uri(key));
        Ok(())
    }

    async fn download(&self, key: &str, local: &Path) -> Result<()> {
        let mut cmd = self.s3();
        cmd.arg("cp").arg(self.uri(key)).arg(local);
        command::run_captured(cmd).await?;
        log::info!("✓ Downloaded {} to {}", self.uri(key), local.display());
        Ok(())
    }
}
