//! Release orchestration and coordination.
//!
//! This module provides the [`ReleaseOrchestrator`] that runs one release
//! from tests to staging upload.

use super::signing::load_signer;
use crate::bundler::{
    Result, Settings,
    artifact::ReleaseArtifact,
    error::Context,
    platform::{HostPlatform, Packager, RemoteSigning},
    sign::{DetachedSigner, NoopSigner},
    storage::{AwsCliStore, ObjectStore, STAGING_PREFIX},
    toolchain::{CargoToolchain, Toolchain},
};
use std::sync::Arc;

/// Main release orchestrator.
///
/// Stages run strictly in order and the first failure aborts the rest:
///
/// 1. unit tests (skippable)
/// 2. lints (skippable)
/// 3. compilation
/// 4. platform packaging (signing, archives, checksums)
/// 5. upload to `s3://<output-bucket>/staging/` when an output bucket is set
///
/// # Examples
///
/// ```no_run
/// use qchat_release::bundler::{ReleaseOrchestrator, SettingsBuilder};
///
/// # async fn example() -> qchat_release::bundler::Result<()> {
/// let settings = SettingsBuilder::new().run_lints(false).build()?;
/// let artifact = ReleaseOrchestrator::from_settings(settings)?.run().await?;
///
/// for file in artifact.files() {
///     println!("{}", file.display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ReleaseOrchestrator {
    settings: Settings,
    platform: HostPlatform,
    toolchain: Box<dyn Toolchain>,
    packager: Packager,
    output_store: Option<Arc<dyn ObjectStore>>,
    signer: Option<Box<dyn DetachedSigner>>,
}

impl std::fmt::Debug for ReleaseOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseOrchestrator")
            .field("settings", &self.settings)
            .field("platform", &self.platform)
            .field("packager", &self.packager)
            .field(
                "output_bucket",
                &self.output_store.as_ref().map(|s| s.bucket().to_string()),
            )
            .field("signer", &self.signer.as_ref().map(|s| s.name()))
            .finish_non_exhaustive()
    }
}

impl ReleaseOrchestrator {
    /// Creates an orchestrator with explicit collaborators.
    ///
    /// The detached signer defaults to one loaded from the settings' GPG
    /// configuration at packaging time; see [`with_signer`](Self::with_signer).
    pub fn new(
        settings: Settings,
        platform: HostPlatform,
        toolchain: Box<dyn Toolchain>,
        packager: Packager,
    ) -> Self {
        Self {
            settings,
            platform,
            toolchain,
            packager,
            output_store: None,
            signer: None,
        }
    }

    /// Wires production collaborators for the host platform: cargo, the
    /// signing service over HTTPS and the `aws` CLI.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let platform = HostPlatform::current();

        let remote = match platform {
            HostPlatform::MacOs => RemoteSigning::from_settings(&settings)?,
            HostPlatform::Linux => None,
        };
        let output_store = match settings.output_bucket() {
            Some(bucket) => {
                let store = AwsCliStore::new(bucket)?.with_region(settings.aws_region());
                Some(Arc::new(store) as Arc<dyn ObjectStore>)
            }
            None => None,
        };

        let packager = Packager::new(platform).with_remote_signing(remote);
        Ok(
            Self::new(settings, platform, Box::new(CargoToolchain::new()), packager)
                .with_output_store(output_store),
        )
    }

    /// Sets where final artifacts are staged.
    pub fn with_output_store(mut self, store: Option<Arc<dyn ObjectStore>>) -> Self {
        self.output_store = store;
        self
    }

    /// Uses `signer` for Linux archives instead of loading one from settings.
    pub fn with_signer(mut self, signer: Box<dyn DetachedSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs every stage and returns what was produced.
    pub async fn run(mut self) -> Result<ReleaseArtifact> {
        let settings = &self.settings;
        log::info!("Release: {}", settings.is_release());
        log::info!(
            "Targets: {}",
            settings
                .targets()
                .iter()
                .map(|t| t.triple())
                .collect::<Vec<_>>()
                .join(", ")
        );
        log::info!("Signing app: {}", settings.signing().is_some());

        if settings.run_tests() {
            log::info!("Running cargo tests");
            self.toolchain.test(settings).await?;
            log::info!("✓ Tests passed");
        } else {
            log::info!("Skipping tests");
        }

        if settings.run_lints() {
            log::info!("Running cargo clippy");
            self.toolchain.lint(settings).await?;
            log::info!("✓ Lints passed");
        } else {
            log::info!("Skipping lints");
        }

        log::info!("Building {}", settings.package_name());
        let binary = self.toolchain.build(settings, self.platform).await?;
        log::info!("✓ Built {}", binary.display());

        let mut signer: Box<dyn DetachedSigner> = match (self.signer.take(), self.platform) {
            (Some(signer), _) => signer,
            (None, HostPlatform::Linux) => load_signer(self.settings.gpg()).await?,
            (None, HostPlatform::MacOs) => Box::new(NoopSigner),
        };
        let packaged = self
            .packager
            .package(&self.settings, &binary, signer.as_mut())
            .await;
        // Linux archive assembly cleans the signer itself.
        let artifact = match self.platform {
            HostPlatform::Linux => packaged?,
            HostPlatform::MacOs => {
                let cleanup = signer.clean().await;
                match (packaged, cleanup) {
                    (Ok(artifact), cleanup) => cleanup.map(|()| artifact)?,
                    (Err(e), Err(cleanup)) => {
                        log::error!("{} signer cleanup failed: {}", signer.name(), cleanup);
                        return Err(e);
                    }
                    (Err(e), Ok(())) => return Err(e),
                }
            }
        };

        self.upload(&artifact).await?;
        log::info!("✓ Release complete");
        Ok(artifact)
    }

    async fn upload(&self, artifact: &ReleaseArtifact) -> Result<()> {
        let Some(store) = &self.output_store else {
            log::info!("No output bucket configured, skipping upload");
            return Ok(());
        };

        log::info!(
            "Build complete, sending to s3://{}/{}/",
            store.bucket(),
            STAGING_PREFIX
        );
        for file in artifact.files() {
            let name = file
                .file_name()
                .context(format!("{} has no file name", file.display()))?;
            let key = format!("{STAGING_PREFIX}/{}", name.to_string_lossy());
            store.upload(file, &key).await?;
        }
        Ok(())
    }
}
