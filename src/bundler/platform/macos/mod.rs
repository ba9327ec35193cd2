//! macOS release: remotely signed universal binary.
//!
//! # Process
//! 1. Copy the built binary to `<build_dir>/qchat`, replacing any stale copy
//! 2. When remote signing is configured:
//!    - package the binary (see [`bundle`]) and upload it to the signing bucket
//!    - submit, start and await the signing job
//!    - download `signed/signed.zip` and unpack it over `<build_dir>`
//!    - remove the package, its working directory and `signed.zip`
//!    - run the post-signing stages (notarize, staple)
//! 3. Checksum the final binary

mod bundle;
mod notarize;

pub use bundle::{
    EXECUTABLES_DIR, PACKAGE_FILE, WORKING_DIR, create_signing_package, remove_signing_files,
};
pub use notarize::{Notarize, PostSigningStage, Staple, default_stages};

use crate::bundler::{
    Result,
    archive::extract_zip,
    artifact::{ArtifactFormat, ArtifactOutput, ReleaseArtifact},
    builder::checksum,
    error::{Context, Error},
    remote::{HttpTransport, RequestSigner, SigningClient, SigningManifest},
    settings::{Settings, SigningCredentials},
    storage::{AwsCliStore, ObjectStore, PRE_SIGNED_PREFIX, SIGNED_PREFIX},
    utils::fs,
};
use std::{path::Path, sync::Arc, time::Duration};

/// File name of the signed archive the service writes back.
pub const SIGNED_ARCHIVE: &str = "signed.zip";

/// Collaborators for one remote signing round trip.
pub struct RemoteSigning {
    client: SigningClient,
    store: Arc<dyn ObjectStore>,
    credentials: SigningCredentials,
    timeout: Duration,
}

impl std::fmt::Debug for RemoteSigning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSigning")
            .field("bucket", &self.store.bucket())
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteSigning {
    pub fn new(
        client: SigningClient,
        store: Arc<dyn ObjectStore>,
        credentials: SigningCredentials,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            store,
            credentials,
            timeout,
        }
    }

    /// Production collaborators: SigV4 over HTTPS and the `aws` CLI.
    ///
    /// Returns `None` when signing is disabled for this release.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(credentials) = settings.signing() else {
            return Ok(None);
        };
        let aws = settings.aws_credentials().cloned().ok_or_else(|| {
            Error::configuration(
                "remote signing is configured but AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY are not set",
            )
        })?;

        let transport = HttpTransport::new(
            settings.signing_service_url(),
            RequestSigner::new(aws, settings.aws_region()),
        )?;
        let store = AwsCliStore::new(credentials.bucket_name())?.with_region(settings.aws_region());

        Ok(Some(Self::new(
            SigningClient::new(Arc::new(transport)),
            Arc::new(store),
            credentials.clone(),
            settings.signing_timeout(),
        )))
    }

    /// Replaces `binary` with the signed copy produced by the signing service.
    ///
    /// The signing package, its working directory and the downloaded archive
    /// are removed afterwards whether or not signing succeeded.
    pub async fn sign_binary(&self, settings: &Settings, binary: &Path) -> Result<()> {
        let result = self.round_trip(settings, binary).await;
        let cleanup = remove_signing_files(settings.build_dir(), &[PACKAGE_FILE, SIGNED_ARCHIVE]).await;

        match (result, cleanup) {
            (Ok(()), cleanup) => cleanup,
            (Err(e), Err(cleanup)) => {
                log::error!("Failed to remove signing scratch files: {}", cleanup);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    async fn round_trip(&self, settings: &Settings, binary: &Path) -> Result<()> {
        let build_dir = settings.build_dir();
        let name = settings.binary_name();
        let team_id = settings
            .package()
            .apple_team_id
            .as_deref()
            .context("remote signing requires an Apple team id")?;
        log::info!("Signing {}", name);

        let package = create_signing_package(build_dir, binary).await?;

        self.store.remove_prefix(SIGNED_PREFIX).await?;
        self.store.remove_prefix(PRE_SIGNED_PREFIX).await?;
        let source_key = format!("{PRE_SIGNED_PREFIX}/{PACKAGE_FILE}");
        let destination_key = format!("{SIGNED_PREFIX}/{SIGNED_ARCHIVE}");
        self.store.upload(&package, &source_key).await?;

        let manifest = SigningManifest::macos_app(name, &settings.package().app_identifier, team_id);
        let job = self
            .client
            .sign(
                &manifest,
                &source_key,
                &destination_key,
                &self.credentials,
                self.timeout,
            )
            .await?;

        let signed_zip = build_dir.join(SIGNED_ARCHIVE);
        fs::remove_file(&signed_zip).await?;
        self.store.download(&job.destination_key, &signed_zip).await?;
        extract_zip(&signed_zip, build_dir).await?;

        if !binary.is_file() {
            crate::bail!(
                "signed archive from request {} did not contain {}",
                job.request_id,
                name
            );
        }

        log::info!("✓ Signed {}", binary.display());
        Ok(())
    }
}

/// Produces the macOS release artifact from a built (universal) binary.
pub async fn bundle_project(
    settings: &Settings,
    binary_path: &Path,
    remote: Option<&RemoteSigning>,
    post_signing: &[Box<dyn PostSigningStage>],
) -> Result<ReleaseArtifact> {
    let build_dir = settings.build_dir();
    fs::create_dir_all(build_dir, false).await?;

    let binary = build_dir.join(settings.binary_name());
    fs::remove_file(&binary).await?;
    fs::copy_file(binary_path, &binary).await?;
    fs::set_executable(&binary).await?;

    match remote {
        Some(remote) => {
            remote.sign_binary(settings, &binary).await?;
            for stage in post_signing {
                log::debug!("Running post-signing stage {}", stage.name());
                stage.run(settings, &binary).await?;
            }
        }
        None => log::info!("Remote signing not configured, skipping signing"),
    }

    let checksum_path = checksum::generate(&binary).await?;
    log::info!("✓ Created {}", binary.display());

    Ok(ReleaseArtifact {
        binary_path: binary.clone(),
        outputs: vec![ArtifactOutput {
            format: ArtifactFormat::Executable,
            path: binary,
            checksum_path,
            signature_path: None,
        }],
    })
}
