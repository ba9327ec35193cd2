//! GPG detached signer backed by a private, temporary keyring.

use super::{DetachedSigner, signature_path};
use crate::bundler::{
    Result,
    error::{Context, Error, ErrorExt},
    settings::{GPG_PASSPHRASE_ENV, GPG_SECRET_KEY_ENV, GpgSettings},
    utils::{command, fs},
};
use async_trait::async_trait;
use base64::Engine;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;

/// Signs files with `gpg --detach-sign` using a key imported into a
/// throwaway `GNUPGHOME`.
///
/// The keyring and any gpg-agent started for it live until [`clean`] runs.
///
/// [`clean`]: DetachedSigner::clean
pub struct GpgSigner {
    gpg_path: PathBuf,
    key_id: String,
    passphrase: Vec<u8>,
    home: Option<TempDir>,
}

impl std::fmt::Debug for GpgSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpgSigner")
            .field("gpg_path", &self.gpg_path)
            .field("key_id", &self.key_id)
            .field("home", &self.home.as_ref().map(TempDir::path))
            .finish_non_exhaustive()
    }
}

fn decode(value: &str, variable: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| Error::configuration(format!("{variable} is not valid base64: {e}")))
}

impl GpgSigner {
    /// Imports the configured key using `gpg` from `PATH`.
    pub async fn import(settings: &GpgSettings) -> Result<Self> {
        let gpg_path = which::which("gpg")
            .map_err(|e| Error::configuration(format!("gpg signing configured but gpg not found: {e}")))?;
        Self::import_with(gpg_path, settings).await
    }

    /// Imports the configured key using a specific gpg binary.
    pub async fn import_with(gpg_path: impl Into<PathBuf>, settings: &GpgSettings) -> Result<Self> {
        let gpg_path = gpg_path.into();
        let secret_key = decode(settings.secret_key_b64(), GPG_SECRET_KEY_ENV)?;
        let passphrase = decode(settings.passphrase_b64(), GPG_PASSPHRASE_ENV)?;

        let home = tempfile::Builder::new().prefix("qchat-gnupg-").tempdir()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(home.path(), std::fs::Permissions::from_mode(0o700))
                .await
                .fs_context("securing GPG home", home.path())?;
        }

        let mut import = Command::new(&gpg_path);
        import
            .arg("--homedir")
            .arg(home.path())
            .args(["--batch", "--import"]);
        command::run_with_input(import, &secret_key).await?;

        log::info!(
            "✓ Imported GPG key {} into temporary keyring",
            settings.key_id()
        );

        Ok(Self {
            gpg_path,
            key_id: settings.key_id().to_string(),
            passphrase,
            home: Some(home),
        })
    }

    fn home(&self) -> Result<&Path> {
        self.home
            .as_ref()
            .map(TempDir::path)
            .context("GPG signer used after clean")
    }
}

#[async_trait]
impl DetachedSigner for GpgSigner {
    fn name(&self) -> &'static str {
        "gpg"
    }

    async fn sign_file(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        let sig_path = signature_path(path);
        fs::remove_file(&sig_path).await?;

        let mut sign = Command::new(&self.gpg_path);
        sign.arg("--homedir")
            .arg(self.home()?)
            .args([
                "--batch",
                "--yes",
                "--pinentry-mode",
                "loopback",
                "--passphrase-fd",
                "0",
                "--local-user",
                self.key_id.as_str(),
                "--detach-sign",
                "--output",
            ])
            .arg(&sig_path)
            .arg(path);
        command::run_with_input(sign, &self.passphrase).await?;

        log::info!("✓ Signed {}", path.display());
        Ok(Some(sig_path))
    }

    async fn clean(&mut self) -> Result<()> {
        let Some(home) = self.home.take() else {
            return Ok(());
        };

        let mut kill_agent = Command::new("gpgconf");
        kill_agent
            .arg("--homedir")
            .arg(home.path())
            .args(["--kill", "gpg-agent"]);
        if let Err(e) = command::run_captured(kill_agent).await {
            log::warn!("Could not stop gpg-agent for temporary keyring: {}", e);
        }

        let home_path = home.path().to_path_buf();
        home.close().fs_context("removing GPG home", &home_path)?;
        log::debug!("Removed temporary GPG keyring {}", home_path.display());
        Ok(())
    }
}
