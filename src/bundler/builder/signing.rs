//! Detached signer selection.
//!
//! The signer is chosen once per release from the GPG settings resolved at
//! startup (`QCHAT_GPG_KEY_ID`, `QCHAT_GPG_SECRET_KEY`,
//! `QCHAT_GPG_PASSPHRASE`).

use super::tool_detection::HAS_GPG;
use crate::bundler::{
    Error, Result,
    settings::GpgSettings,
    sign::{DetachedSigner, GpgSigner, NoopSigner},
};

/// Returns a [`GpgSigner`] with the configured key imported, or a
/// [`NoopSigner`] when no key is configured.
///
/// # Errors
///
/// Configuration error when a key is configured but `gpg` is not usable or
/// the key cannot be imported.
pub async fn load_signer(gpg: Option<&GpgSettings>) -> Result<Box<dyn DetachedSigner>> {
    let Some(gpg) = gpg else {
        log::info!("No GPG key configured, archives will not be signed");
        return Ok(Box::new(NoopSigner));
    };

    if !*HAS_GPG {
        return Err(Error::configuration(format!(
            "GPG key {} configured but gpg is not available",
            gpg.key_id()
        )));
    }

    let signer = GpgSigner::import(gpg).await?;
    Ok(Box::new(signer))
}
