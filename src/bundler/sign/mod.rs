//! Detached signatures for release archives.
//!
//! A release selects exactly one [`DetachedSigner`] up front: [`GpgSigner`]
//! when GPG key material is configured, [`NoopSigner`] otherwise. The archive
//! assembler calls [`DetachedSigner::sign_file`] once per archive and
//! [`DetachedSigner::clean`] once at the end, whatever happened in between.

mod gpg;

pub use gpg::GpgSigner;

use crate::bundler::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Extension appended to a file name for its detached signature.
pub const SIGNATURE_EXTENSION: &str = "sig";

/// Path of the detached signature for `path` (`<name>.sig` alongside it).
pub fn signature_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(SIGNATURE_EXTENSION);
    PathBuf::from(name)
}

/// Produces detached signatures and owns whatever signing state lives for
/// one release (keyrings, agents).
#[async_trait]
pub trait DetachedSigner: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Signs `path`, returning the signature file if one was written.
    async fn sign_file(&mut self, path: &Path) -> Result<Option<PathBuf>>;

    /// Releases signing resources. Safe to call more than once.
    async fn clean(&mut self) -> Result<()>;
}

/// Signer used when signing is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSigner;

#[async_trait]
impl DetachedSigner for NoopSigner {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn sign_file(&mut self, _path: &Path) -> Result<Option<PathBuf>> {
        Ok(None)
    }

    async fn clean(&mut self) -> Result<()> {
        Ok(())
    }
}
