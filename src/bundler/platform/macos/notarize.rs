//! Stages that run on the signed binary: notarization and stapling.
//!
//! Neither is wired to Apple's services yet. They are kept as explicit
//! pipeline stages so a real implementation slots in without touching the
//! signing flow.

use crate::bundler::{Result, settings::Settings};
use async_trait::async_trait;
use std::path::Path;

/// A step applied to the remotely signed binary before it is checksummed.
#[async_trait]
pub trait PostSigningStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, settings: &Settings, binary: &Path) -> Result<()>;
}

/// Submits the signed binary for notarization.
#[derive(Debug, Default)]
pub struct Notarize;

/// Staples the notarization ticket to the signed binary.
#[derive(Debug, Default)]
pub struct Staple;

#[async_trait]
impl PostSigningStage for Notarize {
    fn name(&self) -> &'static str {
        "notarize"
    }

    async fn run(&self, _settings: &Settings, binary: &Path) -> Result<()> {
        log::info!(
            "Notarization of {} is not implemented, skipping",
            binary.display()
        );
        Ok(())
    }
}

#[async_trait]
impl PostSigningStage for Staple {
    fn name(&self) -> &'static str {
        "staple"
    }

    async fn run(&self, _settings: &Settings, binary: &Path) -> Result<()> {
        log::info!("Stapling of {} is not implemented, skipping", binary.display());
        Ok(())
    }
}

/// Notarize, then staple.
pub fn default_stages() -> Vec<Box<dyn PostSigningStage>> {
    vec![Box::new(Notarize), Box::new(Staple)]
}
