//! Linux release: the binary packed into every archive format.

use crate::bundler::{
    Result, archive, artifact::ReleaseArtifact, settings::Settings, sign::DetachedSigner,
};
use std::path::Path;

/// Produces `<build_dir>/qchat.{tar.gz,tar.xz,tar.zst,zip}` with checksums
/// and, when `signer` is active, detached signatures. `signer` is cleaned
/// up before this returns.
pub async fn bundle_project(
    settings: &Settings,
    binary_path: &Path,
    signer: &mut dyn DetachedSigner,
) -> Result<ReleaseArtifact> {
    archive::assemble(
        binary_path,
        settings.binary_name(),
        settings.binary_name(),
        settings.build_dir(),
        signer,
    )
    .await
}
