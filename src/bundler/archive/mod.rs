//! Multi-format archive assembly for Linux releases.
//!
//! One binary is staged under `<output_dir>/<archive_name>/` and packed into
//! every [`ArtifactFormat::ARCHIVES`] format in turn. Each archive is
//! checksummed and handed to the release's [`DetachedSigner`] before the next
//! format starts.

mod tarball;
mod zipfile;

pub use tarball::{Compression, ZSTD_LEVEL, compress, create_tarball};
pub use zipfile::{create_zip, extract_zip};

use crate::bundler::{
    Result,
    artifact::{ArtifactFormat, ArtifactOutput, ReleaseArtifact},
    builder::checksum,
    sign::DetachedSigner,
    utils::fs,
};
use std::path::Path;

async fn write_archive(
    format: ArtifactFormat,
    staging_dir: &Path,
    root_name: &str,
    dest: &Path,
) -> Result<()> {
    match format {
        ArtifactFormat::TarGz => create_tarball(staging_dir, root_name, dest, Compression::Gzip).await,
        ArtifactFormat::TarXz => create_tarball(staging_dir, root_name, dest, Compression::Xz).await,
        ArtifactFormat::TarZst => create_tarball(staging_dir, root_name, dest, Compression::Zstd).await,
        ArtifactFormat::Zip => create_zip(staging_dir, root_name, dest).await,
        ArtifactFormat::Executable => crate::bail!("{} is not an archive format", format),
    }
}

async fn assemble_formats(
    binary_path: &Path,
    archive_name: &str,
    binary_name: &str,
    output_dir: &Path,
    staging_dir: &Path,
    signer: &mut dyn DetachedSigner,
) -> Result<ReleaseArtifact> {
    fs::create_dir_all(staging_dir, true).await?;
    let staged_binary = staging_dir.join(binary_name);
    fs::copy_file(binary_path, &staged_binary).await?;
    fs::set_executable(&staged_binary).await?;

    let mut artifact = ReleaseArtifact::new(binary_path);
    for format in ArtifactFormat::ARCHIVES {
        let path = output_dir.join(format.file_name(archive_name));
        write_archive(format, staging_dir, archive_name, &path).await?;

        let checksum_path = checksum::generate(&path).await?;
        let signature_path = signer.sign_file(&path).await?;

        log::info!("✓ Created {}", path.display());
        artifact.outputs.push(ArtifactOutput {
            format,
            path,
            checksum_path,
            signature_path,
        });
    }

    Ok(artifact)
}

/// Packs `binary_path` into `.tar.gz`, `.tar.xz`, `.tar.zst` and `.zip`
/// archives in `output_dir`.
///
/// Every archive contains a single top-level `archive_name/` directory
/// holding the binary as `binary_name` (mode 0755).
///
/// The staging directory is removed and `signer.clean()` is called exactly
/// once whether or not assembly succeeded. When both a format and cleanup
/// fail, the format error is returned.
pub async fn assemble(
    binary_path: &Path,
    archive_name: &str,
    binary_name: &str,
    output_dir: &Path,
    signer: &mut dyn DetachedSigner,
) -> Result<ReleaseArtifact> {
    let staging_dir = output_dir.join(archive_name);
    log::info!(
        "Assembling {} archives (signer: {})",
        archive_name,
        signer.name()
    );

    let result = assemble_formats(
        binary_path,
        archive_name,
        binary_name,
        output_dir,
        &staging_dir,
        signer,
    )
    .await;

    let staging_cleanup = fs::remove_dir_all(&staging_dir).await;
    let signer_cleanup = signer.clean().await;

    match result {
        Ok(artifact) => {
            staging_cleanup?;
            signer_cleanup?;
            Ok(artifact)
        }
        Err(e) => {
            if let Err(cleanup) = staging_cleanup {
                log::error!("Failed to remove {}: {}", staging_dir.display(), cleanup);
            }
            if let Err(cleanup) = signer_cleanup {
                log::error!("{} signer cleanup failed: {}", signer.name(), cleanup);
            }
            Err(e)
        }
    }
}
