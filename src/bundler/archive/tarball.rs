//! Deterministic tarballs compressed with gzip, xz or zstd.
//!
//! The tar stream is written once to a temporary file with normalised
//! headers (mtime 0, uid/gid 0, fixed modes, sorted entries) and then piped
//! through the requested encoder, so identical input always yields identical
//! archive bytes.

use crate::bundler::{
    Result,
    error::{Context, Error, ErrorExt},
    utils::fs,
};
use async_compression::{
    Level,
    tokio::write::{GzipEncoder, XzEncoder, ZstdEncoder},
};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};

/// zstd compression level for `.tar.zst`.
pub const ZSTD_LEVEL: i32 = 19;

/// Compression applied to a tarball.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    Gzip,
    Xz,
    Zstd,
}

/// Entry path inside an archive: `root_name` followed by the entry's
/// components relative to the staged directory.
pub(super) fn entry_name(root_name: &str, relative: &Path) -> String {
    std::iter::once(root_name.to_string())
        .chain(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
pub(super) fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
pub(super) fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    0o644
}

/// Writes `source_dir` as an uncompressed tar whose single top-level
/// directory is `root_name`.
fn write_tar_blocking(source_dir: &Path, root_name: &str, dest: &Path) -> Result<()> {
    let file = std::fs::File::create(dest).fs_context("creating tarball", dest)?;
    let mut builder = tar::Builder::new(std::io::BufWriter::new(file));

    for entry in walkdir::WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .context("walked outside of staging directory")?;
        let name = entry_name(root_name, relative);

        let mut header = tar::Header::new_gnu();
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);

        if entry.file_type().is_dir() {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder
                .append_data(&mut header, format!("{name}/"), std::io::empty())
                .fs_context("appending directory to tarball", entry.path())?;
        } else if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            let contents =
                std::fs::File::open(entry.path()).fs_context("opening file for tarball", entry.path())?;
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(file_mode(&metadata));
            header.set_size(metadata.len());
            builder
                .append_data(&mut header, &name, contents)
                .fs_context("appending file to tarball", entry.path())?;
        } else {
            return Err(Error::GenericError(format!(
                "unsupported file type in staging directory: {}",
                entry.path().display()
            )));
        }
    }

    let mut writer = builder.into_inner().fs_context("finishing tarball", dest)?;
    std::io::Write::flush(&mut writer).fs_context("flushing tarball", dest)?;
    Ok(())
}

async fn encode<W: AsyncWrite + Unpin>(tar_path: &Path, mut encoder: W) -> Result<()> {
    let input = tokio::fs::File::open(tar_path)
        .await
        .fs_context("opening tarball", tar_path)?;
    let mut reader = BufReader::new(input);

    tokio::io::copy(&mut reader, &mut encoder)
        .await
        .fs_context("compressing tarball", tar_path)?;
    encoder
        .shutdown()
        .await
        .fs_context("finishing compressed tarball", tar_path)?;
    Ok(())
}

/// Compresses an existing tar file into `dest`.
pub async fn compress(tar_path: &Path, dest: &Path, compression: Compression) -> Result<()> {
    let output = tokio::fs::File::create(dest)
        .await
        .fs_context("creating archive", dest)?;

    match compression {
        Compression::Gzip => encode(tar_path, GzipEncoder::new(output)).await,
        Compression::Xz => encode(tar_path, XzEncoder::new(output)).await,
        Compression::Zstd => {
            encode(
                tar_path,
                ZstdEncoder::with_quality(output, Level::Precise(ZSTD_LEVEL)),
            )
            .await
        }
    }
}

/// Creates `dest` as a compressed tarball of `source_dir`, rooted at `root_name`.
pub async fn create_tarball(
    source_dir: &Path,
    root_name: &str,
    dest: &Path,
    compression: Compression,
) -> Result<()> {
    let mut staging_name = dest.as_os_str().to_owned();
    staging_name.push(".tar-staging");
    let tar_path = PathBuf::from(staging_name);

    let result = async {
        let (source, root, tar) = (
            source_dir.to_path_buf(),
            root_name.to_string(),
            tar_path.clone(),
        );
        tokio::task::spawn_blocking(move || write_tar_blocking(&source, &root, &tar))
            .await
            .map_err(|e| Error::GenericError(format!("tarball task panicked: {e}")))??;

        compress(&tar_path, dest, compression).await
    }
    .await;

    fs::remove_file(&tar_path).await?;
    if result.is_err() {
        fs::remove_file(dest).await?;
    }
    result
}
