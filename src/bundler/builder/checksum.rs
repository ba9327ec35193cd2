//! Artifact checksum calculation.
//!
//! Every distributable gets a sibling `<name>.sha256` file holding the
//! lowercase hex SHA-256 of its final bytes followed by a newline. Checksums
//! are generated one file at a time, after the file is complete.

use crate::bundler::{
    Result,
    error::{Context, ErrorExt},
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Extension appended to an artifact's file name for its checksum file.
pub const CHECKSUM_EXTENSION: &str = "sha256";

/// Calculates SHA256 checksum of a single file.
///
/// Reads the file in 8KB chunks to handle large files efficiently.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash (64 characters)
/// * `Err` - If file cannot be read
pub async fn calculate_sha256(file_path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening file for hashing", file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Path of the checksum file for `file_path` (`<name>.sha256` alongside it).
pub fn checksum_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.as_os_str().to_owned();
    name.push(".");
    name.push(CHECKSUM_EXTENSION);
    PathBuf::from(name)
}

/// Computes the digest of `file_path` and writes it to its sibling checksum file.
///
/// # Returns
///
/// Path of the written checksum file.
pub async fn generate(file_path: &Path) -> Result<PathBuf> {
    let digest = calculate_sha256(file_path).await?;
    let sha_path = checksum_path(file_path);

    tokio::fs::write(&sha_path, format!("{digest}\n"))
        .await
        .fs_context("writing checksum", &sha_path)?;

    log::debug!("{}  {}", digest, file_path.display());
    Ok(sha_path)
}

/// Recomputes the digest of `file_path` and compares it with `sha_path`.
pub async fn verify(file_path: &Path, sha_path: &Path) -> Result<bool> {
    let recorded = tokio::fs::read_to_string(sha_path)
        .await
        .fs_context("reading checksum", sha_path)?;
    let recorded = recorded
        .split_whitespace()
        .next()
        .context(format!("checksum file {} is empty", sha_path.display()))?;

    Ok(recorded.eq_ignore_ascii_case(&calculate_sha256(file_path).await?))
}
