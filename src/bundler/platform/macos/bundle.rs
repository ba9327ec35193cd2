//! Signing package layout.
//!
//! ```text
//! package.tar.gz
//! └─ EXECUTABLES_TO_SIGN
//!    └─ qchat
//! ```

use crate::bundler::{
    Result,
    archive::{Compression, create_tarball},
    error::Context,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Directory inside the package the signing service looks for binaries in.
pub const EXECUTABLES_DIR: &str = "EXECUTABLES_TO_SIGN";

/// File name of the package uploaded for signing.
pub const PACKAGE_FILE: &str = "package.tar.gz";

/// Working directory the package is assembled in, under the build dir.
pub const WORKING_DIR: &str = "package";

/// Moves `binary` into `<build_dir>/package/EXECUTABLES_TO_SIGN/` and packs
/// that directory into `<build_dir>/package.tar.gz`.
///
/// `binary` no longer exists afterwards; the signed copy replaces it.
pub async fn create_signing_package(build_dir: &Path, binary: &Path) -> Result<PathBuf> {
    let file_name = binary
        .file_name()
        .context(format!("{} has no file name", binary.display()))?;

    let working_dir = build_dir.join(WORKING_DIR);
    let executables_dir = working_dir.join(EXECUTABLES_DIR);
    fs::create_dir_all(&working_dir, true).await?;
    fs::create_dir_all(&executables_dir, false).await?;

    fs::copy_file(binary, &executables_dir.join(file_name)).await?;
    fs::remove_file(binary).await?;

    let package_path = build_dir.join(PACKAGE_FILE);
    create_tarball(&executables_dir, EXECUTABLES_DIR, &package_path, Compression::Gzip).await?;

    log::info!("✓ Created signing package {}", package_path.display());
    Ok(package_path)
}

/// Removes the signing working directory and the listed scratch files
/// from `build_dir`. Missing entries are not an error.
pub async fn remove_signing_files(build_dir: &Path, files: &[&str]) -> Result<()> {
    fs::remove_dir_all(&build_dir.join(WORKING_DIR)).await?;
    for file in files {
        fs::remove_file(&build_dir.join(file)).await?;
    }
    Ok(())
}
