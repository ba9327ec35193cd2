//! Zip creation for release archives and extraction of signed bundles.

use super::tarball::{entry_name, file_mode};
use crate::bundler::{
    Result,
    error::{Context, Error, ErrorExt},
    utils::fs,
};
use std::path::{Path, PathBuf};
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter, write::SimpleFileOptions};

fn write_zip_blocking(source_dir: &Path, root_name: &str, dest: &Path) -> Result<()> {
    let file = std::fs::File::create(dest).fs_context("creating zip archive", dest)?;
    let mut writer = ZipWriter::new(std::io::BufWriter::new(file));

    let base = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for entry in walkdir::WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .context("walked outside of staging directory")?;
        let name = entry_name(root_name, relative);

        if entry.file_type().is_dir() {
            writer.add_directory(format!("{name}/"), base.unix_permissions(0o755))?;
        } else if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            writer.start_file(name, base.unix_permissions(file_mode(&metadata)))?;
            let mut contents =
                std::fs::File::open(entry.path()).fs_context("opening file for zip", entry.path())?;
            std::io::copy(&mut contents, &mut writer)
                .fs_context("writing file into zip", entry.path())?;
        } else {
            return Err(Error::GenericError(format!(
                "unsupported file type in staging directory: {}",
                entry.path().display()
            )));
        }
    }

    writer.finish()?;
    Ok(())
}

/// Creates `dest` as a zip of `source_dir`, rooted at `root_name`, with every
/// entry stamped with the DOS epoch.
pub async fn create_zip(source_dir: &Path, root_name: &str, dest: &Path) -> Result<()> {
    let (source, root, out) = (
        source_dir.to_path_buf(),
        root_name.to_string(),
        dest.to_path_buf(),
    );
    let result = tokio::task::spawn_blocking(move || write_zip_blocking(&source, &root, &out))
        .await
        .map_err(|e| Error::GenericError(format!("zip task panicked: {e}")))?;

    if result.is_err() {
        fs::remove_file(dest).await?;
    }
    result
}

/// Extracts every entry of `archive` into `dest_dir`, keeping unix modes.
pub async fn extract_zip(archive: &Path, dest_dir: &Path) -> Result<()> {
    let (archive, dest): (PathBuf, PathBuf) = (archive.to_path_buf(), dest_dir.to_path_buf());
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&archive).fs_context("opening zip archive", &archive)?;
        let mut zip = ZipArchive::new(std::io::BufReader::new(file))?;
        zip.extract(&dest)?;
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("unzip task panicked: {e}")))?
}
