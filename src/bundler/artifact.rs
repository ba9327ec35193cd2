//! Release artifact model.

use std::fmt;
use std::path::{Path, PathBuf};

/// Format of a produced distributable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ArtifactFormat {
    /// gzip-compressed tarball
    TarGz,
    /// xz-compressed tarball
    TarXz,
    /// zstd-compressed tarball
    TarZst,
    /// zip archive
    Zip,
    /// bare (signed) executable
    Executable,
}

impl ArtifactFormat {
    /// Archive formats produced for Linux, in production order.
    pub const ARCHIVES: [Self; 4] = [Self::TarGz, Self::TarXz, Self::TarZst, Self::Zip];

    /// File extension without the leading dot. Empty for executables.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
            Self::Executable => "",
        }
    }

    /// File name for an artifact of this format.
    pub fn file_name(&self, stem: &str) -> String {
        match self {
            Self::Executable => stem.to_string(),
            other => format!("{stem}.{}", other.extension()),
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executable => f.write_str("executable"),
            other => f.write_str(other.extension()),
        }
    }
}

/// One produced file with its derived outputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactOutput {
    pub format: ArtifactFormat,
    pub path: PathBuf,
    /// Exactly one checksum per output.
    pub checksum_path: PathBuf,
    /// Present iff an active detached signer was used.
    pub signature_path: Option<PathBuf>,
}

/// A built binary plus every distributable derived from it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReleaseArtifact {
    pub binary_path: PathBuf,
    pub outputs: Vec<ArtifactOutput>,
}

impl ReleaseArtifact {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            outputs: Vec::new(),
        }
    }

    /// Every durable file of the release, in upload order: each output
    /// followed by its checksum and signature.
    pub fn files(&self) -> Vec<&Path> {
        self.outputs
            .iter()
            .flat_map(|output| {
                [Some(&output.path), Some(&output.checksum_path)]
                    .into_iter()
                    .chain(std::iter::once(output.signature_path.as_ref()))
                    .flatten()
                    .map(PathBuf::as_path)
            })
            .collect()
    }

    /// Signature files produced for this release.
    pub fn signatures(&self) -> impl Iterator<Item = &Path> {
        self.outputs
            .iter()
            .filter_map(|output| output.signature_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(ArtifactFormat::TarZst.file_name("qchat"), "qchat.tar.zst");
        assert_eq!(ArtifactFormat::Zip.file_name("qchat"), "qchat.zip");
        assert_eq!(ArtifactFormat::Executable.file_name("qchat"), "qchat");
    }

    #[test]
    fn files_lists_outputs_with_checksums_and_signatures() {
        let artifact = ReleaseArtifact {
            binary_path: "build/bin/qchat".into(),
            outputs: vec![
                ArtifactOutput {
                    format: ArtifactFormat::TarGz,
                    path: "build/qchat.tar.gz".into(),
                    checksum_path: "build/qchat.tar.gz.sha256".into(),
                    signature_path: Some("build/qchat.tar.gz.sig".into()),
                },
                ArtifactOutput {
                    format: ArtifactFormat::Zip,
                    path: "build/qchat.zip".into(),
                    checksum_path: "build/qchat.zip.sha256".into(),
                    signature_path: None,
                },
            ],
        };

        let files: Vec<_> = artifact.files().iter().map(|p| p.display().to_string()).collect();
        assert_eq!(
            files,
            [
                "build/qchat.tar.gz",
                "build/qchat.tar.gz.sha256",
                "build/qchat.tar.gz.sig",
                "build/qchat.zip",
                "build/qchat.zip.sha256",
            ]
        );
        assert_eq!(artifact.signatures().count(), 1);
    }
}
