//! Signing request manifest.

use serde::Serialize;

const CERTIFICATE_TYPE: &str = "developerIDAppDistribution";

/// Describes what the signing service should sign and with which identity.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SigningManifest {
    #[serde(rename = "type")]
    pub kind: String,
    pub os: String,
    pub name: String,
    pub outputs: Vec<ManifestOutput>,
    pub app: ManifestApp,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ManifestOutput {
    pub label: String,
    pub path: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ManifestApp {
    pub identifier: String,
    pub signing_requirements: SigningRequirements,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SigningRequirements {
    pub certificate_type: String,
    pub app_id_prefix: String,
}

impl SigningManifest {
    /// Manifest for a macOS command-line app named `name`, signed with a
    /// Developer ID Application certificate of `team_id`.
    pub fn macos_app(name: &str, identifier: &str, team_id: &str) -> Self {
        Self {
            kind: "app".into(),
            os: "osx".into(),
            name: name.into(),
            outputs: vec![ManifestOutput {
                label: "macos".into(),
                path: name.into(),
            }],
            app: ManifestApp {
                identifier: identifier.into(),
                signing_requirements: SigningRequirements {
                    certificate_type: CERTIFICATE_TYPE.into(),
                    app_id_prefix: team_id.into(),
                },
            },
        }
    }
}
