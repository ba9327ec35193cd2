//! Package identity.

/// Names and identifiers of the application being released.
#[derive(Debug, Clone)]
pub struct PackageSettings {
    /// Cargo package to build and test.
    pub package_name: String,

    /// Canonical file name of the shipped binary and top-level archive directory.
    pub binary_name: String,

    /// Bundle identifier sent to the signing service.
    pub app_identifier: String,

    /// Apple team id used as the signing certificate's app id prefix.
    ///
    /// Required only when remote signing is enabled.
    pub apple_team_id: Option<String>,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            package_name: "qchat".into(),
            binary_name: "qchat".into(),
            app_identifier: "com.amazon.codewhisperer".into(),
            apple_team_id: None,
        }
    }
}
