//! Credential bundles threaded through one release.
//!
//! All of these are resolved once at startup and passed down explicitly;
//! nothing here is cached process-wide.

use crate::bundler::error::{Error, Result};
use std::fmt;

/// Environment variable holding the GPG key id used for detached signatures.
pub const GPG_KEY_ID_ENV: &str = "QCHAT_GPG_KEY_ID";
/// Environment variable holding the base64-encoded armored GPG secret key.
pub const GPG_SECRET_KEY_ENV: &str = "QCHAT_GPG_SECRET_KEY";
/// Environment variable holding the base64-encoded GPG passphrase.
pub const GPG_PASSPHRASE_ENV: &str = "QCHAT_GPG_PASSPHRASE";

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_var(name: &str) -> Option<String> {
    present(std::env::var(name).ok())
}

/// Everything needed to reach the remote signing service for one release.
///
/// Either all four fields are known or signing is disabled; there is no
/// partially configured state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    bucket_name: String,
    aws_account_id: String,
    signing_role_name: String,
    notarizing_secret_id: String,
}

impl SigningCredentials {
    /// Builds credentials when every part is present and non-empty.
    ///
    /// Returns `None` for any partial combination.
    pub fn from_parts(
        bucket_name: Option<String>,
        aws_account_id: Option<String>,
        notarizing_secret_id: Option<String>,
        signing_role_name: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            bucket_name: present(bucket_name)?,
            aws_account_id: present(aws_account_id)?,
            signing_role_name: present(signing_role_name)?,
            notarizing_secret_id: present(notarizing_secret_id)?,
        })
    }

    /// Bucket used as signing scratch space.
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Account that owns the signing role.
    pub fn aws_account_id(&self) -> &str {
        &self.aws_account_id
    }

    /// Role the signing service assumes to reach the bucket.
    pub fn signing_role_name(&self) -> &str {
        &self.signing_role_name
    }

    /// Secret id holding the notarization credentials.
    pub fn notarizing_secret_id(&self) -> &str {
        &self.notarizing_secret_id
    }

    /// `arn:aws:iam::<account>:role/<role>`
    pub fn iam_role_arn(&self) -> String {
        format!(
            "arn:aws:iam::{}:role/{}",
            self.aws_account_id, self.signing_role_name
        )
    }
}

/// AWS access keys used to sign requests to the signing service.
#[derive(Clone)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    /// Creates credentials from explicit values.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: present(session_token),
        }
    }

    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Option<Self> {
        Some(Self::new(
            env_var("AWS_ACCESS_KEY_ID")?,
            env_var("AWS_SECRET_ACCESS_KEY")?,
            env_var("AWS_SESSION_TOKEN"),
        ))
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Key material for the GPG detached signer.
#[derive(Clone)]
pub struct GpgSettings {
    key_id: String,
    secret_key_b64: String,
    passphrase_b64: String,
}

impl GpgSettings {
    /// Resolves GPG settings from their parts.
    ///
    /// No key id means GPG signing is not configured. A key id without both
    /// the key and the passphrase is a configuration error.
    pub fn from_parts(
        key_id: Option<String>,
        secret_key_b64: Option<String>,
        passphrase_b64: Option<String>,
    ) -> Result<Option<Self>> {
        let Some(key_id) = present(key_id) else {
            return Ok(None);
        };

        match (present(secret_key_b64), present(passphrase_b64)) {
            (Some(secret_key_b64), Some(passphrase_b64)) => Ok(Some(Self {
                key_id,
                secret_key_b64,
                passphrase_b64,
            })),
            _ => Err(Error::configuration(format!(
                "{GPG_KEY_ID_ENV} is set but {GPG_SECRET_KEY_ENV} or {GPG_PASSPHRASE_ENV} is missing"
            ))),
        }
    }

    /// Reads the `QCHAT_GPG_*` environment variables.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_parts(
            env_var(GPG_KEY_ID_ENV),
            env_var(GPG_SECRET_KEY_ENV),
            env_var(GPG_PASSPHRASE_ENV),
        )
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn secret_key_b64(&self) -> &str {
        &self.secret_key_b64
    }

    pub fn passphrase_b64(&self) -> &str {
        &self.passphrase_b64
    }
}

impl fmt::Debug for GpgSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpgSettings")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn all_four_parts_enable_signing() {
        let creds = SigningCredentials::from_parts(
            some("signing-bucket"),
            some("123456789012"),
            some("apple-id-secret"),
            some("SigningRole"),
        )
        .unwrap();

        assert_eq!(creds.bucket_name(), "signing-bucket");
        assert_eq!(
            creds.iam_role_arn(),
            "arn:aws:iam::123456789012:role/SigningRole"
        );
    }

    #[test]
    fn any_missing_part_disables_signing() {
        assert!(
            SigningCredentials::from_parts(some("bucket"), some("123"), None, some("role"))
                .is_none()
        );
        assert!(
            SigningCredentials::from_parts(some("bucket"), some(""), some("s"), some("role"))
                .is_none()
        );
    }

    #[test]
    fn gpg_without_key_id_is_unconfigured() {
        assert!(GpgSettings::from_parts(None, some("a2V5"), None).unwrap().is_none());
    }

    #[test]
    fn gpg_key_id_without_secret_is_an_error() {
        let err = GpgSettings::from_parts(some("ABCDEF"), None, some("cGFzcw==")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = AwsCredentials::new("AKID", "super-secret", Some("token".into()));
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AKID"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("\"token\""));
    }
}
