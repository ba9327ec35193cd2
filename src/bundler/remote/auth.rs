//! AWS Signature Version 4 request signing.
//!
//! Only what the signing service needs: header-based signing of requests
//! with a fully buffered body.

use crate::bundler::{Error, Result, settings::AwsCredentials};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

/// Service name the signing service is registered under.
pub const SIGNING_SERVICE: &str = "signer-builder-tools";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

type HmacSha256 = Hmac<Sha256>;

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::GenericError(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// RFC 3986 encoding as SigV4 defines it: everything but unreserved
/// characters is percent-encoded with uppercase hex.
pub(super) fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}

/// `Host` header value for `url`, including the port when it is not the
/// scheme default.
pub fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::configuration(format!("signing service URL has no host: {url}")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k, true), uri_encode(&v, true)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Produces the authentication headers for one request.
#[derive(Clone, Debug)]
pub struct RequestSigner {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(credentials: AwsCredentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: SIGNING_SERVICE.to_string(),
        }
    }

    /// Overrides the service name in the credential scope.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Signs a request and returns every header it must carry: `headers`
    /// plus `host`, `x-amz-date`, `x-amz-security-token` (when the
    /// credentials are temporary) and `authorization`.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut canonical: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers {
            canonical
                .entry(name.to_ascii_lowercase())
                .or_default()
                .push(value.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        canonical.insert("host".into(), vec![host_header(url)?]);
        canonical.insert("x-amz-date".into(), vec![amz_date.clone()]);
        if let Some(token) = self.credentials.session_token() {
            canonical.insert("x-amz-security-token".into(), vec![token.to_string()]);
        }

        let canonical_headers: String = canonical
            .iter()
            .map(|(name, values)| format!("{name}:{}\n", values.join(",")))
            .collect();
        let signed_headers = canonical.keys().cloned().collect::<Vec<_>>().join(";");

        let canonical_request = format!(
            "{method}\n{uri}\n{query}\n{canonical_headers}\n{signed_headers}\n{payload}",
            uri = uri_encode(url.path(), false),
            query = canonical_query(url),
            payload = sha256_hex(body),
        );
        log::trace!("SigV4 canonical request:\n{}", canonical_request);

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let secret = format!("AWS4{}", self.credentials.secret_access_key());
        let k_date = hmac(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac(&k_date, self.region.as_bytes())?;
        let k_service = hmac(&k_region, self.service.as_bytes())?;
        let k_signing = hmac(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac(&k_signing, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id()
        );

        let mut signed: Vec<(String, String)> = canonical
            .into_iter()
            .map(|(name, values)| (name, values.join(",")))
            .collect();
        signed.push(("authorization".into(), authorization));
        Ok(signed)
    }
}
