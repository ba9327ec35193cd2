//! Wire transport to the signing service.

use super::auth::RequestSigner;
use crate::bundler::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Raw response from the signing service.
#[derive(Clone, Debug)]
pub struct SigningResponse {
    pub status: u16,
    pub body: Bytes,
}

impl SigningResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends one request to the signing service.
///
/// Implementations report every HTTP status as a [`SigningResponse`]; only
/// transport-level failures (connection refused, TLS) are errors. Retry and
/// status handling belong to [`SigningClient`](super::SigningClient).
#[async_trait]
pub trait SigningTransport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<SigningResponse>;
}

/// `reqwest` transport that signs every request with SigV4.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    signer: RequestSigner,
}

impl HttpTransport {
    pub fn new(base_url: &str, signer: RequestSigner) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            Error::configuration(format!("invalid signing service URL {base_url}: {e}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            signer,
        })
    }
}

#[async_trait]
impl SigningTransport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<SigningResponse> {
        let url = self.base_url.join(path).map_err(|e| {
            Error::configuration(format!("invalid signing service path {path}: {e}"))
        })?;
        let payload = match body {
            Some(value) => serde_json::to_vec(&value)?,
            None => Vec::new(),
        };

        let headers = self.signer.sign(
            method.as_str(),
            &url,
            &[("content-type", "application/json")],
            &payload,
            chrono::Utc::now(),
        )?;

        log::debug!("{} {}", method, url);
        let mut request = self.client.request(method, url);
        // reqwest derives Host from the URL; it matches the signed value.
        for (name, value) in headers.into_iter().filter(|(name, _)| name != "host") {
            request = request.header(name, value);
        }

        let response = request.body(payload).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(SigningResponse { status, body })
    }
}
