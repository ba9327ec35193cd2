//! Signing job lifecycle: submit, start, poll.

use super::{
    auth::uri_encode,
    manifest::SigningManifest,
    status::SigningStatus,
    transport::{SigningResponse, SigningTransport},
};
use crate::bundler::{Error, Result, settings::SigningCredentials};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

/// Requests sent before a rate-limited endpoint is given up on.
pub const MAX_ATTEMPTS: u32 = 7;

/// Delay between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Sleep after the `attempt`-th consecutive HTTP 429 (1-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

/// `/signing_requests/<id>` with the id encoded as one path segment.
fn request_path(request_id: &str) -> String {
    format!("/signing_requests/{}", uri_encode(request_id, true))
}

/// A signing request accepted by the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningJob {
    pub request_id: String,
    pub source_key: String,
    pub destination_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    signing_request_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    signing_request: StatusBody,
}

#[derive(Deserialize)]
struct StatusBody {
    status: SigningStatus,
}

/// Client for the remote signing service.
#[derive(Clone)]
pub struct SigningClient {
    transport: Arc<dyn SigningTransport>,
}

impl std::fmt::Debug for SigningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningClient").finish_non_exhaustive()
    }
}

impl SigningClient {
    pub fn new(transport: Arc<dyn SigningTransport>) -> Self {
        Self { transport }
    }

    /// Sends a request, sleeping `2^attempt` seconds after each HTTP 429.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] on 401/403, without retrying
    /// - [`Error::RateLimited`] after [`MAX_ATTEMPTS`] consecutive 429s
    /// - [`Error::UnexpectedResponse`] on any other non-2xx status
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<SigningResponse> {
        let endpoint = format!("{method} {path}");

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .transport
                .send(method.clone(), path, body.clone())
                .await?;

            match response.status {
                429 => {
                    let delay = backoff_delay(attempt);
                    log::warn!(
                        "{} rate limited (attempt {}/{}), retrying in {}s",
                        endpoint,
                        attempt,
                        MAX_ATTEMPTS,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                401 | 403 => {
                    return Err(Error::Authentication {
                        endpoint,
                        status: response.status,
                    });
                }
                _ if response.is_success() => return Ok(response),
                status => {
                    return Err(Error::UnexpectedResponse {
                        endpoint,
                        status,
                        body: String::from_utf8_lossy(&response.body).into_owned(),
                    });
                }
            }
        }

        Err(Error::RateLimited {
            endpoint,
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Creates a signing request and returns its id.
    pub async fn submit(&self, manifest: &SigningManifest) -> Result<String> {
        let response = self
            .request(
                Method::POST,
                "/signing_requests",
                Some(json!({ "manifest": manifest })),
            )
            .await?;
        let SubmitResponse { signing_request_id } = response.json::<SubmitResponse>()?;

        log::info!("✓ Created signing request {}", signing_request_id);
        Ok(signing_request_id)
    }

    /// Starts a submitted request against objects in the signing bucket.
    pub async fn start(
        &self,
        request_id: &str,
        source_key: &str,
        destination_key: &str,
        credentials: &SigningCredentials,
    ) -> Result<()> {
        let body = json!({
            "iamRole": credentials.iam_role_arn(),
            "s3Location": {
                "bucket": credentials.bucket_name(),
                "sourceKey": source_key,
                "destinationKey": destination_key,
            }
        });
        self.request(
            Method::POST,
            &format!("{}/start", request_path(request_id)),
            Some(body),
        )
        .await?;

        log::info!("✓ Started signing request {}", request_id);
        Ok(())
    }

    /// Fetches the current status of a request.
    pub async fn poll_status(&self, request_id: &str) -> Result<SigningStatus> {
        let response = self
            .request(Method::GET, &request_path(request_id), None)
            .await?;
        let StatusResponse { signing_request } = response.json::<StatusResponse>()?;
        Ok(signing_request.status)
    }

    /// Polls every [`POLL_INTERVAL`] until the request succeeds.
    ///
    /// The deadline is `max_duration` after this call starts. A non-terminal
    /// status observed at or past the deadline ends the wait with
    /// [`Error::SigningTimeout`]. The remote job is left as is.
    pub async fn await_completion(&self, request_id: &str, max_duration: Duration) -> Result<()> {
        let deadline = Instant::now() + max_duration;

        loop {
            match self.poll_status(request_id).await? {
                SigningStatus::Success => {
                    log::info!("✓ Signing request {} succeeded", request_id);
                    return Ok(());
                }
                SigningStatus::Failure => {
                    return Err(Error::SigningFailed {
                        request_id: request_id.to_string(),
                    });
                }
                SigningStatus::Unrecognized(other) => {
                    log::warn!(
                        "Signing request {} reported unknown status {:?}, still waiting",
                        request_id,
                        other
                    );
                }
                status => log::debug!("Signing request {} is {}", request_id, status),
            }

            if Instant::now() >= deadline {
                return Err(Error::SigningTimeout {
                    request_id: request_id.to_string(),
                    seconds: max_duration.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Submits `manifest`, starts it on `source_key` and waits for the
    /// signed result to land at `destination_key`.
    pub async fn sign(
        &self,
        manifest: &SigningManifest,
        source_key: &str,
        destination_key: &str,
        credentials: &SigningCredentials,
        max_duration: Duration,
    ) -> Result<SigningJob> {
        let request_id = self.submit(manifest).await?;
        self.start(&request_id, source_key, destination_key, credentials)
            .await?;
        self.await_completion(&request_id, max_duration).await?;

        Ok(SigningJob {
            request_id,
            source_key: source_key.to_string(),
            destination_key: destination_key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(MAX_ATTEMPTS), Duration::from_secs(128));
    }

    #[test]
    fn request_ids_are_one_path_segment() {
        assert_eq!(request_path("req-42"), "/signing_requests/req-42");
        assert_eq!(request_path("a/b?c#d"), "/signing_requests/a%2Fb%3Fc%23d");
    }

    #[test]
    fn status_response_shape() {
        let response = SigningResponse::new(200, r#"{"signingRequest":{"status":"inProgress"}}"#);
        let parsed: StatusResponse = response.json().unwrap();
        assert_eq!(parsed.signing_request.status, SigningStatus::InProgress);
    }
}
