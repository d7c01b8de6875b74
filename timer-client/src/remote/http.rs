//! HTTP remote backed by `reqwest`.
//!
//! Talks to `{endpoint}/api/sync` with a bearer token. Status codes are
//! classified before the body is decoded:
//!
//! | Status | Meaning                    |
//! |--------|----------------------------|
//! | 2xx    | decode body, check success |
//! | 401    | not authenticated          |
//! | 400    | payload rejected           |
//! | other  | transport failure          |

use std::time::Duration;

use super::{check_pull, check_push, RemoteError, RemoteStore};
use async_trait::async_trait;
use cubetime_types::{PullResponse, PushRequest, PushResponse};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP remote store.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    url: String,
    token: String,
}

/// Error body shape of 4xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl HttpRemote {
    /// Create a remote for `endpoint` (e.g. `http://localhost:8787`).
    pub fn new(endpoint: &str, token: &str) -> Result<Self, RemoteError> {
        Self::with_timeout(endpoint, token, DEFAULT_TIMEOUT)
    }

    /// Create a remote with a custom request timeout.
    pub fn with_timeout(
        endpoint: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: sync_url(endpoint),
            token: token.to_string(),
        })
    }

    /// The full sync URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let response = classify(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

fn sync_url(endpoint: &str) -> String {
    format!("{}/api/sync", endpoint.trim_end_matches('/'))
}

async fn classify(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(RemoteError::Unauthenticated),
        StatusCode::BAD_REQUEST => {
            let reason = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status.to_string());
            Err(RemoteError::Rejected(reason))
        }
        _ => Err(RemoteError::Transport(format!("HTTP {}", status))),
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn pull(&self) -> Result<PullResponse, RemoteError> {
        tracing::debug!(url = %self.url, "pulling");
        let response: PullResponse = self.send(self.client.get(&self.url)).await?;
        check_pull(response)
    }

    async fn push(&self, request: PushRequest) -> Result<PushResponse, RemoteError> {
        tracing::debug!(
            url = %self.url,
            solves = request.solves.as_ref().map(Vec::len),
            settings = request.settings.is_some(),
            "pushing"
        );
        let response: PushResponse = self
            .send(self.client.post(&self.url).json(&request))
            .await?;
        check_push(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_built_from_endpoint() {
        assert_eq!(sync_url("http://localhost:8787"), "http://localhost:8787/api/sync");
        assert_eq!(sync_url("https://cube.example/"), "https://cube.example/api/sync");
    }

    #[test]
    fn new_keeps_url() {
        let remote = HttpRemote::new("http://127.0.0.1:1", "token").unwrap();
        assert_eq!(remote.url(), "http://127.0.0.1:1/api/sync");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Port 1 on loopback is never listening.
        let remote =
            HttpRemote::with_timeout("http://127.0.0.1:1", "token", Duration::from_secs(2))
                .unwrap();
        let result = remote.pull().await;
        assert!(matches!(result, Err(RemoteError::Transport(_))));
    }
}
