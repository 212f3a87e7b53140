//! Authenticated HTTP executor for the KBRemote API.
//!
//! `KbClient` wraps a `reqwest::Client` and the caller's API credentials,
//! providing signed JSON request helpers (`get`, `post`, `patch`, `delete`)
//! and a multipart upload method. Every request is signed per attempt: the
//! `Timestamp` header changes on each send, so the HMAC signature is
//! recomputed rather than reused.
//!
//! Rate-limit behavior:
//! - JSON requests that receive `429 Too Many Requests` sleep for a backoff
//!   interval and are re-issued identically. Retries are bounded by a
//!   [`RetryPolicy`] (default: 5 attempts, 1s initial backoff, doubling) —
//!   the service's rate limiting is transient, but an uncapped loop could
//!   spin forever against a misbehaving endpoint.
//! - Uploads are **never** retried on 429: a `reqwest::multipart::Form` is
//!   consumed on send, so the caller must rebuild the form and retry at the
//!   application level. The 429 surfaces as [`KbError::Service`].
//! - Transport failures (DNS, TCP, TLS, timeout) are never retried here.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;

use crate::auth;
use crate::error::{KbError, Result};
use crate::normalize::{normalize, NormalizeError, Value};

const BASE_URL: &str = "https://www.kbremote.net";

/// Fixed path segment prepended to every resource path. Participates in
/// signing: the signed path is `/api/<resource>`, never the bare resource.
const API_PREFIX: &str = "/api";

/// Connect timeout for API calls. Covers TCP + TLS handshake only.
const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout, including response body download. Generous
/// because file-group uploads can carry multi-MB payloads.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Builds a `reqwest::Client` with explicit timeouts for KBRemote API calls.
fn build_api_client() -> Client {
    Client::builder()
        .connect_timeout(API_CONNECT_TIMEOUT)
        .timeout(API_REQUEST_TIMEOUT)
        .build()
        .expect("failed to build HTTP client for the KBRemote API")
}

/// Bounded retry policy for rate-limited (429) JSON requests.
///
/// The backoff doubles after each rate-limited attempt. `max_attempts`
/// counts every transport call including the first, so the default of 5
/// allows up to 4 retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts allowed per logical request, including the first.
    pub max_attempts: u32,
    /// Sleep before the first retry; doubles after each subsequent 429.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Authenticated client for the KBRemote REST API.
///
/// Credentials, base URL, and retry policy are immutable after construction,
/// which makes concurrent calls against one instance (or across clones of
/// the inner `reqwest::Client`) safe — there is no shared mutable state.
#[derive(Debug)]
pub struct KbClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    retry: RetryPolicy,
}

impl KbClient {
    /// Creates a client for the production KBRemote endpoint.
    ///
    /// # Errors
    ///
    /// [`KbError::Caller`] when either credential is empty.
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self> {
        Self::with_base_url(api_key, api_secret, BASE_URL)
    }

    /// Creates a client against a custom base URL, used by tests to point
    /// at a local mock server instead of the real service.
    pub fn with_base_url(api_key: &str, api_secret: &str, base_url: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(KbError::Caller("api key must be set".to_string()));
        }
        if api_secret.is_empty() {
            return Err(KbError::Caller("api secret must be set".to_string()));
        }
        Ok(KbClient {
            client: build_api_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the rate-limit retry policy. Consumes and returns the client
    /// so it composes with the constructors.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Core JSON dispatch: signs, sends, maps the status, and normalizes
    /// the body. All verb helpers delegate here.
    ///
    /// `path` is resource-relative (`"device/5"`); the `/api` prefix is
    /// added here and participates in the signature. Query parameters are
    /// appended to the URL but are not part of the signed path.
    ///
    /// On 429 the request is re-issued after a backoff sleep, up to the
    /// retry policy's attempt budget; each attempt is signed with a fresh
    /// timestamp. A 429 that outlives the budget surfaces as
    /// [`KbError::Service`].
    async fn request_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&B>,
    ) -> Result<Value> {
        let signed_path = format!("{API_PREFIX}/{path}");
        let url = format!("{}{signed_path}", self.base_url);

        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;
        loop {
            let mut req = self.signed_request(method.clone(), &url, &signed_path);
            if let Some(query) = query {
                req = req.query(query);
            }
            if let Some(payload) = body {
                tracing::debug!(body = ?serde_json::to_value(payload).ok(), "request body");
                // .json() also sets Content-Type: application/json.
                req = req.json(payload);
            }

            tracing::debug!(%method, path = %signed_path, attempt, "dispatching request");
            let resp = req.send().await?;
            let status = resp.status();
            tracing::debug!(%status, path = %signed_path, "response received");

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.retry.max_attempts {
                tracing::debug!(path = %signed_path, ?backoff, "rate limited, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
                continue;
            }

            return map_response(resp).await;
        }
    }

    /// Constructs a request builder with the signed headers attached.
    ///
    /// Factored out so JSON attempts and uploads share the header logic.
    /// Stamps the clock via [`auth::headers`], so the `Timestamp` header and
    /// the signed message always carry identical bytes.
    fn signed_request(&self, method: Method, url: &str, signed_path: &str) -> reqwest::RequestBuilder {
        let signed = auth::headers(method.as_str(), signed_path, &self.api_key, &self.api_secret);
        self.client
            .request(method, url)
            .header("Authentication", signed.authentication)
            .header("Timestamp", signed.timestamp)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Sends a signed GET request and returns the normalized response.
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request_json::<()>(Method::GET, path, None, None).await
    }

    /// Sends a signed GET request with query parameters.
    pub async fn get_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.request_json::<()>(Method::GET, path, Some(query), None)
            .await
    }

    /// Sends a signed POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.request_json(Method::POST, path, None, Some(body)).await
    }

    /// Sends a signed PATCH request with a JSON body.
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.request_json(Method::PATCH, path, None, Some(body)).await
    }

    /// Sends a signed DELETE request with an optional JSON body (the
    /// file-group file endpoint takes the path to delete in the body).
    pub async fn delete<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<Value> {
        self.request_json(Method::DELETE, path, None, body).await
    }

    /// Sends a signed multipart upload and returns the normalized response.
    ///
    /// No JSON content type is set and no 429 retry is attempted: the form
    /// is consumed on send, so a rate-limited upload surfaces immediately
    /// as [`KbError::Service`] and the caller decides whether to rebuild
    /// and resend.
    pub async fn upload(&self, path: &str, form: reqwest::multipart::Form) -> Result<Value> {
        let signed_path = format!("{API_PREFIX}/{path}");
        let url = format!("{}{signed_path}", self.base_url);

        tracing::debug!(path = %signed_path, "dispatching upload");
        let resp = self
            .signed_request(Method::POST, &url, &signed_path)
            .multipart(form)
            .send()
            .await?;
        tracing::debug!(status = %resp.status(), path = %signed_path, "upload response received");

        map_response(resp).await
    }
}

/// Maps a completed HTTP response onto the error taxonomy, normalizing the
/// body on success.
async fn map_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    match status {
        StatusCode::OK => {
            let text = resp.text().await?;
            let raw: serde_json::Value =
                serde_json::from_str(&text).map_err(NormalizeError::from)?;
            let normalized = normalize(raw)?;
            tracing::debug!(body = ?normalized, "response normalized");
            Ok(normalized)
        }
        StatusCode::NOT_FOUND => Err(KbError::NotFound),
        StatusCode::FORBIDDEN => Err(KbError::Forbidden),
        _ => Err(KbError::Service {
            status,
            body: resp.text().await.unwrap_or_default(),
        }),
    }
}

/// Derives a resource path from an accessor-style name by splitting on
/// underscores and capitalizing each segment (`"device_group"` →
/// `"DeviceGroup"`).
///
/// The facades in this crate pass explicit paths, but accessor-style callers
/// that name their methods after resources can use this to avoid repeating
/// the derivation.
pub fn resource_path(call_site: &str) -> String {
    call_site
        .split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
