//! HMAC request signing for the KBRemote API.
//!
//! Every request carries two headers derived from the caller's credentials:
//!
//! - `Authentication: <apiKey>:<base64 HMAC-SHA256 signature>`
//! - `Timestamp: <UTC "YYYY-MM-DD HH:MM:SS">`
//!
//! The signed message is `UPPERCASE(verb) + timestamp + path` concatenated
//! with **no separators**, keyed by the API secret. The ordering and the
//! absence of delimiters are part of the wire contract — any deviation
//! produces a signature the service rejects. `path` is the full path as sent
//! on the wire including the fixed `/api` prefix, excluding the query string.
//!
//! The timestamp inside the signed message and the `Timestamp` header must be
//! byte-identical, so [`headers`] stamps the clock exactly once per request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Wire format of the `Timestamp` header and the timestamp inside the
/// signed message: UTC, second precision, no zone suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The signed header pair attached to every API request.
///
/// Derived deterministically from (verb, path, credentials, timestamp);
/// never reused across requests because the timestamp changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `Authentication` header value: `"<apiKey>:<signature>"`.
    pub authentication: String,
    /// `Timestamp` header value, byte-identical to the timestamp that was
    /// signed into `authentication`.
    pub timestamp: String,
}

/// Computes the base64 HMAC-SHA256 signature for a request.
///
/// The message is `UPPERCASE(verb) ++ timestamp ++ path` with no separators.
/// Malformed inputs are a caller-contract violation, not a runtime fault:
/// HMAC accepts keys of any length, so this cannot fail.
pub fn sign(verb: &str, path: &str, secret: &str, timestamp: &str) -> String {
    let message = format!("{}{timestamp}{path}", verb.to_uppercase());
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Builds the signed header pair for a request, stamping the current time.
///
/// `path` must be the exact path that will be sent on the wire, including
/// the `/api` prefix and excluding any query string.
pub fn headers(verb: &str, path: &str, api_key: &str, api_secret: &str) -> SignedHeaders {
    let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
    headers_at(verb, path, api_key, api_secret, &timestamp)
}

/// Like [`headers`] but with an explicit timestamp, for deterministic tests.
pub fn headers_at(
    verb: &str,
    path: &str,
    api_key: &str,
    api_secret: &str,
    timestamp: &str,
) -> SignedHeaders {
    SignedHeaders {
        authentication: format!("{api_key}:{}", sign(verb, path, api_secret, timestamp)),
        timestamp: timestamp.to_string(),
    }
}
