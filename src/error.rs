//! Typed error hierarchy for the kbremote crate.
//!
//! `KbError` maps each variant to a real failure boundary rather than an
//! implementation detail:
//!
//! - `NotFound` / `Forbidden` — the service's 404/403 responses, surfaced as
//!   their own variants because callers routinely branch on them.
//! - `Service` — any other non-success status, preserving the status code
//!   and response body (the service puts diagnostic detail in error bodies).
//! - `Transport` — DNS/TCP/TLS/timeout failures where no status exists.
//! - `Normalization` — the round trip succeeded but the body could not be
//!   brought into canonical form (unparseable JSON, malformed timestamp).
//!   Propagated rather than swallowed: losing a malformed timestamp must be
//!   visible.
//! - `Caller` — invalid arguments (missing credentials, empty partial
//!   update). Raised before any request is issued and never retried.
//! - `Io` — local filesystem failures while preparing an upload.
//! - `UploadRejected` — the upload request itself succeeded but the service
//!   reported the file was not accepted.

use reqwest::StatusCode;

use crate::normalize::NormalizeError;

/// Unified error type for all kbremote library operations.
///
/// `#[source]`/`#[from]` chaining preserves the underlying cause so callers
/// and logging frameworks can traverse the full chain via `Error::source()`.
#[derive(Debug, thiserror::Error)]
pub enum KbError {
    /// The service returned 404 for the requested resource.
    #[error("resource not found (404)")]
    NotFound,

    /// The service returned 403; the credentials lack access to the resource.
    #[error("access forbidden (403)")]
    Forbidden,

    /// The service returned a non-success status other than 403/404.
    ///
    /// Also produced for a 429 on an upload request (multipart bodies are
    /// consumed on send, so rate-limited uploads are not retried) and for a
    /// 429 that survived the bounded retry policy.
    #[error("service error {status}: {body}")]
    Service {
        /// The HTTP status code returned by the service.
        status: StatusCode,
        /// The raw response body, or an empty string if it could not be read.
        body: String,
    },

    /// A transport-level failure (DNS, TCP, TLS, timeout). No status code is
    /// available because the round trip did not complete. Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be normalized into canonical form.
    #[error("failed to normalize response: {0}")]
    Normalization(#[from] NormalizeError),

    /// The caller violated an argument contract. Raised before any request
    /// is issued.
    #[error("invalid argument: {0}")]
    Caller(String),

    /// A local file or directory could not be read while preparing an upload.
    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service answered an upload with 200 but did not accept the file.
    #[error("upload rejected for {path}")]
    UploadRejected {
        /// The local path whose upload was rejected.
        path: String,
    },
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, KbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn service_error_preserves_status_and_body() {
        let err = KbError::Service {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: r#"{"message":"backend unavailable"}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"), "display should include status code");
        assert!(
            msg.contains("backend unavailable"),
            "display should include response body"
        );
    }

    #[test]
    fn not_found_and_forbidden_display_status() {
        assert!(KbError::NotFound.to_string().contains("404"));
        assert!(KbError::Forbidden.to_string().contains("403"));
    }

    #[test]
    fn normalization_error_chains_to_cause() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("not-json").unwrap_err();
        let err = KbError::Normalization(NormalizeError::Json(json_err));
        assert!(
            err.source().is_some(),
            "Normalization should chain to the underlying cause"
        );
        assert!(err.to_string().contains("failed to normalize"));
    }

    #[test]
    fn caller_error_carries_message() {
        let err = KbError::Caller("need at least one field to update".to_string());
        assert!(err.to_string().contains("need at least one field"));
    }

    #[test]
    fn upload_rejected_names_the_path() {
        let err = KbError::UploadRejected {
            path: "content/logo.png".to_string(),
        };
        assert!(err.to_string().contains("content/logo.png"));
    }

    #[test]
    fn error_is_send_and_sync() {
        // KbError must be Send + Sync for use across async task boundaries.
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KbError>();
    }
}
