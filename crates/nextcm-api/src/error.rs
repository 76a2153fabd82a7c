use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `nextcm-api` crate.
///
/// Covers every failure mode of the client: specification loading,
/// request validation, transport, and Central Manager API errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── API ─────────────────────────────────────────────────────────
    /// Non-200 response from Central Manager (other than the 401 that
    /// is absorbed by the token refresh).
    #[error("API error (HTTP {status}): {body}")]
    Api {
        status: u16,
        /// Raw response body, also written to the debug artifact when
        /// one is configured.
        body: String,
        debug: Option<String>,
    },

    // ── Request validation ──────────────────────────────────────────
    /// HTTP verb outside GET/POST/PUT/PATCH/DELETE. Rejected before
    /// any request is built.
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// Path absent from the allow-list loaded from the specification
    /// document. Rejected before any request is built.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    // ── Response wrapping ───────────────────────────────────────────
    /// [`RestObject`](crate::RestObject) constructed from a value that
    /// is not a JSON object.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    // ── Specification document ──────────────────────────────────────
    /// The specification document could not be read.
    #[error("failed to read API spec {}: {source}", path.display())]
    SpecIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specification document is not valid JSON.
    #[error("failed to parse API spec {}: {source}", path.display())]
    SpecParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The device address does not form a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The HTTP status of an API error, if that's what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the request was rejected client-side, before
    /// any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidMethod(_) | Self::InvalidPath(_))
    }
}
