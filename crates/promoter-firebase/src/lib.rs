//! # Promoter Firebase - The Kit
//!
//! Minimal client for the Firebase Realtime Database REST API.
//!
//! Every node is addressed as `<database_url>/<path>.json`. Reads ask the
//! server for the node's ETag; writes are conditional on it, which turns a
//! read-modify-write into a compare-and-swap.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use promoter_firebase::{FirebaseClient, PutOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), promoter_firebase::Error> {
//!     let client = FirebaseClient::new("https://my-app.firebaseio.com")?;
//!
//!     let snapshot = client.get("registered_users/alice").await?;
//!     if snapshot.exists() {
//!         let mut value = snapshot.value.clone();
//!         value["role"] = "admin".into();
//!         match client.put_if_match("registered_users/alice", &value, &snapshot.etag).await? {
//!             PutOutcome::Written => println!("updated"),
//!             PutOutcome::PreconditionFailed { .. } => println!("changed underneath us"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Conditional Requests
//!
//! ```text
//!  GET  /registered_users/alice.json      X-Firebase-ETag: true
//!       <- 200  ETag: "abc"  {"role":"user",...}
//!  PUT  /registered_users/alice.json      if-match: "abc"
//!       <- 200                      (written)
//!       <- 412  ETag: "def"         (someone else wrote first)
//! ```

use reqwest::header::{ETAG, HeaderMap, IF_MATCH};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Request header asking the server to return the node's ETag.
pub const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from the Realtime Database client.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The database URL cannot address nodes.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    /// Server answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A read succeeded but carried no ETag header.
    #[error("Server response for {0} carried no ETag")]
    MissingEtag(String),
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// A node value together with the ETag it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The node value; `Null` when nothing is stored there.
    pub value: Value,
    /// Opaque revision token for conditional writes.
    pub etag: String,
}

impl Snapshot {
    /// Whether anything is stored at the node.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// The value was stored.
    Written,
    /// The node changed since the ETag was issued; nothing was stored.
    PreconditionFailed {
        /// ETag of the node's current value, when the server sent it.
        current_etag: Option<String>,
    },
}

/// Error body returned by the REST API (`{"error": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Connection options for [`FirebaseClient::with_options`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// ID token or database secret, sent as the `auth` query parameter.
    pub auth: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auth: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for one Realtime Database instance.
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    base_url: Url,
    auth: Option<String>,
    client: reqwest::Client,
}

impl FirebaseClient {
    /// Create an unauthenticated client for `database_url`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = FirebaseClient::new("https://my-app-default-rtdb.firebaseio.com")?;
    /// ```
    pub fn new(database_url: &str) -> Result<Self, Error> {
        Self::with_options(database_url, ClientOptions::default())
    }

    /// Create a client with explicit auth and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse or is not
    /// http(s), or [`Error::Http`] if the HTTP client fails to build.
    pub fn with_options(database_url: &str, options: ClientOptions) -> Result<Self, Error> {
        let base_url = Url::parse(database_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", database_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!(
                "{}: expected an http(s) URL",
                database_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            base_url,
            auth: options.auth,
            client,
        })
    }

    /// REST URL of the node at `path` (slash separated, may be empty for the root).
    pub fn node_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(self.base_url.to_string()))?;
            parts.pop_if_empty();
            match segments.split_last() {
                Some((last, parents)) => {
                    parts.extend(parents);
                    parts.push(&format!("{}.json", last));
                }
                None => {
                    parts.push(".json");
                }
            }
        }
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok(url)
    }

    /// Read the node at `path` with its ETag.
    ///
    /// An empty node reads as [`Value::Null`]; use [`Snapshot::exists`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] for non-success statuses (for example
    /// "Permission denied"), [`Error::MissingEtag`] if the server omitted the
    /// ETag, or [`Error::Http`]/[`Error::Json`] on transport and body failures.
    pub async fn get(&self, path: &str) -> Result<Snapshot, Error> {
        let url = self.node_url(path)?;
        debug!(path, "GET node");

        let resp = self
            .client
            .get(url)
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let etag = etag_of(resp.headers()).ok_or_else(|| Error::MissingEtag(path.to_string()))?;
        let body = resp.bytes().await?;
        let value = serde_json::from_slice(&body)?;

        Ok(Snapshot { value, etag })
    }

    /// Replace the node at `path` if it still matches `etag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] for non-success statuses other than 412.
    pub async fn put_if_match(
        &self,
        path: &str,
        value: &Value,
        etag: &str,
    ) -> Result<PutOutcome, Error> {
        let mut url = self.node_url(path)?;
        url.query_pairs_mut().append_pair("print", "silent");
        debug!(path, etag, "PUT node (conditional)");

        let resp = self
            .client
            .put(url)
            .header(IF_MATCH, etag)
            .json(value)
            .send()
            .await?;

        if resp.status() == StatusCode::PRECONDITION_FAILED {
            return Ok(PutOutcome::PreconditionFailed {
                current_etag: etag_of(resp.headers()),
            });
        }

        check_status(resp).await?;
        Ok(PutOutcome::Written)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn etag_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Pass successful responses through, turn everything else into [`Error::Server`].
async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body,
    };

    Err(Error::Server {
        status: status.as_u16(),
        message,
    })
}

// =============================================================================
// TESTS
// =============================================================================
