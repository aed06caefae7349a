// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

// Upstream client — single POST to the configured completions endpoint
// with a fixed browser-impersonation header set, yielding the response
// body as a live chunk stream.
//
// Responsibilities:
// - Forward the JSON-encoded request (streaming already forced on)
// - Reproduce the impersonation header bundle byte-for-byte
// - Non-2xx: read the full error body and fail with `Status`
// - Transport failures: fail with `Transport`
// - Log the failure condition; no other side effects

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::Stream;
use futures_util::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::pin::Pin;

use crate::config::Config;
use crate::message::{ChatRequest, ErrorEnvelope};

// ---------------------------------------------------------------------------
// Impersonation headers
// ---------------------------------------------------------------------------

/// The fixed header bundle sent with every upstream request.
///
/// The upstream endpoint expects requests that look like they come from a
/// specific browser/origin; these values must be reproduced byte-for-byte.
/// Kept as one table (not scattered literals) so tests can validate it.
pub const IMPERSONATION_HEADERS: &[(&str, &str)] = &[
    ("accept", "*/*"),
    ("accept-encoding", "gzip, deflate, br, zstd"),
    ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("content-type", "application/json"),
    ("origin", "https://ish.junioralive.in"),
    ("referer", "https://ish.junioralive.in/"),
    (
        "sec-ch-ua",
        "\"Not/A)Brand\";v=\"8\", \"Chromium\";v=\"126\", \"Microsoft Edge\";v=\"126\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "cross-site"),
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
    ),
];

/// Build the impersonation bundle as an immutable `HeaderMap`.
pub fn impersonation_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(IMPERSONATION_HEADERS.len());
    for (name, value) in IMPERSONATION_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

// ---------------------------------------------------------------------------
// Transport types
// ---------------------------------------------------------------------------

/// The upstream response body as a live sequence of binary chunks.
///
/// No upper size bound, unbounded duration; ends when the upstream closes
/// the connection. Mid-stream read failures surface as `Transport` items.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream responded with a non-2xx status; `body` is the raw error text.
    #[error("upstream API error: {status}")]
    Status { status: u16, body: String },

    /// Connection, DNS, or body-read failure reaching the upstream.
    #[error("upstream transport failure: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// Map the failure to the in-stream error envelope sent to the client.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            UpstreamError::Status { status, body } => {
                ErrorEnvelope::upstream_error(*status, body.clone())
            }
            UpstreamError::Transport(detail) => ErrorEnvelope::proxy_error(detail),
        }
    }
}

// ---------------------------------------------------------------------------
// Trait: UpstreamClient (dependency injection point)
// ---------------------------------------------------------------------------

/// Abstraction over the HTTP client that opens the upstream stream.
///
/// Implementations must be Send + Sync so they can be shared across request
/// handlers via `Arc`.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Perform the single upstream POST and expose the response body as a
    /// chunk stream. The request's streaming flag must already be true.
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, UpstreamError>;
}

// ---------------------------------------------------------------------------
// Reqwest implementation
// ---------------------------------------------------------------------------

/// The real upstream client: one POST to the configured target URL.
///
/// No request timeout — the baseline design has none; the stream lives as
/// long as the upstream keeps it open.
pub struct PollinationsClient {
    client: reqwest::Client,
    target_url: String,
    headers: HeaderMap,
}

impl PollinationsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            target_url: config.target_url.clone(),
            headers: impersonation_headers(),
        }
    }
}

#[async_trait]
impl UpstreamClient for PollinationsClient {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, UpstreamError> {
        let response = self
            .client
            .post(&self.target_url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target_url = %self.target_url, error = %e, "upstream request failed");
                UpstreamError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "upstream returned error status"
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| UpstreamError::Transport(e.to_string()));
        Ok(Box::pin(stream))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
