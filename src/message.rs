// Wire-level types shared by the handler, the upstream client, and the
// relay: the inbound chat-completion request and the error envelope that
// is emitted either as an HTTP error body or as a single in-stream SSE
// data event.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single role/content message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// An OpenAI-format chat-completion request.
///
/// Unknown caller fields are captured in `extra` and forwarded verbatim —
/// a compatibility proxy must not drop fields it does not model. The
/// `stream` flag is always overwritten to `true` before forwarding,
/// regardless of what the caller sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub stream: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// The structured error object `{"error": {"message", "type", "details"?}}`.
///
/// Serialized either as a plain JSON HTTP body (request validation, 404)
/// or as a single SSE data line once the streaming response has begun and
/// the HTTP status can no longer change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                kind: kind.to_string(),
                details: None,
            },
        }
    }

    /// Upstream responded with a non-2xx status; carries the raw body text.
    pub fn upstream_error(status: u16, body: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: format!("Upstream API error: {status}"),
                kind: "upstream_error".to_string(),
                details: Some(body.into()),
            },
        }
    }

    /// Transport-level failure reaching or reading the upstream.
    pub fn proxy_error(detail: impl std::fmt::Display) -> Self {
        Self::new(
            "proxy_error",
            format!("An unexpected error occurred: {detail}"),
        )
    }

    /// Malformed inbound JSON, surfaced as HTTP 400 before any upstream call.
    pub fn request_error() -> Self {
        Self::new("request_error", "Invalid request format")
    }

    pub fn not_found() -> Self {
        Self::new("not_found", "Not Found")
    }

    /// Frame the envelope as a single SSE data event: `data: <json>\n\n`.
    pub fn to_sse_bytes(&self) -> Bytes {
        let json = serde_json::to_string(self).unwrap_or_default();
        Bytes::from(format!("data: {json}\n\n"))
    }
}
