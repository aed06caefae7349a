// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

// The relay loop: opens the upstream stream, inspects each chunk, and
// feeds surviving bytes to the client through a bounded channel.
//
// The bounded channel is the backpressure seam: the loop cannot read the
// next upstream chunk until the client has drained earlier sends. When
// the client disconnects the receiver is dropped, the next send fails,
// the task returns, and the upstream response is dropped with it — on
// every exit path, including marker termination and errors.

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use super::inspect::Utf8Inspector;
use super::types::{RelayEvent, TerminateReason, MARKER};
use crate::message::ChatRequest;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Channel depth between the relay task and the response body.
const CHANNEL_CAPACITY: usize = 16;

/// Open the upstream stream for `request` and return the filtered byte
/// stream to send to the client.
///
/// The request's streaming flag must already be forced true by the
/// caller. Output ends in one of three ways: upstream closes (normal
/// close, nothing injected), marker detected (silent close), or an
/// upstream failure (exactly one error envelope, then close).
pub fn filtered_stream(
    upstream: Arc<dyn UpstreamClient>,
    request: ChatRequest,
) -> ReceiverStream<Bytes> {
    let (tx, rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut body = match upstream.open(&request).await {
            Ok(body) => body,
            Err(e) => {
                // Already logged at the transport seam. One envelope, done.
                let _ = tx.send(e.to_envelope().to_sse_bytes()).await;
                return;
            }
        };

        let mut inspector = Utf8Inspector::new();
        while let Some(item) = body.next().await {
            match next_event(&mut inspector, item) {
                RelayEvent::Data(chunk) => {
                    if tx.send(chunk).await.is_err() {
                        // Client disconnected; stop reading from upstream.
                        return;
                    }
                }
                RelayEvent::Terminate(TerminateReason::MarkerDetected) => {
                    tracing::info!(marker = MARKER, "sponsor content detected, stopping stream");
                    return;
                }
                RelayEvent::Terminate(TerminateReason::UpstreamError(envelope)) => {
                    tracing::error!(
                        kind = %envelope.error.kind,
                        message = %envelope.error.message,
                        "upstream stream failed mid-flight"
                    );
                    let _ = tx.send(envelope.to_sse_bytes()).await;
                    return;
                }
            }
        }
        // Upstream exhausted: dropping tx closes the output normally.
    });

    ReceiverStream::new(rx)
}

/// Decide what to do with one step of the upstream sequence.
///
/// The scan runs over this chunk's decoded text alone — a marker split
/// across a chunk boundary is not detected, matching the behavior this
/// proxy inherits. Surviving chunks are forwarded as the original bytes;
/// the decoded text is never re-encoded.
pub(crate) fn next_event(
    inspector: &mut Utf8Inspector,
    item: Result<Bytes, UpstreamError>,
) -> RelayEvent {
    match item {
        Ok(chunk) => {
            if inspector.decode(&chunk).contains(MARKER) {
                RelayEvent::Terminate(TerminateReason::MarkerDetected)
            } else {
                RelayEvent::Data(chunk)
            }
        }
        Err(e) => RelayEvent::Terminate(TerminateReason::UpstreamError(e.to_envelope())),
    }
}
