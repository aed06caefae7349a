// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;

use crate::message::ErrorEnvelope;

/// The literal substring whose presence in a chunk's decoded text stops
/// the stream. Case-sensitive, exact match, no regex.
pub const MARKER: &str = "Sponsor";

/// What the relay decided to do with one step of the upstream sequence.
///
/// Produced one-per-chunk; a `Terminate` is final — no event follows it.
#[derive(Debug)]
pub enum RelayEvent {
    /// Forward these bytes to the client verbatim.
    Data(Bytes),
    /// Stop the output sequence.
    Terminate(TerminateReason),
}

#[derive(Debug)]
pub enum TerminateReason {
    /// The marker was found in this chunk's decoded text. The stream ends
    /// silently: no envelope, no further data.
    MarkerDetected,
    /// The upstream connection or read failed; emit this envelope as a
    /// single SSE data event, then end.
    UpstreamError(ErrorEnvelope),
}
