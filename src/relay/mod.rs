// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

// Filtering relay — the streaming core.
//
// Responsibilities:
// - Consume the upstream chunk stream and produce the client byte stream
// - Inspect each chunk's decoded text for the sponsor marker
// - Marker found: stop forwarding, silently, irreversibly
// - Upstream failures: emit exactly one in-stream error envelope
// - Forward surviving chunks byte-for-byte with no re-encoding
// - Stop reading from upstream as soon as the client disconnects

mod inspect;
mod processor;
mod types;

pub use processor::filtered_stream;
pub use types::{RelayEvent, TerminateReason, MARKER};
