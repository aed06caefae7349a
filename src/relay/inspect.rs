// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

// Incremental UTF-8 decoding for chunk inspection.
//
// Chunk boundaries fall anywhere, including inside a multi-byte code
// point. The inspector carries the incomplete trailing sequence (at most
// 3 bytes) into the next call so inspection never sees corrupted
// characters. Decoding is for inspection only — forwarded bytes are
// always the original chunk, untouched.

/// Stateful UTF-8 decoder for the marker scan.
pub struct Utf8Inspector {
    /// Incomplete trailing multi-byte sequence carried from the last chunk.
    carry: Vec<u8>,
}

impl Utf8Inspector {
    pub fn new() -> Self {
        Self { carry: Vec::new() }
    }

    /// Decode one chunk, prepending any carried bytes.
    ///
    /// Invalid sequences become U+FFFD and never panic or desynchronize
    /// the carry. An incomplete sequence at the end of the chunk is held
    /// back and completed by the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let joined: Vec<u8>;
        let bytes: &[u8] = if self.carry.is_empty() {
            chunk
        } else {
            let mut buf = std::mem::take(&mut self.carry);
            buf.extend_from_slice(chunk);
            joined = buf;
            &joined
        };

        let mut decoded = String::with_capacity(bytes.len());
        let mut rest = bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    decoded.push_str(valid);
                    break;
                }
                Err(e) => {
                    // The prefix up to valid_up_to() is known-valid, so the
                    // lossy conversion borrows it without replacement.
                    decoded.push_str(&String::from_utf8_lossy(&rest[..e.valid_up_to()]));
                    match e.error_len() {
                        Some(invalid_len) => {
                            decoded.push('\u{FFFD}');
                            rest = &rest[e.valid_up_to() + invalid_len..];
                        }
                        None => {
                            // Incomplete trailing sequence: carry to next chunk.
                            self.carry = rest[e.valid_up_to()..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        decoded
    }
}

impl Default for Utf8Inspector {
    fn default() -> Self {
        Self::new()
    }
}
