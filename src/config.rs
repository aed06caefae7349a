// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

// Startup configuration — read once, immutable afterwards.
//
// Both values have hard-coded defaults and are overridable through the
// CLI / environment (`TARGET_URL`, `PORT`) wired up in main.rs. Nothing
// here is mutated after startup; there is no cross-request shared state.

/// Default upstream chat-completions endpoint.
pub const DEFAULT_TARGET_URL: &str = "https://text.pollinations.ai/openai";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Resolved startup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream endpoint every chat-completion request is forwarded to.
    pub target_url: String,
    /// Port the proxy listens on.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
