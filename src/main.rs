// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;

use adrelay::config::{self, Config};
use adrelay::proxy::{build_router, AppState};
use adrelay::upstream::PollinationsClient;

#[derive(Parser)]
#[command(
    name = "adrelay",
    about = "OpenAI-compatible streaming proxy with sponsor filtering"
)]
struct Cli {
    /// Upstream chat-completions endpoint
    #[arg(long, env = "TARGET_URL", default_value = config::DEFAULT_TARGET_URL)]
    target_url: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config {
        target_url: cli.target_url,
        port: cli.port,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, target_url = %config.target_url, "adrelay starting");

    let state = AppState {
        upstream: Arc::new(PollinationsClient::new(&config)),
        target_url: config.target_url.clone(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind to address");

    tracing::info!(
        endpoint = %format!("http://127.0.0.1:{}/v1/chat/completions", config.port),
        "adrelay listening"
    );

    axum::serve(listener, app).await.expect("server error");
}
