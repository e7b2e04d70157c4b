// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Form Relay Service
//!
//! Serves `POST /contact-form`, filters submissions and relays accepted ones
//! to a mailbox over SMTP.
//!
//! ## Configuration
//!
//! Loaded from `contact-relay.toml` (or the file named by
//! `CONTACT_RELAY_CONFIG`) and `CONTACT_RELAY__*` environment variables:
//!
//! - `CONTACT_RELAY__SERVER__BIND_ADDR`: bind address (default: 0.0.0.0:8080)
//! - `CONTACT_RELAY__RATE_LIMIT__MAX_REQUESTS`: submissions per window (default: 5)
//! - `CONTACT_RELAY__RATE_LIMIT__WINDOW_SECS`: window length (default: 900)
//! - `CONTACT_RELAY__CORS__ALLOWED_ORIGINS`: comma-separated origin allow-list
//! - `CONTACT_RELAY__SMTP__HOST` / `__PORT`: SMTP relay
//!
//! SMTP username, password and recipient are read from the secret provider
//! (`SMTP_USERNAME`, `SMTP_PASSWORD`, `CONTACT_RECIPIENT` by default) and fall
//! back to `smtp.username`, `smtp.password` and `smtp.recipient`.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_form_relay::{
    config::Config,
    handlers::{router, AppState},
    limiter::RateLimiter,
    mailer::SmtpMailer,
    metrics::Metrics,
    secrets::{provider_from_config, resolve_smtp_credentials},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load()?;
    info!(
        bind_addr = %config.server.bind_addr,
        form_path = %config.server.form_path,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        allowed_origins = ?config.cors.allowed_origins,
        "Starting contact form relay"
    );

    let provider = provider_from_config(&config.secrets);
    let credentials =
        resolve_smtp_credentials(provider.as_ref(), &config.secrets, &config.smtp).await?;
    let mailer = SmtpMailer::new(&config.smtp, credentials)?;
    info!(host = %config.smtp.host, port = config.smtp.port, "SMTP relay configured");

    let state = Arc::new(AppState {
        limiter: RateLimiter::new(config.rate_limit.clone()),
        mailer: Arc::new(mailer),
        metrics: Metrics::new()?,
        config: config.clone(),
    });

    // Spawn idle-client eviction task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(cleanup_state.config.rate_limit.cleanup_interval());
        loop {
            interval.tick().await;
            cleanup_state.limiter.evict_idle().await;
            cleanup_state
                .metrics
                .set_tracked_clients(cleanup_state.limiter.tracked_clients().await);
        }
    });

    let app = router(state);

    let addr: SocketAddr = config.server.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
