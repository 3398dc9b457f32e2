// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use forum_auth_bridge::{
    api::router,
    auth::{CredentialStore, SessionValidator},
    config::{Settings, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    render::BasicRenderer,
    state::AppState,
    storage::MySqlDirectory,
};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let discourse = settings.load_discourse()?;
    let jwt = settings.load_jwt()?;

    let directory = MySqlDirectory::connect(
        &settings.database_url,
        &settings.table_prefix,
        settings.max_connections,
    )
    .await?;

    let sessions = SessionValidator::new(
        CredentialStore::new(Arc::new(directory)),
        &settings.cookie_prefix,
    );
    let renderer = Arc::new(BasicRenderer::new(settings.base_path.clone())?);

    let mut state = AppState::new(sessions, renderer).with_base_path(settings.base_path.clone());
    if let Some(bridge) = discourse {
        info!(return_url = bridge.return_url(), "Discourse SSO enabled");
        state = state.with_discourse(bridge);
    }
    if let Some(bridge) = jwt {
        info!(
            issuer = bridge.registry().issuer(),
            sites = bridge.registry().len(),
            "JWT bridge enabled"
        );
        state = state.with_jwt(bridge);
    }

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Forum auth bridge listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal startup or server error");
            ExitCode::FAILURE
        }
    }
}
