// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use ideaboard_bff::{api::router, config::Settings, logging::init_tracing, state::AppState};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(settings.log_format);

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_settings(&settings)?;
    let app = router(state, settings.cors_layer()?);
    let addr = settings.bind_addr;

    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    tracing::info!(
        %addr,
        environment = %settings.environment,
        jwks_url = %settings.jwks_url,
        data_service = %settings.data_service_url,
        "Ideaboard BFF starting (docs at /docs)"
    );

    match &settings.tls {
        Some(tls) => {
            // Install the ring crypto provider before any TLS operations.
            if rustls::crypto::ring::default_provider()
                .install_default()
                .is_err()
            {
                tracing::debug!("rustls crypto provider already installed");
            }
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            tracing::info!(%addr, "serving HTTPS");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "serving HTTP");
            serve_http(addr, app, handle).await?;
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

async fn serve_http(
    addr: SocketAddr,
    app: Router,
    handle: Handle<SocketAddr>,
) -> std::io::Result<()> {
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

async fn shutdown_on_signal(handle: Handle<SocketAddr>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received, draining connections");
        handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn http_server_stops_on_graceful_shutdown() {
        let handle: Handle<SocketAddr> = Handle::new();
        let app = Router::new().route("/", get(|| async { "ok" }));
        let server = tokio::spawn(serve_http(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            app,
            handle.clone(),
        ));

        let addr = handle.listening().await.expect("server listening");
        assert_ne!(addr.port(), 0);

        handle.graceful_shutdown(Some(Duration::from_millis(100)));
        server.await.unwrap().unwrap();
    }
}
