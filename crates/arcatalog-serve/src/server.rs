//! Web server setup and routing

use anyhow::Result;
use arcatalog_core::Catalog;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::config::{Config, TlsConfig};

/// Shared server state
pub struct AppState {
    pub config: Config,
}

/// API error response
#[derive(Serialize)]
struct ApiError {
    error: String,
}

/// Serve the catalog as JSON
///
/// The file is re-read on every request so edits show up on reload. A
/// catalog that fails to load is reported as 503 so the viewer can tell it
/// apart from an empty catalog.
async fn get_catalog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match Catalog::from_path(&state.config.catalog.path) {
        Ok(catalog) => Json(catalog).into_response(),
        Err(e) => {
            warn!(error = %e, path = %state.config.catalog.path.display(), "Catalog unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiError {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let assets = &state.config.assets;

    Router::new()
        .route("/catalog.json", get(get_catalog))
        .nest_service("/models", ServeDir::new(&assets.models))
        .nest_service("/images", ServeDir::new(&assets.images))
        // Static files (WASM frontend) - must be fallback for root
        .fallback_service(ServeDir::new(&assets.web))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state.clone())
}

/// Run the web server (HTTP or HTTPS depending on config)
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bind = state.config.server.bind.clone();
    let tls = state.config.server.tls.clone();
    let app = router(state);

    if let Some(tls_config) = tls {
        run_https(app, &bind, &tls_config).await
    } else {
        run_http(app, &bind).await
    }
}

/// Run plain HTTP server
async fn run_http(app: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    if !bind.starts_with("127.") && !bind.starts_with("localhost") {
        warn!("Camera access requires HTTPS on non-localhost origins; configure [server.tls]");
    }
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run HTTPS server with TLS
async fn run_https(app: Router, bind: &str, tls: &TlsConfig) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::path::PathBuf;

    let cert_path = PathBuf::from(&tls.cert);
    let key_path = PathBuf::from(&tls.key);

    if !cert_path.exists() {
        anyhow::bail!("TLS certificate file not found: {}", tls.cert);
    }
    if !key_path.exists() {
        anyhow::bail!("TLS key file not found: {}", tls.key);
    }

    let rustls_config = RustlsConfig::from_pem_file(&cert_path, &key_path).await?;

    let addr: std::net::SocketAddr = bind.parse()?;
    info!(address = %bind, protocol = "HTTPS", cert = %tls.cert, "Starting web server with TLS");

    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
