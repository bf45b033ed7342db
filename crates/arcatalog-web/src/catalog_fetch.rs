//! Catalog retrieval over HTTP

use arcatalog_core::{Catalog, CatalogLoad};
use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use crate::config::ViewerConfig;

pub struct CatalogFetchPlugin;

impl Plugin for CatalogFetchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CatalogState>()
            .init_resource::<PendingCatalog>()
            .add_message::<RefetchCatalog>()
            .add_systems(Startup, fetch_initial_catalog)
            .add_systems(Update, (handle_refetch, process_catalog_response));
    }
}

/// Catalog as last loaded
#[derive(Resource, Default)]
pub struct CatalogState(pub CatalogLoad);

/// Response slot filled by the async fetch
#[derive(Resource, Default)]
pub struct PendingCatalog(pub Arc<Mutex<Option<CatalogLoad>>>);

/// Request to fetch the catalog again (the Retry button)
#[derive(Message, Default)]
pub struct RefetchCatalog;

/// Turn an HTTP response into a load state
pub fn interpret_response(status: u16, body: &str) -> CatalogLoad {
    if !(200..300).contains(&status) {
        let reason = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| format!("server returned HTTP {}", status));
        return CatalogLoad::Unavailable(reason);
    }

    match Catalog::from_json(body) {
        Ok(catalog) => CatalogLoad::Ready(catalog),
        Err(e) => CatalogLoad::Unavailable(e.to_string()),
    }
}

fn fetch_initial_catalog(config: Res<ViewerConfig>, pending: Res<PendingCatalog>) {
    spawn_fetch(&config.catalog_url, &pending);
}

fn handle_refetch(
    mut requests: MessageReader<RefetchCatalog>,
    config: Res<ViewerConfig>,
    pending: Res<PendingCatalog>,
    mut state: ResMut<CatalogState>,
) {
    if requests.read().count() == 0 {
        return;
    }

    state.0 = CatalogLoad::Loading;
    spawn_fetch(&config.catalog_url, &pending);
}

fn process_catalog_response(pending: Res<PendingCatalog>, mut state: ResMut<CatalogState>) {
    let result = match pending.0.lock() {
        Ok(mut slot) => slot.take(),
        Err(_) => None,
    };

    if let Some(load) = result {
        match &load {
            CatalogLoad::Ready(catalog) => {
                tracing::info!("Catalog loaded: {} entries", catalog.len());
            }
            CatalogLoad::Unavailable(reason) => {
                tracing::error!("Catalog unavailable: {}", reason);
            }
            CatalogLoad::Loading => {}
        }
        state.0 = load;
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_fetch(url: &str, pending: &PendingCatalog) {
    use wasm_bindgen_futures::spawn_local;

    let pending_clone = pending.0.clone();
    let url = url.to_string();

    spawn_local(async move {
        tracing::info!("Fetching catalog from: {}", url);

        let load = match gloo_net::http::Request::get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(text) => interpret_response(status, &text),
                    Err(e) => CatalogLoad::Unavailable(format!("failed to read response: {}", e)),
                }
            }
            Err(e) => CatalogLoad::Unavailable(format!("request failed: {}", e)),
        };

        if let Ok(mut slot) = pending_clone.lock() {
            *slot = Some(load);
        }
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_fetch(url: &str, pending: &PendingCatalog) {
    tracing::info!("Catalog fetch not available in native mode: {}", url);
    if let Ok(mut slot) = pending.0.lock() {
        *slot = Some(CatalogLoad::Unavailable("catalog fetch requires a browser".to_string()));
    }
}
