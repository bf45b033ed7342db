//! arcatalog Web - AR catalog viewer in the browser
//!
//! Renders the catalog with egui and, when an item is opened, switches to an
//! immersive camera view where the item's glTF model is anchored to a printed
//! marker. Marker detection itself is provided by an external JS tracker.

mod app;
mod catalog_fetch;
mod config;
mod navigation;
mod page;
mod scene;
mod tracking;
mod ui;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    let config = config::ViewerConfig::from_browser();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(config.log_level)
            .build()
    );

    app::run(config);
}
