//! Bevy application setup

use arcatalog_core::{ArSession, Viewport, ViewportConfig};
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::catalog_fetch::CatalogFetchPlugin;
use crate::config::ViewerConfig;
use crate::navigation::NavigationPlugin;
use crate::page::WebPage;
use crate::scene::{SceneBinder, ScenePlugin};
use crate::tracking::WebTracker;
use crate::ui::UiPlugin;

pub type WebViewport = Viewport<WebPage, WebTracker, SceneBinder>;

pub type WebSession = ArSession<WebViewport>;

/// The AR session and the engines it drives
///
/// Holds JS handles, so it lives in the main thread as a non-send resource.
/// The session is shared with browser listeners that must tear it down
/// between frames (`pagehide`), when no system is running.
pub struct ArRuntime {
    session: Rc<RefCell<WebSession>>,
}

impl ArRuntime {
    pub fn new(config: &ViewerConfig) -> Self {
        let viewport_config = ViewportConfig {
            marker: config.marker.clone(),
            ..ViewportConfig::default()
        };

        let viewport = Viewport::new(
            viewport_config,
            WebPage::new(),
            WebTracker::new(),
            SceneBinder::new(config.asset_base.clone()),
        );

        Self {
            session: Rc::new(RefCell::new(ArSession::new(viewport))),
        }
    }

    pub fn session(&self) -> Ref<'_, WebSession> {
        self.session.borrow()
    }

    pub fn session_mut(&self) -> RefMut<'_, WebSession> {
        self.session.borrow_mut()
    }

    /// Handle for callbacks that run outside the Bevy schedule
    pub fn shared(&self) -> Rc<RefCell<WebSession>> {
        self.session.clone()
    }
}

/// Run the Bevy application
pub fn run(config: ViewerConfig) {
    let runtime = ArRuntime::new(&config);

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15)))
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "AR Catalog".to_string(),
                    canvas: Some("#arcatalog-canvas".to_string()),
                    fit_canvas_to_parent: true,
                    // Camera video sits behind the canvas while immersive
                    transparent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Model references are resolved against the page, not an assets/ dir
                file_path: "".to_string(),
                // Don't look for .meta files - server doesn't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        // bevy_egui looks for bevy_picking::PickingPlugin, so picking goes in before EguiPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .insert_resource(config)
        .insert_non_send_resource(runtime)
        .add_plugins(CatalogFetchPlugin)
        .add_plugins(ScenePlugin)
        .add_plugins(NavigationPlugin)
        .add_plugins(UiPlugin)
        .run();
}
