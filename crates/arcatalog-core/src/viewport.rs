//! AR viewport lifecycle
//!
//! The viewport bridges the active catalog entry to the tracking and
//! rendering engines and owns the page scroll lock for the duration of the
//! immersive session. Ordering matters:
//!
//! - enter: scroll lock, then tracking start, then model bind
//! - exit: scroll lock release, then tracking stop, then model unbind
//!
//! Every step of the exit path runs unconditionally, whatever happened on
//! the way in.

use tracing::{info, warn};

use crate::engine::{
    MarkerPreset, ModelBinding, ModelRenderer, RenderError, TrackingConfig, TrackingEngine,
    TrackingError, VideoSource,
};
use crate::entry::CatalogEntry;
use crate::page::{PageError, PageSurface, ScrollLock};
use crate::session::SessionHooks;

/// Static instructional text shown over the camera feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    pub title: String,
    /// Hint text; `{marker}` and `{item}` are substituted
    pub hint: String,
    pub marker_link_label: String,
}

impl Default for Instructions {
    fn default() -> Self {
        Self {
            title: "AR Viewer".to_string(),
            hint: "Point your camera at the {marker} marker to see the 3D {item}".to_string(),
            marker_link_label: "Show {marker} Marker".to_string(),
        }
    }
}

impl Instructions {
    fn fill(template: &str, marker: &MarkerPreset, item: &str) -> String {
        template
            .replace("{marker}", marker.label())
            .replace("{item}", item)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportConfig {
    pub marker: MarkerPreset,
    pub video_source: VideoSource,
    pub debug_ui: bool,
    pub instructions: Instructions,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            marker: MarkerPreset::Hiro,
            video_source: VideoSource::default(),
            debug_ui: false,
            instructions: Instructions::default(),
        }
    }
}

impl ViewportConfig {
    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig {
            source: self.video_source,
            marker: self.marker.clone(),
            debug_ui: self.debug_ui,
        }
    }
}

/// Health of the tracking engine as seen by the viewport
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackingStatus {
    #[default]
    Inactive,
    /// Engine asked to start, readiness is reported by the engine itself
    Starting,
    Unavailable(String),
}

/// Non-fatal problem recorded during an immersive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportFault {
    Page(PageError),
    Tracking(TrackingError),
    AssetLoad(RenderError),
}

/// Screen-space overlay drawn on top of the camera feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    /// Always true; the close control does not depend on engine health
    pub close_visible: bool,
    pub title: String,
    pub hint: String,
    pub marker_link_label: String,
    pub marker_image_url: Option<String>,
    pub tracking: TrackingStatus,
    pub asset_failed: bool,
}

pub struct Viewport<S, T, R>
where
    S: PageSurface,
    T: TrackingEngine,
    R: ModelRenderer,
{
    config: ViewportConfig,
    lock: ScrollLock<S>,
    tracker: T,
    renderer: R,
    active: Option<String>,
    tracking: TrackingStatus,
    faults: Vec<ViewportFault>,
}

impl<S, T, R> Viewport<S, T, R>
where
    S: PageSurface,
    T: TrackingEngine,
    R: ModelRenderer,
{
    pub fn new(config: ViewportConfig, page: S, tracker: T, renderer: R) -> Self {
        Self {
            config,
            lock: ScrollLock::new(page),
            tracker,
            renderer,
            active: None,
            tracking: TrackingStatus::Inactive,
            faults: Vec::new(),
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn tracking_status(&self) -> &TrackingStatus {
        &self.tracking
    }

    pub fn faults(&self) -> &[ViewportFault] {
        &self.faults
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.lock.is_engaged()
    }

    pub fn page(&self) -> &S {
        self.lock.surface()
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Enter immersive mode for an entry
    pub fn activate(&mut self, entry: &CatalogEntry) {
        if self.active.is_some() {
            self.deactivate();
        }

        self.faults.clear();
        self.active = Some(entry.name.clone());

        if let Err(e) = self.lock.engage() {
            warn!(error = %e, "Scroll lock could not be applied");
            self.faults.push(ViewportFault::Page(e));
        }

        let tracking = self.config.tracking_config();
        info!(marker = %tracking.marker, debug = tracking.debug_ui, "Starting tracking engine");
        match self.tracker.start(&tracking) {
            Ok(()) => self.tracking = TrackingStatus::Starting,
            Err(e) => self.fail_tracking(e),
        }

        let binding = ModelBinding::for_entry(entry, self.config.marker.clone());
        if let Err(e) = self.renderer.bind(&binding) {
            self.fail_asset(e);
        }
    }

    /// Leave immersive mode; safe to call repeatedly
    pub fn deactivate(&mut self) {
        if self.active.take().is_none() {
            return;
        }

        self.lock.release();
        self.tracker.stop();
        self.renderer.unbind();
        self.tracking = TrackingStatus::Inactive;
        info!("Viewport torn down");
    }

    /// Record a tracking failure reported after `start` returned
    pub fn report_tracking_failure(&mut self, error: TrackingError) {
        if self.active.is_some() {
            self.fail_tracking(error);
        }
    }

    /// Record a model load failure reported by the renderer
    pub fn report_asset_failure(&mut self, error: RenderError) {
        if self.active.is_some() {
            self.fail_asset(error);
        }
    }

    fn fail_tracking(&mut self, error: TrackingError) {
        warn!(error = %error, "Tracking unavailable");
        self.tracking = TrackingStatus::Unavailable(error.to_string());
        self.faults.push(ViewportFault::Tracking(error));
    }

    fn fail_asset(&mut self, error: RenderError) {
        warn!(error = %error, "Model unavailable");
        self.faults.push(ViewportFault::AssetLoad(error));
    }

    /// Overlay to draw while active
    pub fn overlay(&self) -> Option<Overlay> {
        let item = self.active.as_deref()?;
        let marker = &self.config.marker;
        let instructions = &self.config.instructions;

        Some(Overlay {
            close_visible: true,
            title: instructions.title.clone(),
            hint: Instructions::fill(&instructions.hint, marker, item),
            marker_link_label: Instructions::fill(&instructions.marker_link_label, marker, item),
            marker_image_url: marker.marker_image_url(),
            tracking: self.tracking.clone(),
            asset_failed: self
                .faults
                .iter()
                .any(|f| matches!(f, ViewportFault::AssetLoad(_))),
        })
    }
}

impl<S, T, R> SessionHooks for Viewport<S, T, R>
where
    S: PageSurface,
    T: TrackingEngine,
    R: ModelRenderer,
{
    fn on_enter_active(&mut self, entry: &CatalogEntry) {
        self.activate(entry);
    }

    fn on_exit_active(&mut self, _entry: &CatalogEntry) {
        self.deactivate();
    }
}

impl<S, T, R> Drop for Viewport<S, T, R>
where
    S: PageSurface,
    T: TrackingEngine,
    R: ModelRenderer,
{
    fn drop(&mut self) {
        self.deactivate();
    }
}
