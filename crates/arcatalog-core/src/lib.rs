//! arcatalog Core - Catalog model and AR session lifecycle
//!
//! This crate provides the framework-independent half of the AR catalog viewer:
//! - Catalog entries, category groups and catalog document parsing
//! - Category filtering for the catalog view
//! - The AR session state machine (catalog browsing vs. immersive AR)
//! - The AR viewport, which owns the page scroll lock and drives the external
//!   tracking and rendering engines through the traits in [`engine`]

pub mod catalog;
pub mod engine;
pub mod entry;
pub mod filter;
pub mod page;
pub mod session;
pub mod viewport;

pub use catalog::{Catalog, CatalogError, CatalogLoad, CatalogStore, CategoryGroup, StaticCatalog};
pub use engine::{
    CameraFacing, MarkerPreset, ModelBinding, ModelRenderer, ParentFrame, RenderError,
    TrackingConfig, TrackingEngine, TrackingError, VideoSource,
};
pub use entry::{CatalogEntry, EntryId, ModelTransform, Spin, Vec3};
pub use filter::{category_labels, filter_entries, CategoryFilter};
pub use page::{PageError, PageStyle, PageSurface, ScrollLock};
pub use session::{ArSession, Mode, SessionError, SessionHooks, SessionState};
pub use viewport::{Instructions, Overlay, TrackingStatus, Viewport, ViewportConfig, ViewportFault};
