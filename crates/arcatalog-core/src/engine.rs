//! Boundaries to the external tracking and rendering engines
//!
//! Marker detection and model rasterization are not implemented here. The
//! viewport only supplies configuration and a render target through these
//! traits; pose delivery and asset loading happen on the engine's side.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::entry::{CatalogEntry, ModelTransform, Spin};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera or tracking not supported: {0}")]
    Unsupported(String),
    #[error("tracking engine error: {0}")]
    Engine(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("failed to load model {model}: {reason}")]
    AssetLoad { model: String, reason: String },
}

/// Which device camera to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Rear camera on phones
    #[default]
    Environment,
    User,
}

impl CameraFacing {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraFacing::Environment => "environment",
            CameraFacing::User => "user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSource {
    Camera { facing: CameraFacing },
}

impl Default for VideoSource {
    fn default() -> Self {
        VideoSource::Camera {
            facing: CameraFacing::default(),
        }
    }
}

/// Fiducial marker pattern the tracking engine looks for
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MarkerPreset {
    #[default]
    Hiro,
    Kanji,
    /// URL of a custom trained pattern file
    Custom(String),
}

const MARKER_IMAGE_BASE: &str = "https://raw.githubusercontent.com/AR-js-org/AR.js/master/data/images";

impl MarkerPreset {
    /// Parse a preset identifier, treating anything unknown as a pattern URL
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "" | "hiro" => MarkerPreset::Hiro,
            "kanji" => MarkerPreset::Kanji,
            _ => MarkerPreset::Custom(id.trim().to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MarkerPreset::Hiro => "hiro",
            MarkerPreset::Kanji => "kanji",
            MarkerPreset::Custom(url) => url,
        }
    }

    /// Human readable marker name
    pub fn label(&self) -> &str {
        match self {
            MarkerPreset::Hiro => "Hiro",
            MarkerPreset::Kanji => "Kanji",
            MarkerPreset::Custom(_) => "custom",
        }
    }

    /// Printable image of the marker, when one is published
    pub fn marker_image_url(&self) -> Option<String> {
        match self {
            MarkerPreset::Hiro => Some(format!("{}/HIRO.jpg", MARKER_IMAGE_BASE)),
            MarkerPreset::Kanji => Some(format!("{}/kanji.jpg", MARKER_IMAGE_BASE)),
            MarkerPreset::Custom(_) => None,
        }
    }
}

impl fmt::Display for MarkerPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Configuration handed to the tracking engine on start
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackingConfig {
    pub source: VideoSource,
    pub marker: MarkerPreset,
    pub debug_ui: bool,
}

/// External marker tracking engine
pub trait TrackingEngine {
    /// Start the camera stream and marker tracking
    ///
    /// Returning `Ok` does not mean the camera is already streaming; the
    /// engine reports readiness through its own pose delivery.
    fn start(&mut self, config: &TrackingConfig) -> Result<(), TrackingError>;

    /// Stop tracking and release the camera stream
    ///
    /// Must be safe to call after a failed or still pending `start`.
    fn stop(&mut self);
}

/// Coordinate frame a bound model is parented to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentFrame {
    Marker(MarkerPreset),
}

/// A model reference and transform to attach to the marker frame
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBinding {
    pub model: String,
    pub transform: ModelTransform,
    pub spin: Option<Spin>,
    pub parent: ParentFrame,
}

impl ModelBinding {
    pub fn for_entry(entry: &CatalogEntry, marker: MarkerPreset) -> Self {
        Self {
            model: entry.model.clone(),
            transform: entry.transform,
            spin: entry.spin,
            parent: ParentFrame::Marker(marker),
        }
    }
}

/// External rendering/compositing engine
pub trait ModelRenderer {
    fn bind(&mut self, binding: &ModelBinding) -> Result<(), RenderError>;
    fn unbind(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_preset_ids() {
        assert_eq!(MarkerPreset::from_id("hiro"), MarkerPreset::Hiro);
        assert_eq!(MarkerPreset::from_id("HIRO"), MarkerPreset::Hiro);
        assert_eq!(MarkerPreset::from_id(""), MarkerPreset::Hiro);
        assert_eq!(MarkerPreset::from_id("kanji"), MarkerPreset::Kanji);

        let custom = MarkerPreset::from_id("patterns/menu.patt");
        assert_eq!(custom.id(), "patterns/menu.patt");
        assert!(custom.marker_image_url().is_none());
    }

    #[test]
    fn test_hiro_marker_image() {
        let url = MarkerPreset::Hiro.marker_image_url().unwrap();
        assert!(url.ends_with("/HIRO.jpg"));
    }

    #[test]
    fn test_default_tracking_config() {
        let config = TrackingConfig::default();
        assert_eq!(config.marker, MarkerPreset::Hiro);
        assert!(!config.debug_ui);
        assert_eq!(
            config.source,
            VideoSource::Camera {
                facing: CameraFacing::Environment
            }
        );
    }

    #[test]
    fn test_binding_copies_entry_transform() {
        let entry = CatalogEntry::new(1u64, "Pizza", "models/pizza.glb");
        let binding = ModelBinding::for_entry(&entry, MarkerPreset::Hiro);

        assert_eq!(binding.model, "models/pizza.glb");
        assert_eq!(binding.transform, entry.transform);
        assert_eq!(binding.parent, ParentFrame::Marker(MarkerPreset::Hiro));
    }
}
