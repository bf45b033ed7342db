//! Page-level scroll lock
//!
//! Immersive mode needs the page to stop scrolling and fill the viewport so the
//! camera feed is neither clipped nor scrollable behind the AR canvas. The
//! document style is process-wide, so it is captured before the lock is
//! engaged and written back on release, on every exit path.

use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("failed to apply page style: {0}")]
    Style(String),
}

/// Inline style properties touched by the scroll lock
///
/// `None` means the property is not set inline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageStyle {
    pub overflow: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub margin: Option<String>,
}

impl PageStyle {
    /// Style applied while the immersive view is shown
    pub fn immersive() -> Self {
        Self {
            overflow: Some("hidden".to_string()),
            width: Some("100vw".to_string()),
            height: Some("100vh".to_string()),
            margin: Some("0".to_string()),
        }
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.overflow.as_deref() == Some("hidden")
    }
}

/// The document whose style the scroll lock mutates
pub trait PageSurface {
    fn read(&self) -> PageStyle;
    fn write(&mut self, style: &PageStyle) -> Result<(), PageError>;
}

/// Scoped scroll lock over a [`PageSurface`]
pub struct ScrollLock<S: PageSurface> {
    surface: S,
    saved: Option<PageStyle>,
}

impl<S: PageSurface> ScrollLock<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            saved: None,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.saved.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Capture the current page style and apply the immersive style
    ///
    /// The captured style is kept even if applying fails, so a later
    /// [`release`](Self::release) still restores the page.
    pub fn engage(&mut self) -> Result<(), PageError> {
        if self.saved.is_some() {
            return Ok(());
        }

        let previous = self.surface.read();
        debug!(?previous, "Engaging scroll lock");
        self.saved = Some(previous);
        self.surface.write(&PageStyle::immersive())
    }

    /// Restore the captured page style; no-op when not engaged
    pub fn release(&mut self) {
        let Some(previous) = self.saved.take() else {
            return;
        };

        debug!(?previous, "Releasing scroll lock");
        if let Err(e) = self.surface.write(&previous) {
            warn!(error = %e, "Scroll lock release failed, retrying");
            if let Err(e) = self.surface.write(&previous) {
                error!(error = %e, "Page style could not be restored");
            }
        }
    }
}

impl<S: PageSurface> Drop for ScrollLock<S> {
    fn drop(&mut self) {
        self.release();
    }
}
