//! AR session state machine
//!
//! The session owns the single piece of mutable application state: which
//! catalog entry, if any, is being viewed in AR. Side effects of entering
//! and leaving immersive mode are delegated to a [`SessionHooks`]
//! implementation, invoked on every transition edge.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::entry::{CatalogEntry, EntryId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("entry {id} cannot be opened in AR: {reason}")]
    InvalidEntry { id: EntryId, reason: String },
}

/// Current AR session state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No entry selected, the catalog is shown
    #[default]
    Idle,
    /// Immersive view bound to an entry
    Active(CatalogEntry),
}

/// Which of the two mutually exclusive views is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Catalog,
    Immersive,
}

impl SessionState {
    pub fn mode(&self) -> Mode {
        match self {
            SessionState::Idle => Mode::Catalog,
            SessionState::Active(_) => Mode::Immersive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }
}

/// Transition callbacks run by [`ArSession`]
pub trait SessionHooks {
    /// Called after an entry has been validated, before the state becomes active
    fn on_enter_active(&mut self, entry: &CatalogEntry);

    /// Called when leaving the active state, by any path
    fn on_exit_active(&mut self, entry: &CatalogEntry);
}

/// The AR session controller
pub struct ArSession<H: SessionHooks> {
    state: SessionState,
    hooks: H,
}

impl<H: SessionHooks> ArSession<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            state: SessionState::Idle,
            hooks,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn active_entry(&self) -> Option<&CatalogEntry> {
        match &self.state {
            SessionState::Active(entry) => Some(entry),
            SessionState::Idle => None,
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Open an entry in AR
    ///
    /// Invalid entries are rejected before anything is torn down or acquired,
    /// so a failed selection never disturbs the current state. Selecting while
    /// already active closes the previous session first.
    pub fn select(&mut self, entry: CatalogEntry) -> Result<(), SessionError> {
        if let Err(e) = entry.validate_for_ar() {
            warn!(entry = %entry.id, error = %e, "Rejected AR selection");
            return Err(e);
        }

        if let Some(current) = self.active_entry() {
            debug!(from = %current.id, to = %entry.id, "Re-entrant selection, closing current session");
            self.close();
        }

        info!(entry = %entry.id, model = %entry.model, "Entering AR");
        self.hooks.on_enter_active(&entry);
        self.state = SessionState::Active(entry);
        Ok(())
    }

    /// Leave AR and return to the catalog; no-op when idle
    pub fn close(&mut self) {
        if let SessionState::Active(entry) = std::mem::take(&mut self.state) {
            info!(entry = %entry.id, "Leaving AR");
            self.hooks.on_exit_active(&entry);
        }
    }
}

impl<H: SessionHooks> Drop for ArSession<H> {
    fn drop(&mut self) {
        self.close();
    }
}
