//! Browser history integration
//!
//! Entering AR pushes a history entry so the device back button leaves the
//! immersive view instead of the page. Leaving the page (or backgrounding it
//! on mobile, which fires `pagehide`) closes the session so the camera is
//! released. The browser stops animation frames on a hidden page, so that
//! close runs inside the listener rather than in a system.

use bevy::prelude::*;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app::ArRuntime;
use arcatalog_core::{ArSession, Mode, SessionHooks};

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavigationSignals>()
            .init_resource::<HistoryTracker>()
            .add_systems(Startup, install_listeners)
            .add_systems(Update, sync_history);
    }
}

/// Flags raised by browser event listeners
///
/// `page_hidden` is only raised when the listener could not close the
/// session itself, so the next frame finishes the job.
#[derive(Resource, Default)]
pub struct NavigationSignals {
    pub back: Arc<AtomicBool>,
    pub page_hidden: Arc<AtomicBool>,
}

/// Close the session from an event handler, outside any frame
///
/// Returns whether an immersive session was torn down. A session already
/// borrowed by a running system is left alone.
pub fn close_from_listener<H: SessionHooks>(session: &RefCell<ArSession<H>>) -> bool {
    let Ok(mut session) = session.try_borrow_mut() else {
        tracing::warn!("Session busy, deferring close to the next frame");
        return false;
    };

    let was_immersive = session.mode() == Mode::Immersive;
    session.close();
    was_immersive
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Push,
    Back,
    None,
}

/// Keeps the pushed history entry in step with the session mode
#[derive(Resource, Debug, Default)]
pub struct HistoryTracker {
    immersive: bool,
    pushed: bool,
}

impl HistoryTracker {
    /// The user navigated back; our entry is already gone
    pub fn on_back(&mut self) {
        self.pushed = false;
    }

    /// Compare against the current mode and say what to do with history
    pub fn observe(&mut self, mode: Mode) -> HistoryAction {
        let immersive = mode == Mode::Immersive;
        if immersive == self.immersive {
            return HistoryAction::None;
        }

        self.immersive = immersive;
        if immersive {
            self.pushed = true;
            HistoryAction::Push
        } else if self.pushed {
            self.pushed = false;
            HistoryAction::Back
        } else {
            HistoryAction::None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn install_listeners(signals: Res<NavigationSignals>, runtime: NonSend<ArRuntime>) {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    let Some(window) = web_sys::window() else {
        return;
    };

    let back = signals.back.clone();
    let on_popstate = Closure::wrap(Box::new(move |_: web_sys::Event| {
        back.store(true, Ordering::SeqCst);
    }) as Box<dyn FnMut(web_sys::Event)>);

    let session = runtime.shared();
    let hidden = signals.page_hidden.clone();
    let on_pagehide = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if close_from_listener(&session) {
            tracing::info!("Page hidden, closed AR view");
        } else if session.try_borrow_mut().is_err() {
            hidden.store(true, Ordering::SeqCst);
        }
    }) as Box<dyn FnMut(web_sys::Event)>);

    for (event, listener) in [("popstate", on_popstate), ("pagehide", on_pagehide)] {
        if let Err(e) =
            window.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
        {
            tracing::warn!("Failed to listen for {}: {:?}", event, e);
        }
        listener.forget();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn install_listeners(_signals: Res<NavigationSignals>, _runtime: NonSend<ArRuntime>) {
    tracing::info!("History integration not available in native mode");
}

fn sync_history(
    signals: Res<NavigationSignals>,
    mut tracker: ResMut<HistoryTracker>,
    runtime: NonSend<ArRuntime>,
) {
    let mut session = runtime.session_mut();

    if signals.back.swap(false, Ordering::SeqCst) {
        tracker.on_back();
        if session.mode() == Mode::Immersive {
            tracing::info!("Back navigation, closing AR view");
            session.close();
        }
    }

    if signals.page_hidden.swap(false, Ordering::SeqCst) {
        tracing::info!("Page hidden, closing AR view");
        session.close();
    }

    match tracker.observe(session.mode()) {
        HistoryAction::Push => push_entry(),
        HistoryAction::Back => go_back(),
        HistoryAction::None => {}
    }
}

fn push_entry() {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    if let Err(e) = history.push_state(&wasm_bindgen::JsValue::NULL, "") {
        tracing::warn!("Failed to push history entry: {:?}", e);
    }
}

fn go_back() {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    if let Err(e) = history.back() {
        tracing::warn!("Failed to pop history entry: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcatalog_core::CatalogEntry;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl SessionHooks for Recorder {
        fn on_enter_active(&mut self, entry: &CatalogEntry) {
            self.events.push(format!("enter {}", entry.id));
        }

        fn on_exit_active(&mut self, entry: &CatalogEntry) {
            self.events.push(format!("exit {}", entry.id));
        }
    }

    fn active_session() -> Rc<RefCell<ArSession<Recorder>>> {
        let session = Rc::new(RefCell::new(ArSession::new(Recorder::default())));
        session
            .borrow_mut()
            .select(CatalogEntry::new(1u64, "Pizza", "models/pizza.glb"))
            .unwrap();
        session
    }

    #[test]
    fn test_pagehide_closes_without_a_frame() {
        let session = active_session();

        // Same handle the listener closure holds; no schedule runs here
        let listener_handle = session.clone();
        assert!(close_from_listener(&listener_handle));

        let session = session.borrow();
        assert_eq!(session.mode(), Mode::Catalog);
        assert_eq!(session.hooks().events, vec!["enter 1", "exit 1"]);
    }

    #[test]
    fn test_pagehide_when_idle_does_nothing() {
        let session = active_session();
        assert!(close_from_listener(&session));
        assert!(!close_from_listener(&session));
        assert_eq!(session.borrow().hooks().events.len(), 2);
    }

    #[test]
    fn test_pagehide_while_borrowed_defers() {
        let session = active_session();
        let held = session.borrow();

        assert!(!close_from_listener(&session));
        assert_eq!(held.mode(), Mode::Immersive);
        drop(held);

        // The fallback flag lets the next frame finish the close
        assert!(close_from_listener(&session));
    }

    #[test]
    fn test_history_pops_after_listener_close() {
        let session = active_session();
        let mut tracker = HistoryTracker::default();
        assert_eq!(tracker.observe(session.borrow().mode()), HistoryAction::Push);

        close_from_listener(&session);
        assert_eq!(tracker.observe(session.borrow().mode()), HistoryAction::Back);
    }

    #[test]
    fn test_enter_and_close_pushes_then_pops() {
        let mut tracker = HistoryTracker::default();
        assert_eq!(tracker.observe(Mode::Catalog), HistoryAction::None);
        assert_eq!(tracker.observe(Mode::Immersive), HistoryAction::Push);
        assert_eq!(tracker.observe(Mode::Immersive), HistoryAction::None);
        assert_eq!(tracker.observe(Mode::Catalog), HistoryAction::Back);
    }

    #[test]
    fn test_back_button_does_not_pop_twice() {
        let mut tracker = HistoryTracker::default();
        assert_eq!(tracker.observe(Mode::Immersive), HistoryAction::Push);

        tracker.on_back();
        assert_eq!(tracker.observe(Mode::Catalog), HistoryAction::None);

        // A later session gets its own entry
        assert_eq!(tracker.observe(Mode::Immersive), HistoryAction::Push);
    }
}
