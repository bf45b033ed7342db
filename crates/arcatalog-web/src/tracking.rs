//! Camera stream and marker tracking bridge
//!
//! The camera is opened with `getUserMedia` and shown in a full-screen
//! `<video>` element behind the (transparent) Bevy canvas. Marker detection is
//! delegated to an external tracker script exposing `window.markerTracker`:
//!
//! ```js
//! window.markerTracker = {
//!   attach(video, markerId, debug) { ... },  // start detecting on this video
//!   detach() { ... },                        // stop detecting
//!   pose() { ... },                          // Float32Array(16) column-major, or null when lost
//! };
//! ```

use arcatalog_core::{TrackingConfig, TrackingEngine, TrackingError, VideoSource};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = markerTracker, js_name = attach, catch)]
    fn tracker_attach(video: &HtmlVideoElement, marker: &str, debug: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = markerTracker, js_name = detach, catch)]
    fn tracker_detach() -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = markerTracker, js_name = pose, catch)]
    fn tracker_pose() -> Result<JsValue, JsValue>;
}

/// Camera state shared with the pending `getUserMedia` future
#[derive(Default)]
struct CameraSlot {
    /// Bumped on every start/stop so a late stream can tell it was cancelled
    generation: u64,
    stream: Option<MediaStream>,
    video: Option<HtmlVideoElement>,
    error: Option<TrackingError>,
}

#[derive(Default)]
pub struct WebTracker {
    slot: Rc<RefCell<CameraSlot>>,
}

impl WebTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the camera stream is live
    pub fn is_streaming(&self) -> bool {
        self.slot.borrow().stream.is_some()
    }

    /// Take a failure reported after `start` returned
    pub fn take_error(&mut self) -> Option<TrackingError> {
        self.slot.borrow_mut().error.take()
    }

    /// Latest marker pose in camera space, `None` while the marker is not visible
    pub fn marker_pose(&self) -> Option<[f32; 16]> {
        if !self.is_streaming() {
            return None;
        }

        let value = tracker_pose().ok()?;
        let array: js_sys::Float32Array = value.dyn_into().ok()?;
        if array.length() != 16 {
            return None;
        }

        let mut pose = [0.0f32; 16];
        array.copy_to(&mut pose);
        Some(pose)
    }
}

impl TrackingEngine for WebTracker {
    fn start(&mut self, config: &TrackingConfig) -> Result<(), TrackingError> {
        let window = web_sys::window()
            .ok_or_else(|| TrackingError::Unsupported("no window".to_string()))?;
        let media = window
            .navigator()
            .media_devices()
            .map_err(|_| TrackingError::Unsupported("camera API unavailable (insecure origin?)".to_string()))?;

        let VideoSource::Camera { facing } = config.source;
        let video_constraints = js_sys::Object::new();
        js_sys::Reflect::set(&video_constraints, &"facingMode".into(), &facing.as_str().into())
            .map_err(|e| TrackingError::Engine(format!("{:?}", e)))?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&video_constraints);
        constraints.set_audio(&JsValue::FALSE);

        let promise = media
            .get_user_media_with_constraints(&constraints)
            .map_err(classify_error)?;

        let generation = {
            let mut slot = self.slot.borrow_mut();
            slot.generation += 1;
            slot.error = None;
            slot.generation
        };

        let slot = self.slot.clone();
        let marker = config.marker.id().to_string();
        let debug = config.debug_ui;

        tracing::info!(marker = %marker, facing = facing.as_str(), "Requesting camera");

        wasm_bindgen_futures::spawn_local(async move {
            let result = JsFuture::from(promise).await;
            let mut slot = slot.borrow_mut();

            match result {
                Ok(value) => {
                    let stream: MediaStream = value.unchecked_into();
                    if slot.generation != generation {
                        // Closed while the permission prompt was open
                        tracing::debug!("Camera resolved after stop, releasing");
                        stop_stream(&stream);
                        return;
                    }

                    match show_video(&stream) {
                        Ok(video) => {
                            if let Err(e) = tracker_attach(&video, &marker, debug) {
                                tracing::warn!("Marker tracker not available: {:?}", e);
                                slot.error = Some(TrackingError::Engine(
                                    "marker tracker script not loaded".to_string(),
                                ));
                            }
                            slot.video = Some(video);
                            slot.stream = Some(stream);
                        }
                        Err(e) => {
                            stop_stream(&stream);
                            slot.error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    if slot.generation == generation {
                        slot.error = Some(classify_error(e));
                    }
                }
            }
        });

        Ok(())
    }

    fn stop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        slot.generation += 1;
        slot.error = None;

        if slot.video.is_some() {
            if let Err(e) = tracker_detach() {
                tracing::debug!("Marker tracker detach failed: {:?}", e);
            }
        }

        if let Some(stream) = slot.stream.take() {
            stop_stream(&stream);
        }

        if let Some(video) = slot.video.take() {
            video.set_src_object(None);
            video.remove();
        }

        tracing::info!("Camera released");
    }
}

/// Stop every track of a stream, turning the camera off
fn stop_stream(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

/// Create the full-screen video element behind the canvas
fn show_video(stream: &MediaStream) -> Result<HtmlVideoElement, TrackingError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| TrackingError::Unsupported("no document".to_string()))?;
    let body = document
        .body()
        .ok_or_else(|| TrackingError::Unsupported("no document body".to_string()))?;

    let video: HtmlVideoElement = document
        .create_element("video")
        .map_err(|e| TrackingError::Engine(format!("{:?}", e)))?
        .dyn_into()
        .map_err(|_| TrackingError::Engine("failed to cast to HtmlVideoElement".to_string()))?;

    video.set_autoplay(true);
    video.set_muted(true);
    // Required on iOS, otherwise the stream opens in the fullscreen player
    let _ = video.set_attribute("playsinline", "");

    let style = video.style();
    for (name, value) in [
        ("position", "fixed"),
        ("top", "0"),
        ("left", "0"),
        ("width", "100vw"),
        ("height", "100vh"),
        ("object-fit", "cover"),
        ("z-index", "-1"),
    ] {
        let _ = style.set_property(name, value);
    }

    video.set_src_object(Some(stream));
    body.append_child(&video)
        .map_err(|e| TrackingError::Engine(format!("{:?}", e)))?;
    let _ = video.play();

    Ok(video)
}

fn classify_error(error: JsValue) -> TrackingError {
    let name = js_sys::Reflect::get(&error, &"name".into())
        .ok()
        .and_then(|n| n.as_string())
        .unwrap_or_default();

    match name.as_str() {
        "NotAllowedError" | "SecurityError" => TrackingError::PermissionDenied,
        "NotFoundError" | "OverconstrainedError" | "NotReadableError" => {
            TrackingError::Unsupported(name)
        }
        _ => TrackingError::Engine(format!("{:?}", error)),
    }
}
