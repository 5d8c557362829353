// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Engine notifications.
//!
//! Every callback has a no-op default so observers only implement what they
//! care about.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

/// How a camera change was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraChangeMode {
    Immediate,
    Animated,
}

/// Whether a frame contained everything the style asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFrameStatus {
    Partial,
    Full,
}

/// Category of a map load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLoadError {
    StyleParse,
    StyleLoad,
    NotFound,
    Unknown,
}

/// Receiver for map engine events.
pub trait MapObserver {
    fn on_camera_will_change(&mut self, _mode: CameraChangeMode) {}
    fn on_camera_is_changing(&mut self) {}
    fn on_camera_did_change(&mut self, _mode: CameraChangeMode) {}
    fn on_will_start_loading_map(&mut self) {}
    fn on_did_finish_loading_map(&mut self) {}
    fn on_did_fail_loading_map(&mut self, _error: MapLoadError, _message: &str) {}
    fn on_will_start_rendering_frame(&mut self) {}
    fn on_did_finish_rendering_frame(&mut self, _status: RenderFrameStatus) {}
    fn on_will_start_rendering_map(&mut self) {}
    fn on_did_finish_rendering_map(&mut self) {}
    fn on_did_finish_loading_style(&mut self) {}
    fn on_did_become_idle(&mut self) {}
    fn on_style_image_missing(&mut self, _id: &str) {}

    /// Whether an unused style image may be evicted. Defaults to always.
    fn can_remove_unused_style_image(&mut self, _id: &str) -> bool {
        true
    }
}

/// What the surface observer has seen so far.
#[derive(Debug, Default, Clone)]
pub struct ObserverState {
    pub frames_rendered: u64,
    pub last_frame: Option<RenderFrameStatus>,
    pub style_loaded: bool,
    pub last_load_error: Option<String>,
    /// Images the most recent frame could not find, without repeats
    pub missing_images: Vec<String>,
}

/// Observer installed by the map handle.
///
/// Logs events and records them in a shared [`ObserverState`] the handle can
/// inspect after draining the run loop.
#[derive(Debug, Default, Clone)]
pub struct SurfaceObserver {
    state: Rc<RefCell<ObserverState>>,
}

impl SurfaceObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recorded state.
    #[must_use]
    pub fn state(&self) -> Rc<RefCell<ObserverState>> {
        Rc::clone(&self.state)
    }
}

impl MapObserver for SurfaceObserver {
    fn on_camera_did_change(&mut self, mode: CameraChangeMode) {
        debug!("Camera changed ({mode:?})");
    }

    fn on_did_fail_loading_map(&mut self, error: MapLoadError, message: &str) {
        warn!("Map failed to load ({error:?}): {message}");
        let mut state = self.state.borrow_mut();
        state.style_loaded = false;
        state.last_load_error = Some(message.to_owned());
    }

    fn on_will_start_rendering_frame(&mut self) {
        self.state.borrow_mut().missing_images.clear();
    }

    fn on_did_finish_rendering_frame(&mut self, status: RenderFrameStatus) {
        let mut state = self.state.borrow_mut();
        state.frames_rendered += 1;
        state.last_frame = Some(status);
        debug!("Frame {} finished ({status:?})", state.frames_rendered);
    }

    fn on_did_finish_loading_style(&mut self) {
        debug!("Style loaded");
        let mut state = self.state.borrow_mut();
        state.style_loaded = true;
        state.last_load_error = None;
    }

    fn on_style_image_missing(&mut self, id: &str) {
        debug!("Style image missing: {id}");
        let mut state = self.state.borrow_mut();
        if !state.missing_images.iter().any(|known| known == id) {
            state.missing_images.push(id.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl MapObserver for Silent {}

    #[test]
    fn test_default_allows_image_eviction() {
        let mut observer = Silent;
        assert!(observer.can_remove_unused_style_image("marker"));

        let mut surface = SurfaceObserver::new();
        assert!(surface.can_remove_unused_style_image("marker"));
    }

    #[test]
    fn test_surface_observer_records_frames() {
        let mut observer = SurfaceObserver::new();
        let state = observer.state();

        observer.on_did_finish_rendering_frame(RenderFrameStatus::Full);
        observer.on_did_finish_rendering_frame(RenderFrameStatus::Partial);

        let state = state.borrow();
        assert_eq!(state.frames_rendered, 2);
        assert_eq!(state.last_frame, Some(RenderFrameStatus::Partial));
    }

    #[test]
    fn test_load_failure_clears_style_flag() {
        let mut observer = SurfaceObserver::new();
        let state = observer.state();

        observer.on_did_finish_loading_style();
        assert!(state.borrow().style_loaded);

        observer.on_did_fail_loading_map(MapLoadError::StyleParse, "unexpected end of input");
        let state = state.borrow();
        assert!(!state.style_loaded);
        assert_eq!(state.last_load_error.as_deref(), Some("unexpected end of input"));
    }

    #[test]
    fn test_missing_images_reset_each_frame() {
        let mut observer = SurfaceObserver::new();
        let state = observer.state();

        for _ in 0..3 {
            observer.on_will_start_rendering_frame();
            observer.on_style_image_missing("airport-15");
            observer.on_style_image_missing("airport-15");
            observer.on_did_finish_rendering_frame(RenderFrameStatus::Partial);
        }
        assert_eq!(state.borrow().missing_images, vec!["airport-15".to_owned()]);

        observer.on_will_start_rendering_frame();
        observer.on_did_finish_rendering_frame(RenderFrameStatus::Full);
        assert!(state.borrow().missing_images.is_empty());
    }
}
