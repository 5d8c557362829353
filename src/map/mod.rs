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

//! Map view: an offscreen map surface shown as an egui texture.
//!
//! The surface renders on its own headless device; each new frame is read
//! back and uploaded into egui, the same way the waterfall image is.
//!
//! Frames go through the CPU instead of sharing eframe's device: the viewer
//! runs on eframe's default renderer, which is glow when both renderers are
//! built, so `wgpu_render_state` is usually absent. The surface also stores
//! sRGB-encoded bytes in an `Rgba8Unorm` texture, which egui-wgpu would
//! sample as linear if registered as a native texture. The snapshot command
//! needs the same readback.

pub mod styles;

use egui::{ColorImage, TextureHandle, TextureOptions};
use log::{debug, warn};
use map_surface::{CameraOptions, LatLng, MapError, MapHandle};

use crate::settings::ViewSettings;

/// Zoom change per scroll pixel
const SCROLL_ZOOM_RATE: f64 = 1.0 / 200.0;

pub struct MapView {
    handle: MapHandle,
    /// Camera that "Reset view" returns to
    home: CameraOptions,
    texture: Option<TextureHandle>,
    needs_render: bool,
    last_error: Option<String>,
}

impl MapView {
    pub fn new(settings: &ViewSettings) -> Self {
        let mut handle = MapHandle::create(settings.width, settings.height);
        handle.set_camera(settings.latitude, settings.longitude, settings.zoom);
        handle.set_bearing(settings.bearing);
        handle.set_pitch(settings.pitch);

        if handle.texture_id() == 0 {
            warn!("Map surface unavailable, the view will stay empty");
        }

        let home = CameraOptions::default()
            .with_center(LatLng::new(settings.latitude, settings.longitude))
            .with_zoom(settings.zoom)
            .with_bearing(settings.bearing)
            .with_pitch(settings.pitch);

        Self {
            handle,
            home,
            texture: None,
            needs_render: true,
            last_error: None,
        }
    }

    pub fn handle(&self) -> &MapHandle {
        &self.handle
    }

    pub fn camera(&self) -> CameraOptions {
        self.handle.camera()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_style(&mut self, style_json: &str) -> Result<(), MapError> {
        let result = self.handle.set_style(style_json);
        self.needs_render = true;
        match &result {
            Ok(()) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    pub fn set_camera(&mut self, latitude: f64, longitude: f64, zoom: f64) {
        self.handle.set_camera(latitude, longitude, zoom);
        self.needs_render = true;
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        self.handle.set_bearing(bearing);
        self.needs_render = true;
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.handle.set_pitch(pitch);
        self.needs_render = true;
    }

    /// Make `camera` the view [`MapView::reset_view`] returns to
    pub fn set_home(&mut self, camera: CameraOptions) {
        self.home = camera;
    }

    /// Jump back to the startup camera, or the last one saved as default
    pub fn reset_view(&mut self) {
        let center = self.home.center.unwrap_or_default();
        let zoom = self.home.zoom.unwrap_or_default();
        self.set_camera(center.latitude, center.longitude, zoom);
        self.set_bearing(self.home.bearing.unwrap_or_default());
        self.set_pitch(self.home.pitch.unwrap_or_default());
    }

    /// Move the map so the content under the pointer follows a drag of
    /// `(dx, dy)` surface pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let center_x = f64::from(self.handle.width()) / 2.0;
        let center_y = f64::from(self.handle.height()) / 2.0;
        let [lat, lon] = self.handle.screen_to_geographic(center_x - dx, center_y - dy);
        let zoom = self.camera().zoom.unwrap_or_default();
        self.set_camera(lat, lon, zoom);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        let camera = self.camera();
        let center = camera.center.unwrap_or_default();
        let zoom = camera.zoom.unwrap_or_default() + delta;
        self.set_camera(center.latitude, center.longitude, zoom);
    }

    /// Geographic position under a point given in surface pixels
    pub fn geographic_at(&self, x: f64, y: f64) -> [f64; 2] {
        self.handle.screen_to_geographic(x, y)
    }

    /// Render a new frame if anything changed and upload it to egui
    fn refresh(&mut self, ctx: &egui::Context) {
        if !self.needs_render {
            return;
        }
        self.needs_render = false;

        if let Err(e) = self.handle.render_frame() {
            self.last_error = Some(e.to_string());
            return;
        }
        let pixels = match self.handle.read_pixels() {
            Ok(pixels) => pixels,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return;
            }
        };

        let size = [self.handle.width() as usize, self.handle.height() as usize];
        let image = ColorImage::from_rgba_unmultiplied(size, &pixels);
        // Update or create texture
        if let Some(texture) = &mut self.texture {
            texture.set(image, TextureOptions::LINEAR);
        } else {
            self.texture = Some(ctx.load_texture(
                format!("map_surface_{}", self.handle.texture_id()),
                image,
                TextureOptions::LINEAR,
            ));
        }
        debug!("Uploaded map frame {}", self.handle.observer_state().frames_rendered);
    }

    /// Draw the map and handle drag, scroll and hover. Returns the
    /// geographic position under the pointer, if any.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<[f64; 2]> {
        self.refresh(ui.ctx());

        let Some(texture) = &self.texture else {
            ui.label(
                egui::RichText::new(self.last_error.as_deref().unwrap_or("No map surface"))
                    .color(egui::Color32::from_rgb(255, 120, 120)),
            );
            return None;
        };

        let surface_size = egui::vec2(self.handle.width() as f32, self.handle.height() as f32);
        let available = ui.available_size();
        let scale = (available.x / surface_size.x)
            .min(available.y / surface_size.y)
            .max(f32::EPSILON);

        let response = ui.add(
            egui::Image::new(texture)
                .fit_to_exact_size(surface_size * scale)
                .sense(egui::Sense::click_and_drag()),
        );

        if response.dragged() {
            let delta = response.drag_delta() / scale;
            if delta != egui::Vec2::ZERO {
                self.pan_by(f64::from(delta.x), f64::from(delta.y));
            }
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.zoom_by(f64::from(scroll) * SCROLL_ZOOM_RATE);
            }
        }

        if self.needs_render {
            ui.ctx().request_repaint();
        }

        response.hover_pos().map(|pos| {
            let local = (pos - response.rect.min) / scale;
            self.geographic_at(f64::from(local.x), f64::from(local.y))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> MapView {
        MapView::new(&ViewSettings {
            width: 256,
            height: 256,
            latitude: 35.0,
            longitude: 139.0,
            zoom: 8.0,
            bearing: 0.0,
            pitch: 0.0,
            style_path: None,
        })
    }

    #[test]
    fn test_pan_moves_center_against_drag() {
        let mut view = view();
        // Dragging right reveals what was to the west
        view.pan_by(50.0, 0.0);
        let center = view.camera().center.unwrap();
        assert!(center.longitude < 139.0);
        assert!((center.latitude - 35.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_by_keeps_center() {
        let mut view = view();
        view.zoom_by(1.5);
        let camera = view.camera();
        assert_eq!(camera.zoom, Some(9.5));
        assert_eq!(camera.center.map(|c| c.longitude), Some(139.0));
    }

    #[test]
    fn test_style_error_is_kept() {
        let mut view = view();
        assert!(view.set_style("{").is_err());
        assert!(view.last_error().is_some());
        view.set_style(styles::BRIGHT).unwrap();
        assert!(view.last_error().is_none());
    }

    #[test]
    fn test_reset_view_returns_home() {
        let mut view = view();
        view.pan_by(-80.0, 40.0);
        view.zoom_by(3.0);
        view.set_bearing(90.0);
        view.set_pitch(45.0);

        view.reset_view();
        let camera = view.camera();
        assert_eq!(camera.center, Some(LatLng::new(35.0, 139.0)));
        assert_eq!(camera.zoom, Some(8.0));
        assert_eq!(camera.bearing, Some(0.0));
        assert_eq!(camera.pitch, Some(0.0));
    }

    #[test]
    fn test_reset_view_uses_saved_home() {
        let mut view = view();
        view.set_camera(51.5, -0.12, 11.0);
        view.set_home(view.camera());

        view.zoom_by(-4.0);
        view.reset_view();
        let camera = view.camera();
        assert_eq!(camera.center, Some(LatLng::new(51.5, -0.12)));
        assert_eq!(camera.zoom, Some(11.0));
    }
}
