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

//! Bundled still-image engine.
//!
//! Keeps a Web Mercator camera, validates style documents and renders a
//! frame by filling the target with the style's background colour. It does
//! not fetch sources or draw any other layer type.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, warn};

use super::{
    CameraOptions, LatLng, MapEngine, MapOptions, RenderTarget, ResourceOptions, ScreenCoordinate,
    StyleDocument, Transform,
};
use crate::error::EngineError;
use crate::observer::{CameraChangeMode, MapLoadError, MapObserver, RenderFrameStatus};
use crate::run_loop::RunLoop;

type SharedObserver = Rc<RefCell<Box<dyn MapObserver>>>;

pub struct StillEngine {
    options: MapOptions,
    resources: ResourceOptions,
    observer: SharedObserver,
    transform: Transform,
    style: Option<StyleDocument>,
    camera_mutated: bool,
}

impl fmt::Debug for StillEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StillEngine")
            .field("options", &self.options)
            .field("resources", &self.resources)
            .field("transform", &self.transform)
            .field("style", &self.style.as_ref().and_then(|s| s.name.as_deref()))
            .finish_non_exhaustive()
    }
}

impl StillEngine {
    #[must_use]
    pub const fn options(&self) -> &MapOptions {
        &self.options
    }

    #[must_use]
    pub const fn resources(&self) -> &ResourceOptions {
        &self.resources
    }

    #[must_use]
    pub const fn style(&self) -> Option<&StyleDocument> {
        self.style.as_ref()
    }

    /// Deliver an observer callback through the thread's run loop.
    fn notify(&self, callback: impl FnOnce(&mut dyn MapObserver) + 'static) {
        let observer = Rc::clone(&self.observer);
        RunLoop::post_or_run(move || callback(&mut **observer.borrow_mut()));
    }
}

impl MapEngine for StillEngine {
    fn create(
        options: &MapOptions,
        resources: &ResourceOptions,
        observer: Box<dyn MapObserver>,
    ) -> Result<Self, EngineError> {
        debug!(
            "Creating still engine {}x{} ({:?}), cache {:?}, assets {:?}",
            options.size.width,
            options.size.height,
            options.mode,
            resources.cache_path,
            resources.asset_path
        );
        Ok(Self {
            options: options.clone(),
            resources: resources.clone(),
            observer: Rc::new(RefCell::new(observer)),
            transform: Transform::new(options.size),
            style: None,
            camera_mutated: false,
        })
    }

    fn jump_to(&mut self, camera: &CameraOptions) {
        self.notify(|o| o.on_camera_will_change(CameraChangeMode::Immediate));
        self.transform.jump_to(camera);
        self.camera_mutated = true;
        self.notify(|o| o.on_camera_did_change(CameraChangeMode::Immediate));
    }

    fn camera(&self) -> CameraOptions {
        self.transform.camera()
    }

    fn load_style_json(&mut self, json: &str) -> Result<(), EngineError> {
        self.notify(|o| o.on_will_start_loading_map());

        let style = match StyleDocument::from_json(json) {
            Ok(style) => style,
            Err(e) => {
                let message = e.to_string();
                self.notify(move |o| o.on_did_fail_loading_map(MapLoadError::StyleParse, &message));
                return Err(e);
            }
        };

        // A style's own camera only applies until the caller moves the map
        if !self.camera_mutated {
            self.transform.jump_to(&style.default_camera());
        }

        debug!(
            "Loaded style {:?} with {} layer(s)",
            style.name.as_deref().unwrap_or("<unnamed>"),
            style.layers.len()
        );
        self.style = Some(style);
        self.notify(|o| {
            o.on_did_finish_loading_style();
            o.on_did_finish_loading_map();
        });
        Ok(())
    }

    fn render_still(&mut self, target: &RenderTarget<'_>) -> Result<(), EngineError> {
        let style = self.style.as_ref().ok_or(EngineError::NoStyle)?;
        if target.size != self.options.size {
            return Err(EngineError::SizeMismatch {
                expected: (self.options.size.width, self.options.size.height),
                actual: (target.size.width, target.size.height),
            });
        }

        let background = style.background_color();
        let missing: Vec<String> = style.icon_images().into_iter().map(str::to_owned).collect();

        self.notify(|o| {
            o.on_will_start_rendering_map();
            o.on_will_start_rendering_frame();
        });

        target.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = target
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Still Frame Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Still Frame Background"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        target.queue.submit([encoder.finish()]);

        let polled = target
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| EngineError::Gpu(e.to_string()));
        let scoped = pollster::block_on(target.device.pop_error_scope());
        polled?;
        if let Some(error) = scoped {
            warn!("Still frame rejected by the device: {error}");
            return Err(EngineError::Gpu(error.to_string()));
        }

        // No sprite sheet is ever loaded, so every icon is missing
        let status = if missing.is_empty() {
            RenderFrameStatus::Full
        } else {
            RenderFrameStatus::Partial
        };
        self.notify(move |o| {
            for id in &missing {
                o.on_style_image_missing(id);
            }
            o.on_did_finish_rendering_frame(status);
            o.on_did_finish_rendering_map();
            o.on_did_become_idle();
        });

        Ok(())
    }

    fn lat_lng_for_pixel(&self, point: ScreenCoordinate) -> LatLng {
        self.transform.lat_lng_for_pixel(point)
    }

    fn pixel_for_lat_lng(&self, coordinate: LatLng) -> ScreenCoordinate {
        self.transform.pixel_for_lat_lng(coordinate)
    }
}
