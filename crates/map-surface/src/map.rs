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

//! The map handle.
//!
//! [`MapHandle`] exclusively owns a boxed [`MapImpl`] holding the surface,
//! the engine and the thread's run loop. Every operation is synchronous and
//! forwards to the engine; nothing is cached or validated on the way.
//!
//! The handle is neither `Send` nor `Sync` because the run loop it shares is
//! bound to the creating thread.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::engine::{
    CameraOptions, LatLng, MapEngine, MapMode, MapOptions, ResourceOptions, ScreenCoordinate,
    Size, StillEngine,
};
use crate::error::MapError;
use crate::gpu::GpuContext;
use crate::observer::{ObserverState, SurfaceObserver};
use crate::run_loop::RunLoop;
use crate::surface::{OffscreenSurface, TextureId};

/// Owned state behind a [`MapHandle`].
#[derive(Debug)]
struct MapImpl<E> {
    width: u32,
    height: u32,
    // Field order is drop order: the engine goes before the texture it draws into
    engine: Option<E>,
    surface: Option<OffscreenSurface>,
    observer_state: Rc<RefCell<ObserverState>>,
    run_loop: Rc<RunLoop>,
}

/// Owning handle to an offscreen map.
#[derive(Debug)]
pub struct MapHandle<E: MapEngine = StillEngine> {
    inner: Box<MapImpl<E>>,
}

impl MapHandle<StillEngine> {
    /// Create a map with the bundled engine on a headless GPU device.
    #[must_use]
    pub fn create(width: u32, height: u32) -> Self {
        Self::create_with_engine(width, height)
    }

    /// Create a map with the bundled engine on an existing device.
    #[must_use]
    pub fn create_with_context(gpu: &GpuContext, width: u32, height: u32) -> Self {
        Self::create_with_engine_and_context(Some(gpu), width, height)
    }
}

impl<E: MapEngine> MapHandle<E> {
    /// Create a map driving engine `E` on a headless GPU device.
    #[must_use]
    pub fn create_with_engine(width: u32, height: u32) -> Self {
        let gpu = GpuContext::headless();
        Self::create_with_engine_and_context(gpu.as_ref(), width, height)
    }

    /// Create a map driving engine `E`.
    ///
    /// Missing resources do not fail construction: without a GPU context the
    /// surface is absent, and an engine that fails to start is absent. Both
    /// conditions are logged and show up as zero accessors and
    /// [`MapError::NoSurface`] / [`MapError::NoEngine`] results.
    #[must_use]
    pub fn create_with_engine_and_context(
        gpu: Option<&GpuContext>,
        width: u32,
        height: u32,
    ) -> Self {
        let run_loop = RunLoop::get_or_create();

        let surface = match gpu {
            Some(gpu) => OffscreenSurface::new(gpu, width, height),
            None => {
                warn!("No GPU context available, map surface will not be allocated");
                None
            }
        };

        let observer = SurfaceObserver::new();
        let observer_state = observer.state();
        let options = MapOptions::default()
            .with_mode(MapMode::Static)
            .with_size(Size { width, height });
        let engine = match E::create(&options, &ResourceOptions::default(), Box::new(observer)) {
            Ok(engine) => Some(engine),
            Err(e) => {
                error!("Failed to create map engine: {e}");
                None
            }
        };

        info!(
            "Created {width}x{height} map (texture {})",
            surface.as_ref().map_or(TextureId::NONE, OffscreenSurface::id)
        );

        let map = Self {
            inner: Box::new(MapImpl {
                width,
                height,
                engine,
                surface,
                observer_state,
                run_loop,
            }),
        };
        map.pump();
        map
    }

    /// Release the map and its GPU resources.
    pub fn destroy(self) {
        debug!("Destroying map (texture {})", self.texture_id());
    }

    /// Deliver whatever the engine queued on the run loop.
    fn pump(&self) -> usize {
        self.inner.run_loop.run_once()
    }

    fn jump_to(&mut self, camera: &CameraOptions) {
        if let Some(engine) = self.inner.engine.as_mut() {
            engine.jump_to(camera);
            self.pump();
        }
    }

    pub fn set_camera(&mut self, latitude: f64, longitude: f64, zoom: f64) {
        self.jump_to(
            &CameraOptions::default()
                .with_center(LatLng::new(latitude, longitude))
                .with_zoom(zoom),
        );
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        self.jump_to(&CameraOptions::default().with_bearing(bearing));
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.jump_to(&CameraOptions::default().with_pitch(pitch));
    }

    /// The engine's current camera, or the default camera without an engine.
    #[must_use]
    pub fn camera(&self) -> CameraOptions {
        self.inner
            .engine
            .as_ref()
            .map(MapEngine::camera)
            .unwrap_or_default()
    }

    /// Replace the active style.
    pub fn set_style(&mut self, style_json: &str) -> Result<(), MapError> {
        let engine = self.inner.engine.as_mut().ok_or(MapError::NoEngine)?;
        let result = engine.load_style_json(style_json).map_err(MapError::StyleParse);
        self.pump();
        if let Err(e) = &result {
            error!("{e}");
        }
        result
    }

    /// Render one still frame into the surface texture.
    pub fn render_frame(&mut self) -> Result<(), MapError> {
        let inner = &mut *self.inner;
        let engine = inner.engine.as_mut().ok_or(MapError::NoEngine)?;
        let surface = inner.surface.as_ref().ok_or(MapError::NoSurface)?;

        let result = engine
            .render_still(&surface.render_target())
            .map_err(MapError::Render);
        self.pump();
        if let Err(e) = &result {
            error!("{e}");
        }
        result
    }

    /// Texture id of the surface, or zero when it was never allocated.
    #[must_use]
    pub fn texture_id(&self) -> u32 {
        self.inner
            .surface
            .as_ref()
            .map_or(0, |surface| surface.id().get())
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// The surface texture, for sampling from another renderer on the same device.
    #[must_use]
    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.inner.surface.as_ref().map(OffscreenSurface::texture)
    }

    /// Copy the last rendered frame to CPU memory as RGBA8 rows.
    pub fn read_pixels(&self) -> Result<Vec<u8>, MapError> {
        self.inner
            .surface
            .as_ref()
            .ok_or(MapError::NoSurface)?
            .read_pixels()
    }

    /// Engine events seen so far.
    #[must_use]
    pub fn observer_state(&self) -> ObserverState {
        self.inner.observer_state.borrow().clone()
    }

    /// Geographic position under a surface pixel, as `[latitude, longitude]`.
    #[must_use]
    pub fn screen_to_geographic(&self, x: f64, y: f64) -> [f64; 2] {
        self.inner.engine.as_ref().map_or([0.0, 0.0], |engine| {
            let coordinate = engine.lat_lng_for_pixel(ScreenCoordinate::new(x, y));
            [coordinate.latitude, coordinate.longitude]
        })
    }

    /// Surface pixel of a geographic position, as `[x, y]`.
    #[must_use]
    pub fn geographic_to_screen(&self, latitude: f64, longitude: f64) -> [f64; 2] {
        self.inner.engine.as_ref().map_or([0.0, 0.0], |engine| {
            let point = engine.pixel_for_lat_lng(LatLng::new(latitude, longitude));
            [point.x, point.y]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RenderTarget;
    use crate::error::EngineError;
    use crate::observer::MapObserver;

    const STYLE: &str = r##"{
        "version": 8,
        "name": "Test",
        "sources": {},
        "layers": [
            {"id": "background", "type": "background",
             "paint": {"background-color": "#2040c0"}}
        ]
    }"##;

    /// Engine that refuses to start.
    struct BrokenEngine;

    impl MapEngine for BrokenEngine {
        fn create(
            _options: &MapOptions,
            _resources: &ResourceOptions,
            _observer: Box<dyn MapObserver>,
        ) -> Result<Self, EngineError> {
            Err(EngineError::Gpu("no context".to_owned()))
        }

        fn jump_to(&mut self, _camera: &CameraOptions) {}

        fn camera(&self) -> CameraOptions {
            CameraOptions::default()
        }

        fn load_style_json(&mut self, _json: &str) -> Result<(), EngineError> {
            Ok(())
        }

        fn render_still(&mut self, _target: &RenderTarget<'_>) -> Result<(), EngineError> {
            Ok(())
        }

        fn lat_lng_for_pixel(&self, _point: ScreenCoordinate) -> LatLng {
            LatLng::new(1.0, 1.0)
        }

        fn pixel_for_lat_lng(&self, _coordinate: LatLng) -> ScreenCoordinate {
            ScreenCoordinate::new(1.0, 1.0)
        }
    }

    fn map_without_gpu() -> MapHandle {
        MapHandle::<StillEngine>::create_with_engine_and_context(None, 256, 128)
    }

    #[test]
    fn test_accessors_without_surface() {
        let map = map_without_gpu();
        assert_eq!(map.width(), 256);
        assert_eq!(map.height(), 128);
        assert_eq!(map.texture_id(), 0);
        assert!(map.texture().is_none());
        assert!(matches!(map.read_pixels(), Err(MapError::NoSurface)));
    }

    #[test]
    fn test_render_without_surface() {
        let mut map = map_without_gpu();
        map.set_style(STYLE).unwrap();
        assert!(matches!(map.render_frame(), Err(MapError::NoSurface)));
    }

    #[test]
    fn test_without_engine_everything_is_default() {
        let mut map = MapHandle::<BrokenEngine>::create_with_engine_and_context(None, 64, 64);

        map.set_camera(10.0, 20.0, 3.0);
        assert_eq!(map.camera(), CameraOptions::default());
        assert_eq!(map.screen_to_geographic(32.0, 32.0), [0.0, 0.0]);
        assert_eq!(map.geographic_to_screen(10.0, 20.0), [0.0, 0.0]);
        assert!(matches!(map.set_style(STYLE), Err(MapError::NoEngine)));
        assert!(matches!(map.render_frame(), Err(MapError::NoEngine)));
        assert_eq!(map.texture_id(), 0);
    }

    #[test]
    fn test_camera_is_forwarded_unchecked() {
        let mut map = map_without_gpu();
        map.set_camera(35.6762, 139.6503, 10.0);
        map.set_bearing(45.0);
        map.set_pitch(30.0);

        let camera = map.camera();
        assert_eq!(camera.center, Some(LatLng::new(35.6762, 139.6503)));
        assert_eq!(camera.zoom, Some(10.0));
        assert_eq!(camera.bearing, Some(45.0));
        assert_eq!(camera.pitch, Some(30.0));

        // Out-of-range values reach the engine, which constrains them itself
        map.set_camera(95.0, 0.0, 99.0);
        let camera = map.camera();
        assert!(camera.center.unwrap().latitude < 90.0);
        assert!(camera.zoom.unwrap() < 99.0);
    }

    #[test]
    fn test_bad_style_is_reported() {
        let mut map = map_without_gpu();
        let truncated = &STYLE[..STYLE.len() - 20];

        let err = map.set_style(truncated).unwrap_err();
        assert!(matches!(err, MapError::StyleParse(EngineError::Style(_))));
        assert_eq!(map.width(), 256);
        assert_eq!(map.height(), 128);
        assert!(map.observer_state().last_load_error.is_some());

        map.set_style(STYLE).unwrap();
        let state = map.observer_state();
        assert!(state.style_loaded);
        assert!(state.last_load_error.is_none());
    }

    #[test]
    fn test_coordinate_round_trip_near_center() {
        let mut map = map_without_gpu();
        map.set_camera(51.5074, -0.1278, 12.0);

        let [x, y] = map.geographic_to_screen(51.5074, -0.1278);
        assert!((x - 128.0).abs() < 1e-6);
        assert!((y - 64.0).abs() < 1e-6);

        for (sx, sy) in [(128.0, 64.0), (100.0, 50.0), (150.0, 80.0)] {
            let [lat, lon] = map.screen_to_geographic(sx, sy);
            let [bx, by] = map.geographic_to_screen(lat, lon);
            assert!((bx - sx).abs() < 0.5);
            assert!((by - sy).abs() < 0.5);
        }
    }

    #[test]
    fn test_render_after_style() {
        let Some(gpu) = GpuContext::headless() else {
            return;
        };
        let mut map = MapHandle::create_with_context(&gpu, 128, 64);
        assert_eq!(map.width(), 128);
        assert_eq!(map.height(), 64);
        assert_ne!(map.texture_id(), 0);

        // No style yet
        assert!(matches!(
            map.render_frame(),
            Err(MapError::Render(EngineError::NoStyle))
        ));

        map.set_style(STYLE).unwrap();
        map.render_frame().unwrap();

        let pixels = map.read_pixels().unwrap();
        assert_eq!(pixels.len(), 128 * 64 * 4);
        assert_eq!(&pixels[..4], &[0x20, 0x40, 0xc0, 0xff]);
        assert_eq!(map.observer_state().frames_rendered, 1);
    }

    #[test]
    fn test_rejected_surface_reports_errors() {
        let Some(gpu) = GpuContext::headless() else {
            return;
        };
        let too_wide = gpu.device.limits().max_texture_dimension_2d + 1;
        let mut map = MapHandle::create_with_context(&gpu, too_wide, 4);
        assert_ne!(map.texture_id(), 0);
        assert_eq!(map.width(), too_wide);

        map.set_style(STYLE).unwrap();
        assert!(matches!(
            map.render_frame(),
            Err(MapError::Render(EngineError::Gpu(_)))
        ));
        assert!(matches!(map.read_pixels(), Err(MapError::Readback(_))));
        map.destroy();
    }

    #[test]
    fn test_texture_ids_differ_between_maps() {
        let Some(gpu) = GpuContext::headless() else {
            return;
        };
        let a = MapHandle::create_with_context(&gpu, 32, 32);
        let b = MapHandle::create_with_context(&gpu, 32, 32);
        assert_ne!(a.texture_id(), b.texture_id());
        a.destroy();
        b.destroy();
    }

    #[test]
    fn test_maps_share_the_thread_run_loop() {
        let a = map_without_gpu();
        let b = map_without_gpu();
        assert!(Rc::ptr_eq(&a.inner.run_loop, &b.inner.run_loop));
    }
}
