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

//! Map engine abstraction.
//!
//! The map handle never computes projections, parses styles or issues draw
//! calls itself. It talks to an engine through [`MapEngine`]; bindings to a
//! native renderer implement the trait, and [`StillEngine`] is the engine
//! bundled with this crate.

mod projection;
mod still;
mod style;

pub use projection::{Transform, WebMercator};
pub use still::StillEngine;
pub use style::{Rgba, StyleDocument, StyleLayer};

use std::path::PathBuf;

use crate::error::EngineError;
use crate::observer::MapObserver;

/// Cache directory handed to every engine the handle creates.
pub const DEFAULT_CACHE_PATH: &str = "./cache";

/// Asset directory handed to every engine the handle creates.
pub const DEFAULT_ASSET_PATH: &str = "./assets";

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Position in surface pixels, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenCoordinate {
    pub x: f64,
    pub y: f64,
}

impl ScreenCoordinate {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// How the engine schedules rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapMode {
    /// Re-render whenever state changes.
    #[default]
    Continuous,
    /// Render only on explicit still-image requests.
    Static,
    /// Render single tiles.
    Tile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub mode: MapMode,
    pub size: Size,
    pub pixel_ratio: f32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            mode: MapMode::default(),
            size: Size::default(),
            pixel_ratio: 1.0,
        }
    }
}

impl MapOptions {
    #[must_use]
    pub const fn with_mode(mut self, mode: MapMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }
}

/// Where the engine keeps downloaded resources and finds bundled assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOptions {
    pub cache_path: PathBuf,
    pub asset_path: PathBuf,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            asset_path: PathBuf::from(DEFAULT_ASSET_PATH),
        }
    }
}

/// A camera change. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraOptions {
    pub center: Option<LatLng>,
    pub zoom: Option<f64>,
    /// Degrees clockwise from north.
    pub bearing: Option<f64>,
    /// Degrees away from straight down.
    pub pitch: Option<f64>,
}

impl CameraOptions {
    #[must_use]
    pub const fn with_center(mut self, center: LatLng) -> Self {
        self.center = Some(center);
        self
    }

    #[must_use]
    pub const fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    #[must_use]
    pub const fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    #[must_use]
    pub const fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }
}

/// GPU resources an engine renders a still image into.
#[derive(Debug, Clone, Copy)]
pub struct RenderTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub texture: &'a wgpu::Texture,
    pub view: &'a wgpu::TextureView,
    pub size: Size,
}

/// A map renderer the handle can drive.
///
/// Implementations run on the thread that created them. Deferred work such
/// as observer callbacks should go through [`crate::RunLoop`], which the
/// handle drains after every operation.
pub trait MapEngine {
    fn create(
        options: &MapOptions,
        resources: &ResourceOptions,
        observer: Box<dyn MapObserver>,
    ) -> Result<Self, EngineError>
    where
        Self: Sized;

    /// Apply a camera change without animation.
    fn jump_to(&mut self, camera: &CameraOptions);

    /// Current camera with every field set.
    fn camera(&self) -> CameraOptions;

    /// Replace the active style with the given JSON document.
    fn load_style_json(&mut self, json: &str) -> Result<(), EngineError>;

    /// Render one complete frame into `target`, blocking until done.
    fn render_still(&mut self, target: &RenderTarget<'_>) -> Result<(), EngineError>;

    fn lat_lng_for_pixel(&self, point: ScreenCoordinate) -> LatLng;

    fn pixel_for_lat_lng(&self, coordinate: LatLng) -> ScreenCoordinate;
}
