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

//! Offscreen map surface manager.
//!
//! This library owns a fixed-size GPU colour target and drives a map engine
//! against it. The engine does all the real work (projection, style
//! interpretation, drawing); this crate only allocates the render target,
//! forwards camera and style changes, and exposes coordinate conversion.
//!
//! The layers can be used independently:
//!
//! - **Engine seam**: the [`MapEngine`] trait plus the bundled [`StillEngine`]
//! - **Surface layer**: [`GpuContext`] and [`OffscreenSurface`]
//! - **Handle layer**: [`MapHandle`], the free functions in [`api`] and the
//!   C ABI in [`capi`]
//!
//! # Quick Start
//!
//! ```no_run
//! use map_surface::api;
//!
//! let mut map = api::create_map(512, 512);
//! api::set_camera(&mut map, 35.6762, 139.6503, 10.0);
//!
//! let style = r##"{"version": 8, "sources": {}, "layers": [
//!     {"id": "background", "type": "background",
//!      "paint": {"background-color": "#f8f4f0"}}
//! ]}"##;
//!
//! if let Err(e) = api::set_style(&mut map, style) {
//!     eprintln!("style rejected: {e}");
//! }
//! if api::render_frame(&mut map).is_ok() {
//!     println!("rendered into texture {}", api::get_texture_id(&map));
//! }
//!
//! let [lat, lon] = api::screen_to_geographic(&map, 256.0, 256.0);
//! println!("centre is {lat}, {lon}");
//!
//! api::destroy_map(map);
//! ```

pub mod api;
pub mod capi;
pub mod engine;
mod error;
pub mod gpu;
pub mod map;
pub mod observer;
pub mod run_loop;
pub mod surface;

pub use engine::{
    CameraOptions, LatLng, MapEngine, MapMode, MapOptions, RenderTarget, ResourceOptions,
    ScreenCoordinate, Size, StillEngine, StyleDocument, DEFAULT_ASSET_PATH, DEFAULT_CACHE_PATH,
};
pub use error::{EngineError, MapError};
pub use gpu::GpuContext;
pub use map::MapHandle;
pub use observer::{MapObserver, ObserverState, RenderFrameStatus, SurfaceObserver};
pub use run_loop::RunLoop;
pub use surface::{OffscreenSurface, TextureId};
