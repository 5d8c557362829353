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

//! Free-function form of the map handle.
//!
//! Each function takes the handle explicitly, mirroring the shape bindings
//! generators expect. Creation and destruction are explicit calls so
//! ownership transfer stays visible at the call site.

use crate::engine::MapEngine;
use crate::error::MapError;
use crate::map::MapHandle;

/// Create a map with the bundled engine on a headless GPU device.
#[must_use]
pub fn create_map(width: u32, height: u32) -> MapHandle {
    MapHandle::create(width, height)
}

/// Consume the handle and release its resources.
pub fn destroy_map<E: MapEngine>(map: MapHandle<E>) {
    map.destroy();
}

pub fn set_camera<E: MapEngine>(map: &mut MapHandle<E>, latitude: f64, longitude: f64, zoom: f64) {
    map.set_camera(latitude, longitude, zoom);
}

pub fn set_bearing<E: MapEngine>(map: &mut MapHandle<E>, bearing: f64) {
    map.set_bearing(bearing);
}

pub fn set_pitch<E: MapEngine>(map: &mut MapHandle<E>, pitch: f64) {
    map.set_pitch(pitch);
}

pub fn set_style<E: MapEngine>(map: &mut MapHandle<E>, style_json: &str) -> Result<(), MapError> {
    map.set_style(style_json)
}

pub fn render_frame<E: MapEngine>(map: &mut MapHandle<E>) -> Result<(), MapError> {
    map.render_frame()
}

#[must_use]
pub fn get_texture_id<E: MapEngine>(map: &MapHandle<E>) -> u32 {
    map.texture_id()
}

#[must_use]
pub fn get_texture_width<E: MapEngine>(map: &MapHandle<E>) -> u32 {
    map.width()
}

#[must_use]
pub fn get_texture_height<E: MapEngine>(map: &MapHandle<E>) -> u32 {
    map.height()
}

/// `[latitude, longitude]` under the given surface pixel.
#[must_use]
pub fn screen_to_geographic<E: MapEngine>(map: &MapHandle<E>, x: f64, y: f64) -> [f64; 2] {
    map.screen_to_geographic(x, y)
}

/// `[x, y]` surface pixel of the given position.
#[must_use]
pub fn geographic_to_screen<E: MapEngine>(
    map: &MapHandle<E>,
    latitude: f64,
    longitude: f64,
) -> [f64; 2] {
    map.geographic_to_screen(latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_match_construction() {
        for (width, height) in [(1, 1), (512, 512), (300, 150)] {
            let map = create_map(width, height);
            assert_eq!(get_texture_width(&map), width);
            assert_eq!(get_texture_height(&map), height);
            destroy_map(map);
        }
    }

    #[test]
    fn test_style_then_render() {
        let mut map = create_map(64, 64);
        set_camera(&mut map, 35.6762, 139.6503, 10.0);
        set_bearing(&mut map, 15.0);
        set_pitch(&mut map, 20.0);

        assert!(set_style(&mut map, r#"{"version": 8, "sources": {}, "layers": ["#).is_err());
        assert_eq!(get_texture_width(&map), 64);

        set_style(&mut map, r#"{"version": 8, "sources": {}, "layers": []}"#).unwrap();
        if get_texture_id(&map) != 0 {
            render_frame(&mut map).unwrap();
        } else {
            assert!(matches!(render_frame(&mut map), Err(MapError::NoSurface)));
        }
        destroy_map(map);
    }

    #[test]
    fn test_round_trip_after_centering() {
        let mut map = create_map(400, 300);
        set_camera(&mut map, -33.8688, 151.2093, 11.0);

        let [lat, lon] = screen_to_geographic(&map, 200.0, 150.0);
        assert!((lat - -33.8688).abs() < 1e-6);
        assert!((lon - 151.2093).abs() < 1e-6);

        let [x, y] = geographic_to_screen(&map, lat, lon);
        assert!((x - 200.0).abs() < 0.5);
        assert!((y - 150.0).abs() < 0.5);
    }
}
