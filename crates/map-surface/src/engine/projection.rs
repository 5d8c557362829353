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

use std::f64::consts::PI;

use super::{CameraOptions, LatLng, ScreenCoordinate, Size};

/// Web Mercator projection utilities on the unit square.
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Latitude at which the projected world becomes square.
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

    /// Convert longitude to a Web Mercator X coordinate (0.0 to 1.0)
    #[must_use]
    pub fn x(lon: f64) -> f64 {
        (lon + 180.0) / 360.0
    }

    /// Convert latitude to a Web Mercator Y coordinate (0.0 at the top)
    #[must_use]
    pub fn y(lat: f64) -> f64 {
        let lat_rad = lat.to_radians();
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
    }

    #[must_use]
    pub fn lon(x: f64) -> f64 {
        x * 360.0 - 180.0
    }

    #[must_use]
    pub fn lat(y: f64) -> f64 {
        (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees()
    }
}

/// Camera state and the screen/world transform derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    size: Size,
    center: LatLng,
    zoom: f64,
    bearing: f64,
    pitch: f64,
}

impl Transform {
    /// Edge length of the world at zoom 0, in pixels.
    pub const TILE_SIZE: f64 = 512.0;
    pub const MIN_ZOOM: f64 = 0.0;
    pub const MAX_ZOOM: f64 = 22.0;
    pub const MAX_PITCH: f64 = 60.0;

    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            center: LatLng::default(),
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
        }
    }

    /// Apply a camera change. Values are clamped or wrapped into range;
    /// non-finite values are ignored.
    pub fn jump_to(&mut self, camera: &CameraOptions) {
        if let Some(center) = camera.center {
            if center.latitude.is_finite() && center.longitude.is_finite() {
                self.center = LatLng::new(
                    center
                        .latitude
                        .clamp(-WebMercator::MAX_LATITUDE, WebMercator::MAX_LATITUDE),
                    wrap(center.longitude, -180.0, 180.0),
                );
            }
        }
        if let Some(zoom) = camera.zoom.filter(|z| z.is_finite()) {
            self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        }
        if let Some(bearing) = camera.bearing.filter(|b| b.is_finite()) {
            self.bearing = normalize_bearing(bearing);
        }
        if let Some(pitch) = camera.pitch.filter(|p| p.is_finite()) {
            self.pitch = pitch.clamp(0.0, Self::MAX_PITCH);
        }
    }

    #[must_use]
    pub fn camera(&self) -> CameraOptions {
        CameraOptions {
            center: Some(self.center),
            zoom: Some(self.zoom),
            bearing: Some(self.bearing),
            pitch: Some(self.pitch),
        }
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// World edge length in pixels at the current zoom.
    #[must_use]
    pub fn world_size(&self) -> f64 {
        Self::TILE_SIZE * self.zoom.exp2()
    }

    fn project(&self, coordinate: LatLng) -> (f64, f64) {
        let world = self.world_size();
        let lat = coordinate
            .latitude
            .clamp(-WebMercator::MAX_LATITUDE, WebMercator::MAX_LATITUDE);
        (
            WebMercator::x(coordinate.longitude) * world,
            WebMercator::y(lat) * world,
        )
    }

    fn unproject(&self, x: f64, y: f64) -> LatLng {
        let world = self.world_size();
        LatLng::new(
            WebMercator::lat(y / world),
            wrap(WebMercator::lon(x / world), -180.0, 180.0),
        )
    }

    fn viewport_center(&self) -> (f64, f64) {
        (
            f64::from(self.size.width) / 2.0,
            f64::from(self.size.height) / 2.0,
        )
    }

    /// Project a geographic position onto the surface.
    ///
    /// Longitudes are taken relative to the camera so positions across the
    /// antimeridian land next to the centre instead of a world away.
    #[must_use]
    pub fn pixel_for_lat_lng(&self, coordinate: LatLng) -> ScreenCoordinate {
        let world = self.world_size();
        let (cx, cy) = self.project(self.center);
        let (px, py) = self.project(coordinate);

        let mut dx = px - cx;
        if dx > world / 2.0 {
            dx -= world;
        } else if dx < -world / 2.0 {
            dx += world;
        }
        let dy = py - cy;

        let (sin, cos) = self.bearing.to_radians().sin_cos();
        let (vx, vy) = self.viewport_center();
        ScreenCoordinate::new(vx + dx * cos + dy * sin, vy - dx * sin + dy * cos)
    }

    /// Inverse of [`Transform::pixel_for_lat_lng`].
    #[must_use]
    pub fn lat_lng_for_pixel(&self, point: ScreenCoordinate) -> LatLng {
        let (vx, vy) = self.viewport_center();
        let (sx, sy) = (point.x - vx, point.y - vy);

        let (sin, cos) = self.bearing.to_radians().sin_cos();
        let dx = sx * cos - sy * sin;
        let dy = sx * sin + sy * cos;

        let (cx, cy) = self.project(self.center);
        self.unproject(cx + dx, cy + dy)
    }
}

/// Wrap `value` into `[min, max)`.
fn wrap(value: f64, min: f64, max: f64) -> f64 {
    if (min..max).contains(&value) {
        return value;
    }
    let span = max - min;
    (value - min).rem_euclid(span) + min
}

/// Bring a bearing into `(-180, 180]`.
fn normalize_bearing(bearing: f64) -> f64 {
    let wrapped = wrap(bearing, -180.0, 180.0);
    if (wrapped - -180.0).abs() < f64::EPSILON {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn tokyo(size: Size) -> Transform {
        let mut transform = Transform::new(size);
        transform.jump_to(
            &CameraOptions::default()
                .with_center(LatLng::new(35.6762, 139.6503))
                .with_zoom(10.0),
        );
        transform
    }

    #[test]
    fn test_mercator_inverse() {
        for lat in [-80.0, -45.0, 0.0, 35.6762, 60.0] {
            assert!((WebMercator::lat(WebMercator::y(lat)) - lat).abs() < EPSILON);
        }
        for lon in [-179.0, -73.7781, 0.0, 139.6503] {
            assert!((WebMercator::lon(WebMercator::x(lon)) - lon).abs() < EPSILON);
        }
        assert!((WebMercator::y(0.0) - 0.5).abs() < EPSILON);
        assert!(WebMercator::y(WebMercator::MAX_LATITUDE).abs() < EPSILON);
    }

    #[test]
    fn test_center_maps_to_viewport_center() {
        let transform = tokyo(Size {
            width: 512,
            height: 256,
        });
        let pixel = transform.pixel_for_lat_lng(LatLng::new(35.6762, 139.6503));
        assert!((pixel.x - 256.0).abs() < EPSILON);
        assert!((pixel.y - 128.0).abs() < EPSILON);
    }

    #[test]
    fn test_round_trip_with_bearing() {
        let mut transform = tokyo(Size {
            width: 512,
            height: 512,
        });
        transform.jump_to(&CameraOptions::default().with_bearing(37.0));

        for (x, y) in [(256.0, 256.0), (200.0, 300.0), (400.0, 100.0)] {
            let geo = transform.lat_lng_for_pixel(ScreenCoordinate::new(x, y));
            let back = transform.pixel_for_lat_lng(geo);
            assert!((back.x - x).abs() < 1e-3, "x: {} vs {x}", back.x);
            assert!((back.y - y).abs() < 1e-3, "y: {} vs {y}", back.y);
        }
    }

    #[test]
    fn test_bearing_rotates_east_to_top() {
        let mut transform = tokyo(Size {
            width: 512,
            height: 512,
        });
        transform.jump_to(&CameraOptions::default().with_bearing(90.0));

        let east = transform.pixel_for_lat_lng(LatLng::new(35.6762, 139.75));
        assert!((east.x - 256.0).abs() < 1e-6);
        assert!(east.y < 256.0);
    }

    #[test]
    fn test_north_is_up_without_bearing() {
        let transform = tokyo(Size {
            width: 512,
            height: 512,
        });
        let north = transform.pixel_for_lat_lng(LatLng::new(35.8, 139.6503));
        assert!(north.y < 256.0);
        assert!((north.x - 256.0).abs() < EPSILON);
    }

    #[test]
    fn test_antimeridian_stays_adjacent() {
        let mut transform = Transform::new(Size {
            width: 512,
            height: 512,
        });
        transform.jump_to(
            &CameraOptions::default()
                .with_center(LatLng::new(0.0, 179.9))
                .with_zoom(8.0),
        );
        let across = transform.pixel_for_lat_lng(LatLng::new(0.0, -179.9));
        assert!(across.x > 256.0);
        assert!(across.x < 512.0);
    }

    #[test]
    fn test_camera_values_are_constrained() {
        let mut transform = Transform::new(Size {
            width: 256,
            height: 256,
        });
        transform.jump_to(&CameraOptions {
            center: Some(LatLng::new(89.0, 190.0)),
            zoom: Some(40.0),
            bearing: Some(-190.0),
            pitch: Some(75.0),
        });

        let camera = transform.camera();
        let center = camera.center.unwrap();
        assert!((center.latitude - WebMercator::MAX_LATITUDE).abs() < EPSILON);
        assert!((center.longitude - -170.0).abs() < EPSILON);
        assert_eq!(camera.zoom, Some(Transform::MAX_ZOOM));
        assert!((camera.bearing.unwrap() - 170.0).abs() < EPSILON);
        assert_eq!(camera.pitch, Some(Transform::MAX_PITCH));
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let mut transform = tokyo(Size {
            width: 256,
            height: 256,
        });
        transform.jump_to(&CameraOptions {
            center: Some(LatLng::new(f64::NAN, 0.0)),
            zoom: Some(f64::INFINITY),
            bearing: None,
            pitch: Some(f64::NAN),
        });
        assert_eq!(transform, tokyo(transform.size()));
    }

    #[test]
    fn test_normalize_bearing() {
        assert!((normalize_bearing(-180.0) - 180.0).abs() < EPSILON);
        assert!((normalize_bearing(540.0) - 180.0).abs() < EPSILON);
        assert!((normalize_bearing(-90.0) - -90.0).abs() < EPSILON);
        assert!((normalize_bearing(370.0) - 10.0).abs() < EPSILON);
    }
}
