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

//! C ABI over the map handle.
//!
//! Handles cross the boundary as opaque `*mut MapHandle` pointers obtained
//! from [`mapsurface_create`] and released with [`mapsurface_destroy`].
//! Every entry point accepts a null handle: accessors return zero and
//! fallible calls return [`MapStatus::NullHandle`].
//!
//! All calls for one handle must come from the thread that created it.

use std::slice;
use std::str;

use log::error;

use crate::error::MapError;
use crate::map::MapHandle;

/// Result code of a fallible C call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStatus {
    Ok = 0,
    StyleParse = 1,
    Render = 2,
    NoEngine = 3,
    NoSurface = 4,
    NullHandle = -1,
    InvalidArgument = -2,
}

impl From<&MapError> for MapStatus {
    fn from(error: &MapError) -> Self {
        match error {
            MapError::StyleParse(_) => Self::StyleParse,
            MapError::Render(_) | MapError::Readback(_) => Self::Render,
            MapError::NoEngine => Self::NoEngine,
            MapError::NoSurface => Self::NoSurface,
        }
    }
}

impl From<Result<(), MapError>> for MapStatus {
    fn from(result: Result<(), MapError>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(e) => Self::from(&e),
        }
    }
}

/// # Safety
///
/// `map` must be null or a live pointer from [`mapsurface_create`].
unsafe fn handle<'a>(map: *const MapHandle) -> Option<&'a MapHandle> {
    // SAFETY: upheld by the caller
    unsafe { map.as_ref() }
}

/// # Safety
///
/// `map` must be null or a live pointer from [`mapsurface_create`] with no
/// other outstanding reference.
unsafe fn handle_mut<'a>(map: *mut MapHandle) -> Option<&'a mut MapHandle> {
    // SAFETY: upheld by the caller
    unsafe { map.as_mut() }
}

/// # Safety
///
/// `out` must be null or valid for writing two `f64` values.
unsafe fn write_pair(out: *mut f64, pair: [f64; 2]) -> MapStatus {
    if out.is_null() {
        return MapStatus::InvalidArgument;
    }
    // SAFETY: `out` is non-null and the caller guarantees room for two values
    unsafe {
        out.write(pair[0]);
        out.add(1).write(pair[1]);
    }
    MapStatus::Ok
}

/// Create a map. The returned handle must be released with
/// [`mapsurface_destroy`].
#[no_mangle]
pub extern "C" fn mapsurface_create(width: u32, height: u32) -> *mut MapHandle {
    Box::into_raw(Box::new(MapHandle::create(width, height)))
}

/// # Safety
///
/// `map` must be null or a pointer from [`mapsurface_create`] that has not
/// been destroyed yet.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_destroy(map: *mut MapHandle) {
    if map.is_null() {
        return;
    }
    // SAFETY: the pointer came from `Box::into_raw` in `mapsurface_create`
    // and the caller gives up ownership here
    let map = unsafe { Box::from_raw(map) };
    map.destroy();
}

/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_set_camera(
    map: *mut MapHandle,
    latitude: f64,
    longitude: f64,
    zoom: f64,
) {
    // SAFETY: upheld by the caller
    if let Some(map) = unsafe { handle_mut(map) } {
        map.set_camera(latitude, longitude, zoom);
    }
}

/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_set_bearing(map: *mut MapHandle, bearing: f64) {
    // SAFETY: upheld by the caller
    if let Some(map) = unsafe { handle_mut(map) } {
        map.set_bearing(bearing);
    }
}

/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_set_pitch(map: *mut MapHandle, pitch: f64) {
    // SAFETY: upheld by the caller
    if let Some(map) = unsafe { handle_mut(map) } {
        map.set_pitch(pitch);
    }
}

/// Load a style from `len` bytes of UTF-8 JSON at `style_json`.
///
/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract. `style_json` must be
/// valid for reading `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_set_style(
    map: *mut MapHandle,
    style_json: *const u8,
    len: usize,
) -> MapStatus {
    // SAFETY: upheld by the caller
    let Some(map) = (unsafe { handle_mut(map) }) else {
        return MapStatus::NullHandle;
    };
    if style_json.is_null() {
        return MapStatus::InvalidArgument;
    }
    // SAFETY: non-null and the caller guarantees `len` readable bytes
    let bytes = unsafe { slice::from_raw_parts(style_json, len) };
    match str::from_utf8(bytes) {
        Ok(json) => map.set_style(json).into(),
        Err(e) => {
            error!("Style passed over the C ABI is not UTF-8: {e}");
            MapStatus::InvalidArgument
        }
    }
}

/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_render_frame(map: *mut MapHandle) -> MapStatus {
    // SAFETY: upheld by the caller
    match unsafe { handle_mut(map) } {
        Some(map) => map.render_frame().into(),
        None => MapStatus::NullHandle,
    }
}

/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_texture_id(map: *const MapHandle) -> u32 {
    // SAFETY: upheld by the caller
    unsafe { handle(map) }.map_or(0, MapHandle::texture_id)
}

/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_texture_width(map: *const MapHandle) -> u32 {
    // SAFETY: upheld by the caller
    unsafe { handle(map) }.map_or(0, MapHandle::width)
}

/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_texture_height(map: *const MapHandle) -> u32 {
    // SAFETY: upheld by the caller
    unsafe { handle(map) }.map_or(0, MapHandle::height)
}

/// Write `[latitude, longitude]` under pixel `(x, y)` to `out`.
///
/// # Safety
///
/// See [`mapsurface_destroy`] for the handle contract. `out` must be valid
/// for writing two `f64` values.
#[no_mangle]
pub unsafe extern "C" fn mapsurface_screen_to_geographic(
    map: *const MapHandle,
    x: f64,
    y: f64,
    out: *mut f64,
) -> MapStatus {
    // SAFETY: upheld by the caller
    let pair = unsafe { handle(map) }.map_or([0.0, 0.0], |map| map.screen_to_geographic(x, y));
    // SAFETY: upheld by the caller
    unsafe { write_pair(out, pair) }
}

/// Write the `[x, y]` pixel of `(latitude, longitude)` to `out`.
///
/// # Safety
///
/// See [`mapsurface_screen_to_geographic`].
#[no_mangle]
pub unsafe extern "C" fn mapsurface_geographic_to_screen(
    map: *const MapHandle,
    latitude: f64,
    longitude: f64,
    out: *mut f64,
) -> MapStatus {
    // SAFETY: upheld by the caller
    let pair = unsafe { handle(map) }
        .map_or([0.0, 0.0], |map| map.geographic_to_screen(latitude, longitude));
    // SAFETY: upheld by the caller
    unsafe { write_pair(out, pair) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_null_handle_is_tolerated() {
        let mut out = [9.0, 9.0];
        // SAFETY: null handles are part of the contract
        unsafe {
            mapsurface_set_camera(ptr::null_mut(), 1.0, 2.0, 3.0);
            assert_eq!(mapsurface_texture_id(ptr::null()), 0);
            assert_eq!(mapsurface_texture_width(ptr::null()), 0);
            assert_eq!(mapsurface_render_frame(ptr::null_mut()), MapStatus::NullHandle);
            assert_eq!(
                mapsurface_set_style(ptr::null_mut(), b"{}".as_ptr(), 2),
                MapStatus::NullHandle
            );
            assert_eq!(
                mapsurface_screen_to_geographic(ptr::null(), 1.0, 1.0, out.as_mut_ptr()),
                MapStatus::Ok
            );
            mapsurface_destroy(ptr::null_mut());
        }
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn test_lifecycle_through_c_abi() {
        let map = mapsurface_create(200, 100);
        assert!(!map.is_null());

        let good = br#"{"version": 8, "sources": {}, "layers": []}"#;
        let bad = br#"{"version": 8, "sources": {"#;
        let mut out = [0.0; 2];

        // SAFETY: `map` is live until the destroy call, buffers are in bounds
        unsafe {
            assert_eq!(mapsurface_texture_width(map), 200);
            assert_eq!(mapsurface_texture_height(map), 100);

            mapsurface_set_camera(map, 48.8566, 2.3522, 9.0);
            mapsurface_set_bearing(map, 0.0);
            mapsurface_set_pitch(map, 0.0);

            assert_eq!(
                mapsurface_set_style(map, bad.as_ptr(), bad.len()),
                MapStatus::StyleParse
            );
            assert_eq!(
                mapsurface_set_style(map, good.as_ptr(), good.len()),
                MapStatus::Ok
            );
            assert_eq!(
                mapsurface_set_style(map, [0xff, 0xfe].as_ptr(), 2),
                MapStatus::InvalidArgument
            );

            let status = mapsurface_render_frame(map);
            if mapsurface_texture_id(map) == 0 {
                assert_eq!(status, MapStatus::NoSurface);
            } else {
                assert_eq!(status, MapStatus::Ok);
            }

            assert_eq!(
                mapsurface_geographic_to_screen(map, 48.8566, 2.3522, out.as_mut_ptr()),
                MapStatus::Ok
            );
            assert_eq!(
                mapsurface_screen_to_geographic(map, 0.0, 0.0, ptr::null_mut()),
                MapStatus::InvalidArgument
            );

            mapsurface_destroy(map);
        }

        assert!((out[0] - 100.0).abs() < 1e-6);
        assert!((out[1] - 50.0).abs() < 1e-6);
    }
}
