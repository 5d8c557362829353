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

//! Headless rendering to an image file.

use std::error::Error;
use std::path::Path;

use log::info;
use map_surface::{api, MapError};

use crate::settings::ViewSettings;

/// Render one frame with the given settings and style
pub fn render(
    settings: &ViewSettings,
    style_json: &str,
) -> Result<image::RgbaImage, Box<dyn Error>> {
    let mut map = api::create_map(settings.width, settings.height);
    api::set_camera(&mut map, settings.latitude, settings.longitude, settings.zoom);
    api::set_bearing(&mut map, settings.bearing);
    api::set_pitch(&mut map, settings.pitch);

    api::set_style(&mut map, style_json)?;
    api::render_frame(&mut map)?;
    let pixels = map.read_pixels()?;

    let width = api::get_texture_width(&map);
    let height = api::get_texture_height(&map);
    api::destroy_map(map);

    image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        MapError::Readback("pixel buffer does not match surface size".to_owned()).into()
    })
}

/// Render one frame and write it to `path` (format chosen by extension)
pub fn write(settings: &ViewSettings, style_json: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    let image = render(settings, style_json)?;
    image.save(path)?;
    info!(
        "Wrote {}x{} snapshot to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::styles;

    fn settings() -> ViewSettings {
        ViewSettings {
            width: 48,
            height: 24,
            latitude: 0.0,
            longitude: 0.0,
            zoom: 2.0,
            bearing: 0.0,
            pitch: 0.0,
            style_path: None,
        }
    }

    #[test]
    fn test_bad_style_fails_before_render() {
        let err = render(&settings(), "{\"version\": 8").unwrap_err();
        assert!(err.downcast_ref::<MapError>().is_some());
    }

    #[test]
    fn test_snapshot_uses_background() {
        let Ok(image) = render(&settings(), styles::DARK) else {
            // No GPU adapter on this machine
            return;
        };
        assert_eq!(image.dimensions(), (48, 24));
        assert_eq!(image.get_pixel(0, 0).0, [0x1a, 0x1d, 0x23, 0xff]);
    }
}
