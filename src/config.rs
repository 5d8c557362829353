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

//! Viewer configuration management.
//!
//! Persistent settings are stored in TOML via confy. Command line flags
//! override them for a single run without touching the stored file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const APP_NAME: &str = "mapview-desktop";
const CONFIG_NAME: &str = "config";

/// Default camera: Tokyo
pub const DEFAULT_LATITUDE: f64 = 35.6762;
pub const DEFAULT_LONGITUDE: f64 = 139.6503;

/// Viewer configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Offscreen surface width in pixels
    #[serde(default = "default_surface_size")]
    pub surface_width: u32,

    /// Offscreen surface height in pixels
    #[serde(default = "default_surface_size")]
    pub surface_height: u32,

    /// Camera latitude at startup
    #[serde(default = "default_latitude")]
    pub latitude: f64,

    /// Camera longitude at startup
    #[serde(default = "default_longitude")]
    pub longitude: f64,

    /// Camera zoom at startup (0.0 - 22.0)
    #[serde(default = "default_zoom")]
    pub zoom: f64,

    /// Camera bearing at startup, degrees clockwise from north
    #[serde(default)]
    pub bearing: f64,

    /// Camera pitch at startup (0.0 - 60.0)
    #[serde(default)]
    pub pitch: f64,

    /// Style document to load instead of the built-in one
    #[serde(default)]
    pub style_path: Option<PathBuf>,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_surface_size() -> u32 {
    512
}

fn default_latitude() -> f64 {
    DEFAULT_LATITUDE
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

fn default_zoom() -> f64 {
    10.0
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            surface_width: default_surface_size(),
            surface_height: default_surface_size(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            zoom: default_zoom(),
            bearing: 0.0,
            pitch: 0.0,
            style_path: None,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from disk, writing defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Store the given camera as the startup camera
    pub fn remember_camera(
        &mut self,
        latitude: f64,
        longitude: f64,
        zoom: f64,
        bearing: f64,
        pitch: f64,
    ) {
        self.latitude = latitude;
        self.longitude = longitude;
        self.zoom = zoom;
        self.bearing = bearing;
        self.pitch = pitch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ViewerConfig = toml::from_str("zoom = 4.5\n").unwrap();
        assert_eq!(config.zoom, 4.5);
        assert_eq!(config.surface_width, 512);
        assert_eq!(config.latitude, DEFAULT_LATITUDE);
        assert!(config.style_path.is_none());
    }

    #[test]
    fn test_round_trip_toml() {
        let mut config = ViewerConfig::default();
        config.style_path = Some(PathBuf::from("styles/bright.json"));
        config.remember_camera(51.5, -0.12, 8.0, 30.0, 10.0);

        let text = toml::to_string(&config).unwrap();
        let parsed: ViewerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
