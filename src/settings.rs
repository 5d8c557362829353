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

//! Command line arguments and the effective settings for one run.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ViewerConfig;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Offscreen map viewer and snapshot tool")]
pub struct Args {
    /// Surface width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Surface height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Style document (JSON) to load
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Camera latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Camera longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    #[arg(long)]
    pub zoom: Option<f64>,

    /// Degrees clockwise from north
    #[arg(long, allow_negative_numbers = true)]
    pub bearing: Option<f64>,

    #[arg(long)]
    pub pitch: Option<f64>,

    /// Render one frame to this PNG file and exit instead of opening a window
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

/// Stored configuration with command line overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub width: u32,
    pub height: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    pub style_path: Option<PathBuf>,
}

impl ViewSettings {
    pub fn resolve(config: &ViewerConfig, args: &Args) -> Self {
        Self {
            width: args.width.unwrap_or(config.surface_width),
            height: args.height.unwrap_or(config.surface_height),
            latitude: args.lat.unwrap_or(config.latitude),
            longitude: args.lon.unwrap_or(config.longitude),
            zoom: args.zoom.unwrap_or(config.zoom),
            bearing: args.bearing.unwrap_or(config.bearing),
            pitch: args.pitch.unwrap_or(config.pitch),
            style_path: args.style.clone().or_else(|| config.style_path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_used_without_flags() {
        let config = ViewerConfig::default();
        let settings = ViewSettings::resolve(&config, &Args::default());
        assert_eq!(settings.width, config.surface_width);
        assert_eq!(settings.latitude, config.latitude);
        assert_eq!(settings.style_path, None);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "mapview-desktop",
            "--width",
            "800",
            "--lat",
            "-33.8688",
            "--lon",
            "151.2093",
            "--bearing",
            "-45",
            "--style",
            "dark.json",
        ]);
        let settings = ViewSettings::resolve(&ViewerConfig::default(), &args);
        assert_eq!(settings.width, 800);
        assert_eq!(settings.height, 512);
        assert_eq!(settings.latitude, -33.8688);
        assert_eq!(settings.longitude, 151.2093);
        assert_eq!(settings.bearing, -45.0);
        assert_eq!(settings.style_path, Some(PathBuf::from("dark.json")));
    }
}
