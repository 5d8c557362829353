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

mod config;
mod map;
mod settings;
mod snapshot;
mod ui;

use std::error::Error;

use clap::Parser;
use eframe::egui;
use log::{info, warn};

use config::ViewerConfig;
use settings::{Args, ViewSettings};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ViewerConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        ViewerConfig::default()
    });
    if let Ok(path) = ViewerConfig::get_config_path() {
        info!("Config file: {}", path.display());
    }

    let settings = ViewSettings::resolve(&config, &args);
    let style_json = map::styles::load(settings.style_path.as_deref())?;

    if let Some(path) = &args.snapshot {
        return snapshot::write(&settings, &style_json, path);
    }

    info!("Starting map viewer...");
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                settings.width as f32 + 260.0,
                (settings.height as f32).max(480.0),
            ])
            .with_title("Map Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "Map Viewer",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ui::MapViewerApp::new(config, &settings, style_json)))
        }),
    )?;
    Ok(())
}
