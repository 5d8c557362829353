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

//! Main viewer window: camera controls on the left, the map surface in the
//! middle.

use eframe::egui;
use log::{error, info, warn};
use map_surface::RenderFrameStatus;

use crate::config::ViewerConfig;
use crate::map::{styles, MapView};
use crate::settings::ViewSettings;

const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(130, 130, 130);
const VALUE_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 200, 200);
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 100, 100);

pub struct MapViewerApp {
    config: ViewerConfig,
    view: MapView,
    /// Style loaded at startup (file or default), offered as "Startup"
    startup_style: String,
    selected_style: Option<usize>,
    hover: Option<[f64; 2]>,
    status_message: Option<String>,
}

impl MapViewerApp {
    pub fn new(config: ViewerConfig, settings: &ViewSettings, style_json: String) -> Self {
        let mut view = MapView::new(settings);
        if let Err(e) = view.set_style(&style_json) {
            error!("Startup style rejected: {}", e);
        }

        Self {
            config,
            view,
            startup_style: style_json,
            selected_style: None,
            hover: None,
            status_message: None,
        }
    }

    fn apply_style(&mut self, selection: Option<usize>) {
        let json = match selection {
            Some(index) => styles::BUILT_IN.get(index).map(|(_, json)| *json),
            None => Some(self.startup_style.as_str()),
        };
        let Some(json) = json else {
            return;
        };
        let json = json.to_owned();
        if self.view.set_style(&json).is_ok() {
            self.selected_style = selection;
        }
    }

    fn selected_style_name(&self) -> &str {
        self.selected_style
            .and_then(|index| styles::BUILT_IN.get(index))
            .map(|(name, _)| *name)
            .unwrap_or("Startup")
    }

    fn save_view(&mut self) {
        let camera = self.view.camera();
        let center = camera.center.unwrap_or_default();
        self.config.remember_camera(
            center.latitude,
            center.longitude,
            camera.zoom.unwrap_or_default(),
            camera.bearing.unwrap_or_default(),
            camera.pitch.unwrap_or_default(),
        );
        self.view.set_home(camera);

        match self.config.save() {
            Ok(()) => {
                info!("Saved startup view");
                self.status_message = Some("View saved".to_owned());
            }
            Err(e) => {
                warn!("Failed to save config: {}", e);
                self.status_message = Some(format!("Save failed: {}", e));
            }
        }
    }

    fn section_label(ui: &mut egui::Ui, text: &str) {
        ui.label(
            egui::RichText::new(text)
                .color(egui::Color32::from_rgb(150, 150, 150))
                .size(10.0)
                .strong(),
        );
        ui.add_space(3.0);
    }

    fn value_row(ui: &mut egui::Ui, label: &str, value: String) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(label).color(LABEL_COLOR).size(10.0));
            ui.label(egui::RichText::new(value).color(VALUE_COLOR).size(10.0).monospace());
        });
    }

    fn render_camera_section(&mut self, ui: &mut egui::Ui) {
        Self::section_label(ui, "CAMERA");

        let camera = self.view.camera();
        let center = camera.center.unwrap_or_default();
        let mut latitude = center.latitude;
        let mut longitude = center.longitude;
        let mut zoom = camera.zoom.unwrap_or_default();
        let mut bearing = camera.bearing.unwrap_or_default();
        let mut pitch = camera.pitch.unwrap_or_default();

        let mut position_changed = false;
        ui.horizontal(|ui| {
            ui.label("Lat");
            position_changed |= ui
                .add(egui::DragValue::new(&mut latitude).speed(0.01).range(-85.0511..=85.0511))
                .changed();
            ui.label("Lon");
            position_changed |= ui
                .add(egui::DragValue::new(&mut longitude).speed(0.01).range(-180.0..=180.0))
                .changed();
        });
        position_changed |= ui
            .add(egui::Slider::new(&mut zoom, 0.0..=22.0).text("Zoom"))
            .changed();
        if position_changed {
            self.view.set_camera(latitude, longitude, zoom);
        }

        if ui
            .add(egui::Slider::new(&mut bearing, -180.0..=180.0).text("Bearing"))
            .changed()
        {
            self.view.set_bearing(bearing);
        }
        if ui
            .add(egui::Slider::new(&mut pitch, 0.0..=60.0).text("Pitch"))
            .changed()
        {
            self.view.set_pitch(pitch);
        }

        ui.add_space(4.0);
        if ui.button("Save view as default").clicked() {
            self.save_view();
        }
        if ui.button("Reset view").clicked() {
            self.view.reset_view();
        }
    }

    fn render_style_section(&mut self, ui: &mut egui::Ui) {
        Self::section_label(ui, "STYLE");

        let mut selection = self.selected_style;
        egui::ComboBox::from_id_salt("style_picker")
            .selected_text(self.selected_style_name())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selection, None, "Startup");
                for (index, (name, _)) in styles::BUILT_IN.iter().enumerate() {
                    ui.selectable_value(&mut selection, Some(index), *name);
                }
            });
        if selection != self.selected_style {
            self.apply_style(selection);
        }

        if ui.button("Reload style").clicked() {
            self.apply_style(self.selected_style);
        }
    }

    fn render_status_section(&self, ui: &mut egui::Ui) {
        Self::section_label(ui, "SURFACE");

        let handle = self.view.handle();
        let state = handle.observer_state();
        Self::value_row(ui, "Texture:", format!("#{}", handle.texture_id()));
        Self::value_row(ui, "Size:", format!("{}x{}", handle.width(), handle.height()));
        Self::value_row(ui, "Frames:", format!("{}", state.frames_rendered));
        let frame = match state.last_frame {
            Some(RenderFrameStatus::Full) => "full",
            Some(RenderFrameStatus::Partial) => "partial",
            None => "-",
        };
        Self::value_row(ui, "Last frame:", frame.to_owned());
        if !state.missing_images.is_empty() {
            Self::value_row(ui, "Missing:", state.missing_images.join(", "));
        }

        if let Some([lat, lon]) = self.hover {
            Self::value_row(ui, "Cursor:", format!("{:.5}, {:.5}", lat, lon));
        }

        if let Some(err) = self.view.last_error() {
            ui.add_space(4.0);
            ui.label(egui::RichText::new(err).color(ERROR_COLOR).size(10.0));
        }
        if let Some(message) = &self.status_message {
            ui.label(egui::RichText::new(message).color(LABEL_COLOR).size(9.0));
        }
    }
}

impl eframe::App for MapViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                self.render_camera_section(ui);
                ui.separator();
                self.render_style_section(ui);
                ui.separator();
                self.render_status_section(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.hover = self.view.show(ui);
            });
    }
}
