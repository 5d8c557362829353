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

//! Style document model.
//!
//! Only the structure is checked here (version, sources, layer ids and
//! types). Paint and layout properties stay as raw JSON values; the still
//! engine reads the few it needs.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{CameraOptions, LatLng};
use crate::error::EngineError;

/// The only style document version accepted.
pub const STYLE_VERSION: u8 = 8;

const LAYER_TYPES: &[&str] = &[
    "background",
    "fill",
    "line",
    "symbol",
    "circle",
    "heatmap",
    "fill-extrusion",
    "raster",
    "hillshade",
];

/// A parsed style document.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleDocument {
    pub version: u8,

    #[serde(default)]
    pub name: Option<String>,

    /// Default camera centre as `[longitude, latitude]`.
    #[serde(default)]
    pub center: Option<[f64; 2]>,

    #[serde(default)]
    pub zoom: Option<f64>,

    #[serde(default)]
    pub bearing: Option<f64>,

    #[serde(default)]
    pub pitch: Option<f64>,

    pub sources: Map<String, Value>,

    pub layers: Vec<StyleLayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleLayer {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub paint: Map<String, Value>,

    #[serde(default)]
    pub layout: Map<String, Value>,
}

impl StyleLayer {
    /// Whether the layer's `visibility` layout property hides it.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.layout.get("visibility").and_then(Value::as_str) == Some("none")
    }
}

impl StyleDocument {
    /// Parse and structurally validate a style.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let style: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Style(e.to_string()))?;
        style.validate()?;
        Ok(style)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.version != STYLE_VERSION {
            return Err(EngineError::Style(format!(
                "unsupported style version {} (expected {STYLE_VERSION})",
                self.version
            )));
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id.as_str()) {
                return Err(EngineError::Style(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            if !LAYER_TYPES.contains(&layer.kind.as_str()) {
                return Err(EngineError::Style(format!(
                    "layer '{}' has unknown type '{}'",
                    layer.id, layer.kind
                )));
            }
            if let Some(source) = &layer.source {
                if !self.sources.contains_key(source) {
                    return Err(EngineError::Style(format!(
                        "layer '{}' references missing source '{source}'",
                        layer.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Camera the style asks for, if it names one.
    #[must_use]
    pub fn default_camera(&self) -> CameraOptions {
        CameraOptions {
            center: self.center.map(|[lon, lat]| LatLng::new(lat, lon)),
            zoom: self.zoom,
            bearing: self.bearing,
            pitch: self.pitch,
        }
    }

    /// Fill colour of the first visible background layer.
    ///
    /// Styles without one, or whose colour is an expression, render
    /// transparent.
    #[must_use]
    pub fn background_color(&self) -> Rgba {
        let Some(layer) = self
            .layers
            .iter()
            .find(|layer| layer.kind == "background" && !layer.is_hidden())
        else {
            return Rgba::TRANSPARENT;
        };

        let color = layer
            .paint
            .get("background-color")
            .and_then(Value::as_str)
            .and_then(Rgba::parse)
            .unwrap_or(Rgba::BLACK);
        let opacity = layer
            .paint
            .get("background-opacity")
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);

        Rgba {
            a: color.a * opacity,
            ..color
        }
    }

    /// Literal `icon-image` names referenced by visible symbol layers.
    #[must_use]
    pub fn icon_images(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|layer| layer.kind == "symbol" && !layer.is_hidden())
            .filter_map(|layer| layer.layout.get("icon-image").and_then(Value::as_str))
            .collect()
    }
}

/// Straight-alpha colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse the CSS colour forms styles commonly use: `#rgb`, `#rgba`,
    /// `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` and a few keywords.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_ascii_lowercase();
        match lower.as_str() {
            "transparent" => return Some(Self::TRANSPARENT),
            "black" => return Some(Self::BLACK),
            "white" => return Some(Self::WHITE),
            _ => {}
        }

        if let Some(hex) = lower.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let (body, expects_alpha) = if let Some(body) = lower.strip_prefix("rgba(") {
            (body, true)
        } else if let Some(body) = lower.strip_prefix("rgb(") {
            (body, false)
        } else {
            return None;
        };
        let parts: Vec<f64> = body
            .strip_suffix(')')?
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok())
            .collect::<Option<_>>()?;

        let color = match (parts.as_slice(), expects_alpha) {
            ([r, g, b], false) => Self::new(r / 255.0, g / 255.0, b / 255.0, 1.0),
            ([r, g, b, a], true) => Self::new(r / 255.0, g / 255.0, b / 255.0, *a),
            _ => return None,
        };
        Some(color.clamped())
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

        let [r, g, b, a] = match hex.len() {
            3 => [nibble(0)?, nibble(1)?, nibble(2)?, 255],
            4 => [nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?],
            6 => [byte(0)?, byte(2)?, byte(4)?, 255],
            8 => [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
            _ => return None,
        };

        Some(Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        ))
    }

    fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    /// Clear colour for the surface texture.
    #[must_use]
    pub const fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }
}
