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

//! Built-in style documents.

use std::fs;
use std::io;
use std::path::Path;

/// OSM Bright, cut down to background, water and roads
pub const BRIGHT: &str = r##"{
    "version": 8,
    "name": "OSM Bright",
    "sources": {
        "openmaptiles": {
            "type": "vector",
            "url": "https://tile.openstreetmap.jp/data/planet.json"
        }
    },
    "layers": [
        {
            "id": "background",
            "type": "background",
            "paint": { "background-color": "#f8f4f0" }
        },
        {
            "id": "water",
            "type": "fill",
            "source": "openmaptiles",
            "source-layer": "water",
            "paint": { "fill-color": "#73b6e6" }
        },
        {
            "id": "transportation",
            "type": "line",
            "source": "openmaptiles",
            "source-layer": "transportation",
            "paint": { "line-color": "#fea", "line-width": 2 }
        }
    ]
}"##;

/// Dark background for night viewing
pub const DARK: &str = r##"{
    "version": 8,
    "name": "Dark",
    "sources": {},
    "layers": [
        {
            "id": "background",
            "type": "background",
            "paint": { "background-color": "#1a1d23" }
        }
    ]
}"##;

/// Built-in styles offered in the viewer, by display name
pub const BUILT_IN: &[(&str, &str)] = &[("OSM Bright", BRIGHT), ("Dark", DARK)];

/// Read a style document from disk, or fall back to the default style
pub fn load(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => Ok(BRIGHT.to_owned()),
    }
}
