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

use thiserror::Error;

/// Errors reported by a map engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid style document: {0}")]
    Style(String),

    #[error("no style has been loaded")]
    NoStyle,

    #[error("render target is {actual:?} but the map is {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("GPU error: {0}")]
    Gpu(String),
}

/// Errors surfaced by the map handle.
///
/// Style loading and rendering are kept apart so callers can tell a bad
/// document from a failed frame.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to load style: {0}")]
    StyleParse(#[source] EngineError),

    #[error("failed to render frame: {0}")]
    Render(#[source] EngineError),

    #[error("map engine is not available")]
    NoEngine,

    #[error("offscreen surface is not available")]
    NoSurface,

    #[error("failed to read back surface: {0}")]
    Readback(String),
}
