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

//! GPU device handles used by the offscreen surface.

use log::{info, warn};

/// A wgpu device and the queue that submits to it.
///
/// Both handles are reference counted by wgpu, so cloning a context shares
/// the same device rather than opening a new one.
#[derive(Debug, Clone)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Wrap an existing device, for example the one owned by a windowing toolkit.
    #[must_use]
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Open a device with no presentation surface.
    ///
    /// Returns `None` when no adapter is available (e.g. CI machines without
    /// a GPU or software rasterizer).
    #[must_use]
    pub fn headless() -> Option<Self> {
        pollster::block_on(Self::request_headless())
    }

    async fn request_headless() -> Option<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                warn!("No compatible GPU adapter found: {e}");
                return None;
            }
        };

        let adapter_info = adapter.get_info();
        info!(
            "Using GPU adapter {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        match adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Map Surface Device"),
                ..Default::default()
            })
            .await
        {
            Ok((device, queue)) => Some(Self { device, queue }),
            Err(e) => {
                warn!("Failed to open GPU device: {e}");
                None
            }
        }
    }
}
