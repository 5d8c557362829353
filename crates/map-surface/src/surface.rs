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

//! Offscreen colour target.
//!
//! A surface is a single RGBA8 texture plus the view the engine renders
//! into. It is allocated once with a fixed size and never resized.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;

use log::{debug, warn};

use crate::engine::{RenderTarget, Size};
use crate::error::MapError;
use crate::gpu::GpuContext;

static NEXT_TEXTURE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique handle for a surface texture. Zero means "no texture".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

impl TextureId {
    pub const NONE: Self = Self(0);

    fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// GPU texture and attachment view of a fixed size.
#[derive(Debug)]
pub struct OffscreenSurface {
    gpu: GpuContext,
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    id: TextureId,
    complete: bool,
}

impl OffscreenSurface {
    /// Colour format of every surface texture.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Allocate a surface of `width` x `height` pixels.
    ///
    /// Returns `None` for a zero-sized request. A texture the device rejects
    /// (e.g. larger than its limits) is reported as incomplete with a warning
    /// but still returned.
    #[must_use]
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            warn!("Refusing to allocate a {width}x{height} offscreen surface");
            return None;
        }

        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Map Surface Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Map Surface Attachment"),
            ..Default::default()
        });

        // Error scopes resolve synchronously on native backends
        let complete = match pollster::block_on(gpu.device.pop_error_scope()) {
            Some(error) => {
                warn!("Offscreen surface is not complete: {error}");
                false
            }
            None => true,
        };

        let id = TextureId::next();
        debug!("Allocated offscreen surface {id} ({width}x{height})");

        Some(Self {
            gpu: gpu.clone(),
            width,
            height,
            texture,
            view,
            id,
            complete,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn id(&self) -> TextureId {
        self.id
    }

    #[must_use]
    pub const fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[must_use]
    pub const fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Whether the device accepted the texture.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub const fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Borrow the surface as an engine render target.
    #[must_use]
    pub fn render_target(&self) -> RenderTarget<'_> {
        RenderTarget {
            device: &self.gpu.device,
            queue: &self.gpu.queue,
            texture: &self.texture,
            view: &self.view,
            size: Size {
                width: self.width,
                height: self.height,
            },
        }
    }

    /// Copy the texture back to the CPU as tightly packed RGBA8 rows.
    pub fn read_pixels(&self) -> Result<Vec<u8>, MapError> {
        if !self.complete {
            return Err(MapError::Readback(format!(
                "surface {} was rejected by the device",
                self.id
            )));
        }

        let overflow = || MapError::Readback(format!("row of {} pixels overflows", self.width));
        let row_bytes = self.width.checked_mul(4).ok_or_else(overflow)?;
        let padded_row_bytes = row_bytes
            .checked_next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            .ok_or_else(overflow)?;
        let size = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        };

        self.gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Map Surface Readback"),
            size: u64::from(padded_row_bytes) * u64::from(self.height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Map Surface Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            self.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: None,
                },
            },
            size,
        );
        self.gpu.queue.submit([encoder.finish()]);

        if let Some(error) = pollster::block_on(self.gpu.device.pop_error_scope()) {
            warn!("Readback of surface {} rejected by the device: {error}", self.id);
            return Err(MapError::Readback(error.to_string()));
        }

        let slice = buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // Receiver outlives the poll below
            let _ = sender.send(result);
        });
        self.gpu
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| MapError::Readback(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| MapError::Readback(e.to_string()))?
            .map_err(|e| MapError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(row_bytes as usize * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * padded_row_bytes as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes as usize]);
        }
        drop(data);
        buffer.unmap();

        Ok(pixels)
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        if self.complete {
            self.texture.destroy();
        }
        debug!("Released offscreen surface {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_id_none() {
        assert!(TextureId::NONE.is_none());
        assert_eq!(TextureId::default(), TextureId::NONE);
        assert_eq!(TextureId::NONE.get(), 0);
    }

    #[test]
    fn test_texture_ids_are_unique() {
        let a = TextureId::next();
        let b = TextureId::next();
        assert_ne!(a, b);
        assert!(!a.is_none());
        assert!(!b.is_none());
    }

    #[test]
    fn test_zero_sized_surface_is_absent() {
        let Some(gpu) = GpuContext::headless() else {
            return;
        };
        assert!(OffscreenSurface::new(&gpu, 0, 64).is_none());
        assert!(OffscreenSurface::new(&gpu, 64, 0).is_none());
    }

    #[test]
    fn test_surface_dimensions() {
        let Some(gpu) = GpuContext::headless() else {
            return;
        };
        let surface = OffscreenSurface::new(&gpu, 320, 200).unwrap();
        assert_eq!(surface.width(), 320);
        assert_eq!(surface.height(), 200);
        assert_eq!(surface.texture().width(), 320);
        assert_eq!(surface.texture().height(), 200);
        assert!(!surface.id().is_none());
    }

    #[test]
    fn test_read_pixels_strips_row_padding() {
        let Some(gpu) = GpuContext::headless() else {
            return;
        };
        // 100 * 4 bytes per row is not a multiple of the copy alignment
        let surface = OffscreenSurface::new(&gpu, 100, 3).unwrap();
        let pixels = surface.read_pixels().unwrap();
        assert_eq!(pixels.len(), 100 * 3 * 4);
        // New textures are zero initialised
        assert!(pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rejected_surface_fails_readback() {
        let Some(gpu) = GpuContext::headless() else {
            return;
        };
        let too_wide = gpu.device.limits().max_texture_dimension_2d + 1;
        let surface = OffscreenSurface::new(&gpu, too_wide, 4).unwrap();
        assert!(!surface.is_complete());
        assert!(!surface.id().is_none());
        assert!(matches!(surface.read_pixels(), Err(MapError::Readback(_))));
    }
}
