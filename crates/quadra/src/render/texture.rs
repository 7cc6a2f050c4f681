//! # Texture — Image Data on the GPU
//!
//! Textures are uploaded once and referred to by [`TextureHandle`], a plain
//! `u32`. The handle doubles as the sprite render state: sprites cut from
//! the same texture carry the same handle, sort next to each other, and
//! share a draw call.
//!
//! ```text
//! TextureStore
//! ┌───────────────────────────────────────────────┐
//! │ entries: Vec<TextureEntry>                    │
//! │   [0] 1x1 white (default)   ◄── always here   │
//! │   [1] "ship.png"                              │
//! │   [2] "atlas" (packed at runtime)             │
//! │   ...                                         │
//! │                                               │
//! │ path_cache: HashMap<PathBuf, TextureHandle>   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Entry 0 is a single white texel. Sprites drawn from it come out as solid
//! rectangles in their tint color.
//!
//! Pixel rows are uploaded top row first, which is the top-left-origin
//! space source rectangles are given in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use wgpu::util::DeviceExt;

use crate::error::{Error, Result};
use crate::sprite::TextureSource;

use super::pipeline::SpritePipeline;

/// Index of a texture in the [`TextureStore`]. Also the render state of
/// every sprite drawn from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// What sprites need to know about an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl TextureSource for TextureInfo {
    fn render_state(&self) -> u32 {
        self.handle.0
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

struct TextureEntry {
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// Every texture uploaded so far, with the bind groups that sample them.
pub struct TextureStore {
    entries: Vec<TextureEntry>,
    path_cache: HashMap<PathBuf, TextureHandle>,
}

impl TextureStore {
    /// A store holding only the 1x1 white texture at handle 0.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, pipeline: &SpritePipeline) -> Self {
        let mut store = Self {
            entries: Vec::new(),
            path_cache: HashMap::new(),
        };
        store.upload(device, queue, pipeline, "white 1x1", 1, 1, &[255, 255, 255, 255]);
        store
    }

    /// The 1x1 white texture.
    pub fn white(&self) -> TextureInfo {
        TextureInfo {
            handle: TextureHandle(0),
            width: 1,
            height: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn info(&self, handle: TextureHandle) -> Option<TextureInfo> {
        self.entries.get(handle.0 as usize).map(|e| TextureInfo {
            handle,
            width: e.width,
            height: e.height,
        })
    }

    /// Bind group for the texture whose handle is `render_state`.
    pub fn bind_group(&self, render_state: u32) -> Option<&wgpu::BindGroup> {
        self.entries.get(render_state as usize).map(|e| &e.bind_group)
    }

    /// Upload tightly packed RGBA8 pixels, top row first.
    pub fn create_from_rgba(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &SpritePipeline,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<TextureInfo> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(Error::Texture(format!(
                "'{label}': {width}x{height} needs {expected} bytes of RGBA8, got {}",
                data.len()
            )));
        }
        Ok(self.upload(device, queue, pipeline, label, width, height, data))
    }

    /// Decode an image file and upload it. Loading the same path twice
    /// returns the first upload.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &SpritePipeline,
        path: impl AsRef<Path>,
    ) -> Result<TextureInfo> {
        let path = path.as_ref();
        if let Some(info) = self.path_cache.get(path).and_then(|&h| self.info(h)) {
            return Ok(info);
        }

        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        let label = path.display().to_string();
        let info = self.create_from_rgba(device, queue, pipeline, &label, width, height, img.as_raw())?;
        self.path_cache.insert(path.to_path_buf(), info.handle);
        log::info!("loaded texture {label} ({width}x{height}) as {:?}", info.handle);
        Ok(info)
    }

    fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &SpritePipeline,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> TextureInfo {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &pipeline.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&pipeline.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.entries.len() as u32);
        self.entries.push(TextureEntry {
            bind_group,
            width,
            height,
        });
        TextureInfo { handle, width, height }
    }
}
