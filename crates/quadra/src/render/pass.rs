//! # Pass — One Frame of Sprites on the GPU
//!
//! [`SpriteBackend`] owns the GPU-side state that outlives a frame: the
//! pipeline cache, the texture store, and the streaming buffers. Each frame
//! [`SpriteBackend::draw`] opens a render pass that clears the target, wraps
//! it in a [`WgpuStreamDevice`], and hands game code a [`SpriteFrame`]:
//!
//! ```text
//!  encoder ──begin_render_pass(clear)──► pass
//!                                         │
//!            WgpuStreamDevice { pipeline, textures, buffers, pass }
//!                                         │
//!            SpriteFrame { renderer, device, SamplerHooks }
//!                                         │
//!                 game draw code ── add / set_blend_mode / flush
//!                                         │
//!                                      finish() ── final flush
//! ```
//!
//! Submission and presentation are left to the caller, which owns the
//! encoder and the surface texture.

use std::path::Path;

use crate::error::Result;
use crate::sprite::{SamplerHooks, SpriteFrame, SpriteRenderer};

use super::pipeline::SpritePipeline;
use super::stream::{StreamBuffers, WgpuStreamDevice};
use super::texture::{TextureInfo, TextureStore};

/// Background color each frame starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor(pub [f64; 4]);

impl ClearColor {
    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b, a] = self.0;
        wgpu::Color { r, g, b, a }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self([0.0, 0.0, 0.0, 1.0])
    }
}

/// GPU resources for drawing sprites into one kind of target.
pub struct SpriteBackend {
    pipeline: SpritePipeline,
    textures: TextureStore,
    buffers: StreamBuffers,
    /// Viewport the renderer's projection was last set for.
    viewport: Option<(u32, u32)>,
}

impl SpriteBackend {
    /// Build the pipeline, the white default texture, and streaming buffers
    /// sized for `renderer`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        renderer: &SpriteRenderer,
    ) -> Self {
        let pipeline = SpritePipeline::new(device, target_format);
        let textures = TextureStore::new(device, queue, &pipeline);
        let buffers = StreamBuffers::new(device, renderer.effect());
        Self {
            pipeline,
            textures,
            buffers,
            viewport: None,
        }
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn pipeline(&self) -> &SpritePipeline {
        &self.pipeline
    }

    pub fn load_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
    ) -> Result<TextureInfo> {
        self.textures.load(device, queue, &self.pipeline, path)
    }

    pub fn create_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureInfo> {
        self.textures
            .create_from_rgba(device, queue, &self.pipeline, label, width, height, rgba)
    }

    /// Clear `view` and let `draw` queue sprites into it. Anything still
    /// queued when `draw` returns is flushed before the pass ends.
    ///
    /// `size` is the target's size in pixels; the projection follows it.
    #[allow(clippy::too_many_arguments)]
    pub fn draw<R>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: ClearColor,
        size: (u32, u32),
        renderer: &mut SpriteRenderer,
        draw: impl FnOnce(&mut SpriteFrame<'_>) -> R,
    ) -> R {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let mut stream = WgpuStreamDevice::new(
            device,
            queue,
            &mut self.pipeline,
            &self.textures,
            &mut self.buffers,
            &mut pass,
        );
        let mut hooks = SamplerHooks;
        let mut frame = SpriteFrame::new(renderer, &mut stream, &mut hooks);

        if self.viewport != Some(size) {
            frame.set_viewport(size.0, size.1);
            self.viewport = Some(size);
        }

        let out = draw(&mut frame);
        frame.finish();
        out
    }
}
