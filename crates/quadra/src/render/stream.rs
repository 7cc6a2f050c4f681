//! # Stream — The wgpu Backend for Sprite Streaming
//!
//! [`WgpuStreamDevice`] implements [`StreamDevice`] on top of an open
//! `wgpu::RenderPass`. The pipeline's buffer operations map onto wgpu like
//! this:
//!
//! ```text
//!  StreamDevice            wgpu
//!  ────────────            ────
//!  allocate(target, n)  →  device.create_buffer(n); old buffer dropped
//!  map_write(range)     →  hand out a CPU staging slice for the range
//!  unmap(target)        →  queue.write_buffer(range, staging)
//!  bind_buffers         →  pass.set_vertex_buffer / set_index_buffer
//!  draw_indexed         →  pass.draw_indexed(first..first + count)
//!  set_blend            →  pass.set_pipeline(cached for blend state)
//!  set_projection       →  queue.write_buffer(next projection slot)
//!                          + pass.set_bind_group(0, slot offset)
//!  bind_sampler(0, t)   →  pass.set_bind_group(1, texture t)
//! ```
//!
//! ## Why the Ring Works With `write_buffer`
//!
//! `Queue::write_buffer` is applied when the queue is next submitted, before
//! any of that submission's commands run. Two writes to the same range in
//! one submission would therefore both land before the first draw reads it.
//! The ring never does that: every write goes past the previous one, and
//! once the end is reached the buffer is replaced instead of reused. Dropping
//! the old `wgpu::Buffer` is safe while draws still reference it; wgpu keeps
//! it alive until the GPU is done.
//!
//! The projection uniform follows the same rule: each upload goes to its own
//! slot and group 0 is rebound at that slot's dynamic offset, so a viewport
//! change in the middle of a frame leaves earlier draws on the old matrix.

use crate::math::Mat4;
use crate::sprite::{BlendState, BufferTarget, IndexFormat, SpriteEffect, StreamDevice};

use super::pipeline::SpritePipeline;
use super::texture::TextureStore;

#[derive(Default)]
struct Staging {
    offset: u64,
    bytes: Vec<u8>,
    mapped: bool,
}

/// The vertex and index buffers the sprite effect streams into, plus the
/// CPU staging space for mapped ranges. Lives across frames.
pub struct StreamBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    vertex_staging: Staging,
    index_staging: Staging,
}

impl StreamBuffers {
    /// Allocate buffers at the sizes `effect` needs.
    pub fn new(device: &wgpu::Device, effect: &SpriteEffect) -> Self {
        Self {
            vertex: create_buffer(device, BufferTarget::Vertex, effect.vertex_buffer_size()),
            index: create_buffer(device, BufferTarget::Index, effect.index_buffer_size()),
            vertex_staging: Staging::default(),
            index_staging: Staging::default(),
        }
    }

    fn buffer(&self, target: BufferTarget) -> &wgpu::Buffer {
        match target {
            BufferTarget::Vertex => &self.vertex,
            BufferTarget::Index => &self.index,
        }
    }

    fn staging_mut(&mut self, target: BufferTarget) -> &mut Staging {
        match target {
            BufferTarget::Vertex => &mut self.vertex_staging,
            BufferTarget::Index => &mut self.index_staging,
        }
    }
}

fn create_buffer(device: &wgpu::Device, target: BufferTarget, size: u64) -> wgpu::Buffer {
    let (label, usage) = match target {
        BufferTarget::Vertex => ("sprite vertex stream", wgpu::BufferUsages::VERTEX),
        BufferTarget::Index => ("sprite index stream", wgpu::BufferUsages::INDEX),
    };
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// A [`StreamDevice`] recording into one wgpu render pass.
pub struct WgpuStreamDevice<'a, 'p> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    pipeline: &'a mut SpritePipeline,
    textures: &'a TextureStore,
    buffers: &'a mut StreamBuffers,
    pass: &'a mut wgpu::RenderPass<'p>,
    /// Set when a buffer was replaced after it was bound.
    rebind: bool,
}

impl<'a, 'p> WgpuStreamDevice<'a, 'p> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        pipeline: &'a mut SpritePipeline,
        textures: &'a TextureStore,
        buffers: &'a mut StreamBuffers,
        pass: &'a mut wgpu::RenderPass<'p>,
    ) -> Self {
        Self {
            device,
            queue,
            pipeline,
            textures,
            buffers,
            pass,
            rebind: false,
        }
    }
}

impl StreamDevice for WgpuStreamDevice<'_, '_> {
    fn allocate(&mut self, target: BufferTarget, size: u64) {
        let buffer = create_buffer(self.device, target, size);
        match target {
            BufferTarget::Vertex => self.buffers.vertex = buffer,
            BufferTarget::Index => self.buffers.index = buffer,
        }
        self.rebind = true;
    }

    fn map_write(&mut self, target: BufferTarget, offset: u64, size: u64) -> Option<&mut [u8]> {
        let capacity = self.buffers.buffer(target).size();
        if size == 0
            || offset % wgpu::COPY_BUFFER_ALIGNMENT != 0
            || size % wgpu::COPY_BUFFER_ALIGNMENT != 0
            || offset.checked_add(size)? > capacity
        {
            return None;
        }
        let staging = self.buffers.staging_mut(target);
        staging.offset = offset;
        staging.mapped = true;
        staging.bytes.clear();
        staging.bytes.resize(size as usize, 0);
        Some(staging.bytes.as_mut_slice())
    }

    fn unmap(&mut self, target: BufferTarget) {
        let buffers = &mut *self.buffers;
        let (buffer, staging) = match target {
            BufferTarget::Vertex => (&buffers.vertex, &mut buffers.vertex_staging),
            BufferTarget::Index => (&buffers.index, &mut buffers.index_staging),
        };
        if !std::mem::take(&mut staging.mapped) {
            log::warn!("unmap of {target:?} buffer without a mapped range");
            return;
        }
        self.queue.write_buffer(buffer, staging.offset, &staging.bytes);
    }

    fn bind_buffers(&mut self, format: IndexFormat) {
        self.pass.set_vertex_buffer(0, self.buffers.vertex.slice(..));
        self.pass.set_index_buffer(self.buffers.index.slice(..), format.to_wgpu());
        self.pass
            .set_bind_group(0, &self.pipeline.projection_bind_group, &[self.pipeline.projection_offset()]);
        self.rebind = false;
    }

    fn draw_indexed(&mut self, format: IndexFormat, first_index: u32, index_count: u32) {
        if self.rebind {
            self.bind_buffers(format);
        }
        self.pass.draw_indexed(first_index..first_index + index_count, 0, 0..1);
    }

    fn set_projection(&mut self, projection: &Mat4) {
        let offset = self.pipeline.write_projection(self.device, self.queue, projection);
        self.pass.set_bind_group(0, &self.pipeline.projection_bind_group, &[offset]);
    }

    fn set_blend(&mut self, state: &BlendState) {
        let pipeline = self.pipeline.get_or_build(self.device, state.pipeline_key());
        self.pass.set_pipeline(pipeline);
        self.pass.set_blend_constant(state.constant_color());
    }

    fn bind_sampler(&mut self, unit: u32, texture: u32) {
        let bind_group = match self.textures.bind_group(texture) {
            Some(group) => group,
            None => {
                log::warn!("render state {texture} is not a loaded texture; drawing white");
                match self.textures.bind_group(0) {
                    Some(group) => group,
                    None => return,
                }
            }
        };
        self.pass.set_bind_group(1 + unit, bind_group, &[]);
    }
}
