//! A [`StreamDevice`] that never touches a GPU.
//!
//! [`HeadlessDevice`] keeps the streamed bytes in plain vectors and records
//! every command it receives. When a draw is issued it resolves the index
//! range against the current buffer contents, so callers can check exactly
//! which quads reached the screen even after the buffers have been orphaned.
//!
//! Mapping follows the rules a real backend enforces: the range must be
//! non-empty, inside the buffer, and 4-byte aligned. Failures can also be
//! injected with [`HeadlessDevice::fail_next_maps`].

use crate::math::Mat4;

use super::blend::BlendState;
use super::device::{BufferTarget, StreamDevice};
use super::effect::SpriteEffect;
use super::vertex::{IndexFormat, SpriteVertex, VERTEX_SIZE};

/// Alignment required of mapped offsets and sizes.
pub const MAP_ALIGNMENT: u64 = 4;

/// One recorded device call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Allocate { target: BufferTarget, size: u64 },
    BindBuffers(IndexFormat),
    Draw { first_index: u32, index_count: u32 },
    SetProjection(Mat4),
    SetBlend(BlendState),
    BindSampler { unit: u32, texture: u32 },
}

/// CPU-side stand-in for the GPU streaming buffers.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    vertex: Vec<u8>,
    index: Vec<u8>,
    commands: Vec<Command>,
    drawn: Vec<[SpriteVertex; 4]>,
    fail_maps: usize,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device with both buffers allocated at the sizes `effect` needs.
    pub fn for_effect(effect: &SpriteEffect) -> Self {
        let mut device = Self::new();
        device.allocate(BufferTarget::Vertex, effect.vertex_buffer_size());
        device.allocate(BufferTarget::Index, effect.index_buffer_size());
        device
    }

    /// Make the next `n` calls to `map_write` fail.
    pub fn fail_next_maps(&mut self, n: usize) {
        self.fail_maps = n;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
        self.drawn.clear();
    }

    /// Number of buffer allocations so far, both targets.
    pub fn allocations(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Allocate { .. }))
            .count()
    }

    /// `(first_index, index_count)` of every draw, in order.
    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                Command::Draw { first_index, index_count } => Some((first_index, index_count)),
                _ => None,
            })
            .collect()
    }

    /// The four vertices of every quad drawn so far, in draw order.
    pub fn drawn_quads(&self) -> Vec<[SpriteVertex; 4]> {
        self.drawn.clone()
    }

    /// Current vertex buffer contents.
    pub fn vertices(&self) -> Vec<SpriteVertex> {
        self.vertex
            .chunks_exact(VERTEX_SIZE)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    /// Current index buffer contents, widened to `u32`.
    pub fn indices(&self, format: IndexFormat) -> Vec<u32> {
        match format {
            IndexFormat::U16 => self
                .index
                .chunks_exact(2)
                .map(|c| u32::from(bytemuck::pod_read_unaligned::<u16>(c)))
                .collect(),
            IndexFormat::U32 => self
                .index
                .chunks_exact(4)
                .map(bytemuck::pod_read_unaligned::<u32>)
                .collect(),
        }
    }

    fn buffer_mut(&mut self, target: BufferTarget) -> &mut Vec<u8> {
        match target {
            BufferTarget::Vertex => &mut self.vertex,
            BufferTarget::Index => &mut self.index,
        }
    }

    /// Resolve a drawn index range into quads. Each quad's six indices
    /// start `b+1, b`, so the second one names its first vertex.
    fn resolve(&mut self, format: IndexFormat, first_index: u32, index_count: u32) {
        let width = format.size();
        let start = first_index as usize * width;
        let Some(range) = self.index.get(start..start + index_count as usize * width) else {
            log::warn!("draw reads past the index buffer: {first_index}+{index_count}");
            return;
        };
        for quad in range.chunks_exact(6 * width) {
            let second = &quad[width..2 * width];
            let base = match format {
                IndexFormat::U16 => usize::from(bytemuck::pod_read_unaligned::<u16>(second)),
                IndexFormat::U32 => bytemuck::pod_read_unaligned::<u32>(second) as usize,
            };
            let Some(bytes) = self.vertex.get(base * VERTEX_SIZE..(base + 4) * VERTEX_SIZE) else {
                log::warn!("quad at vertex {base} is outside the vertex buffer");
                continue;
            };
            let mut corners = [SpriteVertex::default(); 4];
            for (corner, chunk) in corners.iter_mut().zip(bytes.chunks_exact(VERTEX_SIZE)) {
                *corner = bytemuck::pod_read_unaligned(chunk);
            }
            self.drawn.push(corners);
        }
    }
}

impl StreamDevice for HeadlessDevice {
    fn allocate(&mut self, target: BufferTarget, size: u64) {
        *self.buffer_mut(target) = vec![0; size as usize];
        self.commands.push(Command::Allocate { target, size });
    }

    fn map_write(&mut self, target: BufferTarget, offset: u64, size: u64) -> Option<&mut [u8]> {
        if self.fail_maps > 0 {
            self.fail_maps -= 1;
            return None;
        }
        if size == 0 || offset % MAP_ALIGNMENT != 0 || size % MAP_ALIGNMENT != 0 {
            return None;
        }
        let buffer = self.buffer_mut(target);
        let end = offset.checked_add(size)?;
        if end > buffer.len() as u64 {
            return None;
        }
        Some(&mut buffer[offset as usize..end as usize])
    }

    fn unmap(&mut self, _target: BufferTarget) {}

    fn bind_buffers(&mut self, format: IndexFormat) {
        self.commands.push(Command::BindBuffers(format));
    }

    fn draw_indexed(&mut self, format: IndexFormat, first_index: u32, index_count: u32) {
        self.commands.push(Command::Draw { first_index, index_count });
        self.resolve(format, first_index, index_count);
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.commands.push(Command::SetProjection(*projection));
    }

    fn set_blend(&mut self, state: &BlendState) {
        self.commands.push(Command::SetBlend(*state));
    }

    fn bind_sampler(&mut self, unit: u32, texture: u32) {
        self.commands.push(Command::BindSampler { unit, texture });
    }
}
