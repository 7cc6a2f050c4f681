//! # Effect — Streaming Quads Into a GPU Ring Buffer
//!
//! [`SpriteEffect`] owns the write cursors for one vertex buffer and one
//! index buffer, along with the blend state and projection used to draw
//! from them. Each call to [`SpriteEffect::buffer_data`] writes the next
//! chunk of quads directly behind the previous one:
//!
//! ```text
//!   vertex buffer (capacity = max_quads * 4)
//!   ┌──────────┬──────────┬──────────┬─────────────────────┐
//!   │ frame N  │ frame N  │ frame N+1│       free          │
//!   │ chunk 0  │ chunk 1  │ chunk 0  │                     │
//!   └──────────┴──────────┴──────────┴─────────────────────┘
//!                                    ▲
//!                                    vertex cursor
//! ```
//!
//! When the cursor reaches the end, both buffers are *orphaned*: the device
//! hands out fresh storage and the cursors restart at zero. Draws already
//! issued keep reading the old storage, so the CPU never waits for the GPU
//! to finish with a region before overwriting it.
//!
//! ## Partial Buffering
//!
//! A chunk that does not fit in the remaining space is clamped. The caller
//! draws what was buffered and calls again; the next call finds the buffer
//! full and orphans it. [`draw_batch`](SpriteEffect::draw_batch) runs this
//! loop.
//!
//! ## Failure Handling
//!
//! A mapping the device cannot provide is skipped: nothing is written for
//! that buffer, the cursors still advance, and the frame carries on. The
//! failure is logged and counted in [`FrameStats`]; there is no retry.

use crate::math::{Mat4, ortho_projection};

use super::blend::{BlendMode, BlendState};
use super::device::{BufferTarget, StreamDevice};
use super::quad::Quad;
use super::vertex::{IndexFormat, VERTEX_SIZE, write_quad_indices, write_quad_vertices};

/// Counters for one frame of sprite drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameStats {
    /// Sprites handed to the batch.
    pub sprites: u64,
    /// Quads written into the GPU buffers.
    pub quads_buffered: u64,
    /// Indexed draw calls issued.
    pub draw_calls: u64,
    /// Render-state changes applied.
    pub state_changes: u64,
    /// Times both buffers were given fresh storage.
    pub orphans: u64,
    /// `buffer_data` calls that could not fit the whole request.
    pub partial_buffers: u64,
    /// Buffer mappings the device refused.
    pub map_failures: u64,
    pub vertex_bytes: u64,
    pub index_bytes: u64,
}

impl FrameStats {
    /// Add another frame's counters to these.
    pub fn accumulate(&mut self, other: &FrameStats) {
        self.sprites += other.sprites;
        self.quads_buffered += other.quads_buffered;
        self.draw_calls += other.draw_calls;
        self.state_changes += other.state_changes;
        self.orphans += other.orphans;
        self.partial_buffers += other.partial_buffers;
        self.map_failures += other.map_failures;
        self.vertex_bytes += other.vertex_bytes;
        self.index_bytes += other.index_bytes;
    }
}

/// Where the effect is in its draw cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawPhase {
    /// Outside `draw_batch`.
    #[default]
    NotDrawing,
    /// Writing a chunk into the buffers.
    Buffering,
    /// Issuing draws for the chunk just written.
    DrawingRun,
}

/// Result of one [`SpriteEffect::buffer_data`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffered {
    /// Quads written. Zero only when the request was empty.
    pub count: usize,
    /// Index-buffer position of the first index written.
    pub base_index: u32,
}

/// Write cursor over one streaming buffer, in elements.
#[derive(Debug, Clone, Copy)]
struct Ring {
    capacity: usize,
    offset: usize,
    element_size: usize,
}

impl Ring {
    fn byte_size(&self) -> u64 {
        (self.capacity * self.element_size) as u64
    }
}

/// GPU-side state for streaming and drawing sprite batches.
#[derive(Debug)]
pub struct SpriteEffect {
    vertices: Ring,
    indices: Ring,
    index_format: IndexFormat,
    blend: BlendState,
    projection: Mat4,
    pub(super) current_state: Option<u32>,
    pub(super) phase: DrawPhase,
    pub(super) stats: FrameStats,
}

impl SpriteEffect {
    /// Create an effect whose buffers hold `max_quads` quads.
    ///
    /// With [`IndexFormat::U16`] every vertex must be addressable by a 16-bit
    /// index, so `max_quads` is at most 16384.
    /// [`RendererConfig::validate`](crate::config::RendererConfig::validate)
    /// rejects larger values before they get here.
    pub fn new(max_quads: usize, index_format: IndexFormat) -> Self {
        debug_assert!(max_quads > 0, "sprite effect needs room for at least one quad");
        debug_assert!(
            max_quads * 4 <= index_format.max_vertices(),
            "{max_quads} quads overflow {index_format:?} indices"
        );
        let effect = Self {
            vertices: Ring {
                capacity: max_quads * 4,
                offset: 0,
                element_size: VERTEX_SIZE,
            },
            indices: Ring {
                capacity: max_quads * 6,
                offset: 0,
                element_size: index_format.size(),
            },
            index_format,
            blend: BlendMode::None.state(),
            projection: Mat4::IDENTITY,
            current_state: None,
            phase: DrawPhase::NotDrawing,
            stats: FrameStats::default(),
        };
        log::debug!(
            "sprite effect created: {max_quads} quads, {} vertex bytes, {} index bytes ({index_format:?})",
            effect.vertex_buffer_size(),
            effect.index_buffer_size(),
        );
        effect
    }

    /// Size the vertex buffer storage must have, in bytes.
    pub fn vertex_buffer_size(&self) -> u64 {
        self.vertices.byte_size()
    }

    /// Size the index buffer storage must have, in bytes.
    pub fn index_buffer_size(&self) -> u64 {
        self.indices.byte_size()
    }

    /// Quads the buffers hold before they are orphaned.
    pub fn max_quads(&self) -> usize {
        self.vertices.capacity / 4
    }

    /// Vertex write cursor, in vertices.
    pub fn vertex_offset(&self) -> usize {
        self.vertices.offset
    }

    /// Index write cursor, in indices.
    pub fn index_offset(&self) -> usize {
        self.indices.offset
    }

    pub fn index_format(&self) -> IndexFormat {
        self.index_format
    }

    pub fn blend_state(&self) -> &BlendState {
        &self.blend
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Render state of the last applied run, `None` before the first.
    pub fn current_state(&self) -> Option<u32> {
        self.current_state
    }

    pub fn phase(&self) -> DrawPhase {
        self.phase
    }

    /// Counters collected since the last call; resets them.
    pub fn take_stats(&mut self) -> FrameStats {
        std::mem::take(&mut self.stats)
    }

    /// Load one of the blend presets. Takes effect at the next
    /// [`apply_blend_state`](Self::apply_blend_state).
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode.state();
    }

    pub fn set_blend_state(&mut self, state: BlendState) {
        self.blend = state;
    }

    /// Rebuild the projection for a `width` x `height` pixel viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.projection = ortho_projection(width, height);
    }

    pub fn bind_buffers(&self, device: &mut dyn StreamDevice) {
        device.bind_buffers(self.index_format);
    }

    pub fn apply_blend_state(&self, device: &mut dyn StreamDevice) {
        device.set_blend(&self.blend);
    }

    pub fn apply_projection(&self, device: &mut dyn StreamDevice) {
        device.set_projection(&self.projection);
    }

    /// Write vertices and indices for up to `count` quads, read through
    /// `order[offset..]`, at the current cursors.
    ///
    /// Orphans both buffers first if they are full. Returns how many quads
    /// fit and where their indices start; fewer than `count` means the
    /// buffers are now full and the caller should draw and call again.
    pub fn buffer_data(
        &mut self,
        device: &mut dyn StreamDevice,
        quads: &[Quad],
        order: &[u32],
        offset: usize,
        count: usize,
    ) -> Buffered {
        self.phase = DrawPhase::Buffering;

        if self.vertices.offset == self.vertices.capacity {
            self.orphan(device);
        }

        let base_vertex = self.vertices.offset;
        let base_index = self.indices.offset;
        let room = (self.vertices.capacity - base_vertex) / 4;
        let n = count.min(room);
        if n < count {
            self.stats.partial_buffers += 1;
        }
        if n == 0 {
            return Buffered {
                count: 0,
                base_index: base_index as u32,
            };
        }

        let v_offset = (base_vertex * self.vertices.element_size) as u64;
        let v_size = (n * 4 * self.vertices.element_size) as u64;
        match device.map_write(BufferTarget::Vertex, v_offset, v_size) {
            Some(out) => {
                write_quad_vertices(out, quads, order, offset, n);
                device.unmap(BufferTarget::Vertex);
                self.stats.vertex_bytes += v_size;
            }
            None => {
                log::warn!("vertex buffer map failed ({v_size} bytes at {v_offset}); skipping {n} quads");
                self.stats.map_failures += 1;
            }
        }

        let i_offset = (base_index * self.indices.element_size) as u64;
        let i_size = (n * 6 * self.indices.element_size) as u64;
        match device.map_write(BufferTarget::Index, i_offset, i_size) {
            Some(out) => {
                write_quad_indices(out, self.index_format, base_vertex as u32, n);
                device.unmap(BufferTarget::Index);
                self.stats.index_bytes += i_size;
            }
            None => {
                log::warn!("index buffer map failed ({i_size} bytes at {i_offset}); skipping {n} quads");
                self.stats.map_failures += 1;
            }
        }

        self.vertices.offset += n * 4;
        self.indices.offset += n * 6;
        self.stats.quads_buffered += n as u64;

        Buffered {
            count: n,
            base_index: base_index as u32,
        }
    }

    /// Drop both buffers' storage in favor of fresh allocations and restart
    /// the cursors.
    fn orphan(&mut self, device: &mut dyn StreamDevice) {
        self.vertices.offset = 0;
        self.indices.offset = 0;
        device.allocate(BufferTarget::Vertex, self.vertices.byte_size());
        device.allocate(BufferTarget::Index, self.indices.byte_size());
        self.stats.orphans += 1;
        log::debug!("sprite buffers orphaned after {} quads", self.max_quads());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TexelRect;
    use crate::sprite::headless::HeadlessDevice;
    use crate::sprite::{Sprite, SpriteBatch};

    fn batch_of(n: usize) -> SpriteBatch {
        let sprites: Vec<Sprite> = (0..n)
            .map(|i| Sprite {
                source: TexelRect::full(4, 4),
                texture_width: 4,
                texture_height: 4,
                render_state: i as u32,
                ..Sprite::default()
            }
            .at(i as f32, 0.0))
            .collect();
        let mut batch = SpriteBatch::default();
        batch.extend(&sprites);
        batch
    }

    #[test]
    fn buffer_sizes_follow_format() {
        let effect = SpriteEffect::new(100, IndexFormat::U16);
        assert_eq!(effect.vertex_buffer_size(), 100 * 4 * 20);
        assert_eq!(effect.index_buffer_size(), 100 * 6 * 2);
        let effect = SpriteEffect::new(100, IndexFormat::U32);
        assert_eq!(effect.index_buffer_size(), 100 * 6 * 4);
    }

    #[test]
    fn buffers_whole_chunk_when_it_fits() {
        let batch = batch_of(3);
        let mut effect = SpriteEffect::new(8, IndexFormat::U16);
        let mut device = HeadlessDevice::for_effect(&effect);

        let first = effect.buffer_data(&mut device, batch.quads(), batch.order(), 0, 3);
        assert_eq!(first, Buffered { count: 3, base_index: 0 });
        assert_eq!(effect.vertex_offset(), 12);
        assert_eq!(effect.index_offset(), 18);

        let second = effect.buffer_data(&mut device, batch.quads(), batch.order(), 0, 2);
        assert_eq!(second, Buffered { count: 2, base_index: 18 });
        assert_eq!(device.indices(IndexFormat::U16)[18..24], [13, 12, 14, 14, 12, 15]);
    }

    #[test]
    fn partial_buffer_then_orphan() {
        let k = 4;
        let batch = batch_of(k + 5);
        let mut effect = SpriteEffect::new(k, IndexFormat::U16);
        let mut device = HeadlessDevice::for_effect(&effect);

        let first = effect.buffer_data(&mut device, batch.quads(), batch.order(), 0, 3);
        assert_eq!(first.count, 3);

        // Only one quad of room left.
        let second = effect.buffer_data(&mut device, batch.quads(), batch.order(), 3, k + 2);
        assert_eq!(second, Buffered { count: 1, base_index: 18 });
        assert_eq!(effect.vertex_offset(), k * 4);

        // Full: the next call orphans and starts over at zero.
        let third = effect.buffer_data(&mut device, batch.quads(), batch.order(), 4, k + 1);
        assert_eq!(third, Buffered { count: k, base_index: 0 });
        assert_eq!(device.allocations(), 2 + 2);

        let stats = effect.take_stats();
        assert_eq!(stats.orphans, 1);
        assert_eq!(stats.partial_buffers, 2);
        assert_eq!(stats.quads_buffered, 8);
        assert_eq!(effect.take_stats(), FrameStats::default());
    }

    #[test]
    fn overflowing_chunk_fills_then_restarts_at_zero() {
        let k = 6;
        let batch = batch_of(k + 5);
        let mut effect = SpriteEffect::new(k, IndexFormat::U16);
        let mut device = HeadlessDevice::for_effect(&effect);

        let first = effect.buffer_data(&mut device, batch.quads(), batch.order(), 0, k + 5);
        assert_eq!(first, Buffered { count: k, base_index: 0 });
        assert_eq!(effect.vertex_offset(), k * 4);

        let second = effect.buffer_data(&mut device, batch.quads(), batch.order(), k, 5);
        assert_eq!(second, Buffered { count: 5, base_index: 0 });
        assert_eq!(effect.vertex_offset(), 5 * 4);
        assert_eq!(effect.index_offset(), 5 * 6);

        let stats = effect.take_stats();
        assert_eq!(stats.orphans, 1);
        assert_eq!(stats.partial_buffers, 1);
        assert_eq!(stats.quads_buffered, (k + 5) as u64);
    }

    #[test]
    fn map_failure_is_skipped_and_counted() {
        let batch = batch_of(2);
        let mut effect = SpriteEffect::new(4, IndexFormat::U32);
        let mut device = HeadlessDevice::for_effect(&effect);
        device.fail_next_maps(1);

        let got = effect.buffer_data(&mut device, batch.quads(), batch.order(), 0, 2);
        assert_eq!(got.count, 2);
        assert_eq!(effect.vertex_offset(), 8);

        let stats = effect.take_stats();
        assert_eq!(stats.map_failures, 1);
        assert_eq!(stats.vertex_bytes, 0);
        assert_eq!(stats.index_bytes, 12 * 4);
    }

    #[test]
    fn viewport_and_blend_are_stored() {
        let mut effect = SpriteEffect::new(1, IndexFormat::U16);
        assert!(!effect.blend_state().enabled);
        effect.set_blend_mode(BlendMode::Additive);
        assert_eq!(*effect.blend_state(), BlendMode::Additive.state());
        effect.set_viewport(640, 480);
        assert_eq!(*effect.projection(), ortho_projection(640, 480));
    }
}
