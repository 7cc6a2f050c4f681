//! The GPU primitives the sprite pipeline consumes.
//!
//! [`StreamDevice`] is the one seam between the pipeline and a graphics
//! backend. The pipeline streams bytes into two buffers and issues indexed
//! draws; everything else (pipelines, shaders, textures) stays behind the
//! implementation.
//!
//! Two implementations ship with the crate:
//! - [`WgpuStreamDevice`](crate::render::stream::WgpuStreamDevice) records
//!   into a wgpu render pass.
//! - [`HeadlessDevice`](super::headless::HeadlessDevice) keeps everything on
//!   the CPU, for tests and benchmarks.

use crate::math::Mat4;

use super::blend::BlendState;
use super::vertex::IndexFormat;

/// Which of the two streaming buffers an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// GPU operations used by [`SpriteEffect`](super::effect::SpriteEffect).
///
/// Implementations are driven from the thread that owns the GPU context and
/// are always borrowed exclusively.
pub trait StreamDevice {
    /// Give `target` fresh storage of `size` bytes. Contents written before
    /// the call stay visible to draws already issued, never to later ones.
    fn allocate(&mut self, target: BufferTarget, size: u64);

    /// Map `size` bytes at `offset` for writing. Previous contents of the
    /// range are undefined. Returns `None` if the range cannot be mapped;
    /// the caller skips the write.
    fn map_write(&mut self, target: BufferTarget, offset: u64, size: u64) -> Option<&mut [u8]>;

    /// Commit the range returned by the last `map_write` on `target`.
    fn unmap(&mut self, target: BufferTarget);

    /// Bind the current vertex and index buffers for drawing.
    fn bind_buffers(&mut self, format: IndexFormat);

    /// Draw `index_count` indices starting at `first_index` as triangles.
    fn draw_indexed(&mut self, format: IndexFormat, first_index: u32, index_count: u32);

    /// Set the projection matrix uniform.
    fn set_projection(&mut self, projection: &Mat4);

    /// Set the blend state for following draws.
    fn set_blend(&mut self, state: &BlendState);

    /// Bind `texture` to sampler `unit`.
    fn bind_sampler(&mut self, unit: u32, texture: u32);
}
