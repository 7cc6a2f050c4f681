//! # Vertex — Per-Corner Data Sent to the GPU
//!
//! Each quad expands into four vertices and six indices. The vertex is
//! interleaved and packed so it can be written straight into a mapped
//! buffer range:
//!
//! ```text
//! SpriteVertex (20 bytes per vertex)
//! ┌──────────────────────────────────┬──────────────────┐
//! │ xyuv                             │ tint             │
//! │ [f32; 4]  x, y, u, v             │ u32, r lowest    │
//! │ 16 bytes                         │ 4 bytes          │
//! │ offset 0                         │ offset 16        │
//! │ location(0)  Float32x4           │ location(1)      │
//! │                                  │ Unorm8x4         │
//! └──────────────────────────────────┴──────────────────┘
//! ```
//!
//! ## Corner Order and Winding
//!
//! Corners are emitted top-left, top-right, bottom-right, bottom-left (as
//! fractions of the source region). The six indices `b+1, b+0, b+2, b+2,
//! b+0, b+3` form two triangles with the same winding for every quad, so
//! culling, when enabled, treats all sprites alike.
//!
//! ## Texture Coordinates
//!
//! Source rectangles are in top-left-origin texel space. Normalized V is
//! flipped (`v = 1 - y / height`), so `v = 1` along the region's top edge
//! when the region starts at texel row 0.

use bytemuck::{Pod, Zeroable};

use super::quad::Quad;

/// Fractional corner offsets within the source region.
pub const QUAD_CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Index pattern for one quad, relative to its first vertex.
pub const QUAD_INDEX_PATTERN: [u32; 6] = [1, 0, 2, 2, 0, 3];

/// Size of one [`SpriteVertex`], in bytes.
pub const VERTEX_SIZE: usize = std::mem::size_of::<SpriteVertex>();

/// Per-vertex data for sprite quads. Position is in screen pixels, already
/// rotated and scaled on the CPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub xyuv: [f32; 4],
    pub tint: u32,
}

impl SpriteVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: VERTEX_SIZE as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position + texcoord
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x4,
            },
            // tint
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 1,
                format: wgpu::VertexFormat::Unorm8x4,
            },
        ],
    };

    pub fn position(&self) -> [f32; 2] {
        [self.xyuv[0], self.xyuv[1]]
    }

    pub fn uv(&self) -> [f32; 2] {
        [self.xyuv[2], self.xyuv[3]]
    }
}

/// Projection matrix uploaded as a uniform buffer.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct ProjectionUniform {
    pub matrix: [[f32; 4]; 4],
}

/// Width of the entries in the index buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    /// 16-bit indices. Caps a buffer at 65536 vertices (16384 quads).
    #[default]
    U16,
    /// 32-bit indices.
    U32,
}

impl IndexFormat {
    /// Bytes per index.
    pub const fn size(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }

    /// Largest number of vertices one buffer may address.
    pub const fn max_vertices(self) -> usize {
        match self {
            IndexFormat::U16 => u16::MAX as usize + 1,
            IndexFormat::U32 => u32::MAX as usize,
        }
    }

    pub fn to_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::U16 => wgpu::IndexFormat::Uint16,
            IndexFormat::U32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Expand one quad into its four transformed vertices.
pub fn quad_vertices(quad: &Quad) -> [SpriteVertex; 4] {
    let [src_x, src_y, src_w, src_h] = quad.source;
    let [dst_x, dst_y, dst_w, dst_h] = quad.target;
    let [scl_u, scl_v] = quad.texel_scale;
    let ctr_x = quad.origin[0] / src_w;
    let ctr_y = quad.origin[1] / src_h;
    let (sin_o, cos_o) = quad.orientation.sin_cos();

    QUAD_CORNERS.map(|[fx, fy]| {
        let x_dst = (fx - ctr_x) * dst_w;
        let y_dst = (fy - ctr_y) * dst_h;
        SpriteVertex {
            xyuv: [
                dst_x + x_dst * cos_o - y_dst * sin_o,
                dst_y + x_dst * sin_o + y_dst * cos_o,
                (src_x + fx * src_w) * scl_u,
                1.0 - (src_y + fy * src_h) * scl_v,
            ],
            tint: quad.tint,
        }
    })
}

/// The six indices of the quad whose first vertex is `base_vertex`.
pub fn quad_indices(base_vertex: u32) -> [u32; 6] {
    QUAD_INDEX_PATTERN.map(|i| base_vertex + i)
}

/// Write vertices for `count` quads, read through `order[offset..]`, into
/// `out`. `out` must hold at least `count * 4` vertices worth of bytes; it
/// need not be aligned.
pub fn write_quad_vertices(out: &mut [u8], quads: &[Quad], order: &[u32], offset: usize, count: usize) {
    let ids = &order[offset..offset + count];
    for (chunk, &id) in out.chunks_exact_mut(VERTEX_SIZE * 4).zip(ids) {
        let vertices = quad_vertices(&quads[id as usize]);
        chunk.copy_from_slice(bytemuck::bytes_of(&vertices));
    }
}

/// Write indices for `count` consecutive quads starting at `base_vertex`.
///
/// With [`IndexFormat::U16`] the caller guarantees every index fits in 16 bits.
pub fn write_quad_indices(out: &mut [u8], format: IndexFormat, base_vertex: u32, count: usize) {
    let quad_bytes = format.size() * 6;
    for (i, chunk) in out.chunks_exact_mut(quad_bytes).take(count).enumerate() {
        let indices = quad_indices(base_vertex + i as u32 * 4);
        match format {
            IndexFormat::U16 => {
                let narrow = indices.map(|v| v as u16);
                chunk.copy_from_slice(bytemuck::bytes_of(&narrow));
            }
            IndexFormat::U32 => chunk.copy_from_slice(bytemuck::bytes_of(&indices)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{TexelRect, Vec2};
    use crate::sprite::Sprite;

    const EPS: f32 = 1e-4;

    fn quad_for(sprite: Sprite) -> Quad {
        Quad::from_sprite(&sprite)
    }

    fn base_sprite() -> Sprite {
        Sprite {
            position: Vec2::new(100.0, 50.0),
            source: TexelRect::new(0, 0, 40, 20),
            texture_width: 64,
            texture_height: 64,
            ..Sprite::default()
        }
    }

    fn assert_close(a: [f32; 2], b: [f32; 2]) {
        assert!(
            (a[0] - b[0]).abs() < EPS && (a[1] - b[1]).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn unrotated_sprite_covers_its_rect() {
        let v = quad_vertices(&quad_for(base_sprite()));
        assert_close(v[0].position(), [100.0, 50.0]);
        assert_close(v[1].position(), [140.0, 50.0]);
        assert_close(v[2].position(), [140.0, 70.0]);
        assert_close(v[3].position(), [100.0, 70.0]);
    }

    #[test]
    fn scale_stretches_target() {
        let v = quad_vertices(&quad_for(base_sprite().scale(2.0, 0.5)));
        assert_close(v[2].position(), [180.0, 60.0]);
    }

    #[test]
    fn rotation_about_center_keeps_centroid() {
        let sprite = base_sprite().centered();
        for step in 0..32 {
            let angle = step as f32 * std::f32::consts::TAU / 32.0;
            let v = quad_vertices(&quad_for(sprite.rotation(angle)));
            let cx = v.iter().map(|v| v.xyuv[0]).sum::<f32>() / 4.0;
            let cy = v.iter().map(|v| v.xyuv[1]).sum::<f32>() / 4.0;
            assert_close([cx, cy], [100.0, 50.0]);
        }
    }

    #[test]
    fn quarter_turn_is_clockwise_on_screen() {
        let v = quad_vertices(&quad_for(base_sprite().rotation(std::f32::consts::FRAC_PI_2)));
        // Top-right corner swings down below the origin.
        assert_close(v[1].position(), [100.0, 90.0]);
    }

    #[test]
    fn full_texture_uvs_are_flipped_unit_square() {
        let sprite = Sprite {
            source: TexelRect::full(64, 32),
            texture_width: 64,
            texture_height: 32,
            ..Sprite::default()
        };
        let v = quad_vertices(&quad_for(sprite));
        assert_close(v[0].uv(), [0.0, 1.0]);
        assert_close(v[1].uv(), [1.0, 1.0]);
        assert_close(v[2].uv(), [1.0, 0.0]);
        assert_close(v[3].uv(), [0.0, 0.0]);
    }

    #[test]
    fn sub_region_uvs() {
        let sprite = base_sprite().region(TexelRect::new(16, 32, 16, 16));
        let v = quad_vertices(&quad_for(sprite));
        assert_close(v[0].uv(), [0.25, 0.5]);
        assert_close(v[2].uv(), [0.5, 0.25]);
    }

    #[test]
    fn tint_copied_to_all_vertices() {
        let sprite = base_sprite().tint(crate::sprite::PackedColor::rgba(9, 8, 7, 6));
        let v = quad_vertices(&quad_for(sprite));
        assert!(v.iter().all(|v| v.tint == sprite.tint.0));
    }

    #[test]
    fn index_winding_is_translation_invariant() {
        for base in [0u32, 4, 128, 60_000, 1 << 20] {
            assert_eq!(
                quad_indices(base),
                [base + 1, base, base + 2, base + 2, base, base + 3]
            );
        }
    }

    #[test]
    fn write_indices_u16_and_u32() {
        let mut narrow = vec![0u8; 2 * 12];
        write_quad_indices(&mut narrow, IndexFormat::U16, 8, 2);
        let narrow: Vec<u16> = narrow.chunks_exact(2).map(|c| u16::from_ne_bytes([c[0], c[1]])).collect();
        assert_eq!(narrow, vec![9, 8, 10, 10, 8, 11, 13, 12, 14, 14, 12, 15]);

        let mut wide = vec![0u8; 4 * 6];
        write_quad_indices(&mut wide, IndexFormat::U32, 70_000, 1);
        let wide: Vec<u32> = bytemuck::pod_collect_to_vec(&wide);
        assert_eq!(wide, quad_indices(70_000).to_vec());
    }

    #[test]
    fn write_vertices_follows_order() {
        let a = quad_for(base_sprite());
        let b = quad_for(base_sprite().at(0.0, 0.0));
        let mut out = vec![0u8; VERTEX_SIZE * 4];
        // Read through the order array: offset 1 picks quad 0.
        write_quad_vertices(&mut out, &[a, b], &[1, 0], 1, 1);
        let v: Vec<SpriteVertex> = bytemuck::pod_collect_to_vec(&out);
        assert_eq!(v, quad_vertices(&a).to_vec());
    }

    #[test]
    fn vertex_is_twenty_bytes() {
        assert_eq!(VERTEX_SIZE, 20);
        assert_eq!(IndexFormat::U16.max_vertices(), 65_536);
    }
}
