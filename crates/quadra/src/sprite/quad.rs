//! Sprite → quad transform.
//!
//! A [`Quad`] holds what vertex generation needs for one sprite, already in
//! the shape the vertex loop reads it. The layer depth and render state go
//! into a separate [`SortKey`] array so sorting never has to pull whole quads
//! through the cache.

use super::Sprite;

/// Geometry for one sprite, ready for vertex expansion.
///
/// Rectangles are `[x, y, width, height]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Quad {
    /// Source region in texels, unnormalized.
    pub source: [f32; 4],
    /// Target rectangle on screen; size is source size times scale.
    pub target: [f32; 4],
    /// Rotation origin relative to the region's upper-left corner, in texels.
    pub origin: [f32; 2],
    /// `1 / texture_width`, `1 / texture_height`.
    pub texel_scale: [f32; 2],
    /// Rotation in radians.
    pub orientation: f32,
    /// Packed tint, copied to every vertex.
    pub tint: u32,
}

/// The per-quad data sort comparators look at.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SortKey {
    pub layer_depth: u32,
    pub render_state: u32,
}

impl Quad {
    /// Derive the quad for a single sprite.
    pub fn from_sprite(s: &Sprite) -> Self {
        let src_w = s.source.width as f32;
        let src_h = s.source.height as f32;
        Self {
            source: [s.source.x as f32, s.source.y as f32, src_w, src_h],
            target: [s.position.x, s.position.y, src_w * s.scale.x, src_h * s.scale.y],
            origin: [s.origin.x, s.origin.y],
            texel_scale: [1.0 / s.texture_width as f32, 1.0 / s.texture_height as f32],
            orientation: s.orientation,
            tint: s.tint.0,
        }
    }
}

impl SortKey {
    pub fn from_sprite(s: &Sprite) -> Self {
        Self {
            layer_depth: s.layer_depth,
            render_state: s.render_state,
        }
    }
}

/// Transform `sprites` into quads and sort keys starting at `dst_offset`, and
/// reset the matching order slots to identity (`order[i] = i`).
///
/// The caller guarantees all three destination slices hold at least
/// `dst_offset + sprites.len()` elements. Malformed sprites (zero-area source,
/// non-finite position) are not rejected; debug builds assert on them.
pub fn generate_quads(
    quads: &mut [Quad],
    keys: &mut [SortKey],
    order: &mut [u32],
    dst_offset: usize,
    sprites: &[Sprite],
) {
    let end = dst_offset + sprites.len();
    let dst = quads[dst_offset..end]
        .iter_mut()
        .zip(&mut keys[dst_offset..end])
        .zip(&mut order[dst_offset..end]);

    for (((quad, key), slot), (i, sprite)) in dst.zip(sprites.iter().enumerate()) {
        debug_assert!(!sprite.source.is_empty(), "sprite {i} has a zero-area source rect");
        debug_assert!(
            sprite.position.is_finite() && sprite.scale.is_finite() && sprite.orientation.is_finite(),
            "sprite {i} has non-finite transform"
        );
        *quad = Quad::from_sprite(sprite);
        *key = SortKey::from_sprite(sprite);
        *slot = (dst_offset + i) as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{TexelRect, Vec2};
    use crate::sprite::PackedColor;

    fn sprite() -> Sprite {
        Sprite {
            position: Vec2::new(10.0, 20.0),
            origin: Vec2::new(4.0, 2.0),
            scale: Vec2::new(2.0, 3.0),
            orientation: 0.5,
            tint: PackedColor::rgba(1, 2, 3, 4),
            source: TexelRect::new(8, 16, 32, 24),
            texture_width: 256,
            texture_height: 128,
            layer_depth: 5,
            render_state: 42,
        }
    }

    #[test]
    fn quad_fields_follow_sprite() {
        let q = Quad::from_sprite(&sprite());
        assert_eq!(q.source, [8.0, 16.0, 32.0, 24.0]);
        assert_eq!(q.target, [10.0, 20.0, 64.0, 72.0]);
        assert_eq!(q.origin, [4.0, 2.0]);
        assert_eq!(q.texel_scale, [1.0 / 256.0, 1.0 / 128.0]);
        assert_eq!(q.orientation, 0.5);
        assert_eq!(q.tint, PackedColor::rgba(1, 2, 3, 4).0);
    }

    #[test]
    fn generate_writes_at_offset_with_identity_order() {
        let mut quads = vec![Quad::default(); 5];
        let mut keys = vec![SortKey::default(); 5];
        let mut order = vec![99u32; 5];
        let sprites = [sprite(), sprite().layer(1)];

        generate_quads(&mut quads, &mut keys, &mut order, 2, &sprites);

        assert_eq!(order, vec![99, 99, 2, 3, 99]);
        assert_eq!(keys[2], SortKey { layer_depth: 5, render_state: 42 });
        assert_eq!(keys[3].layer_depth, 1);
        assert_eq!(quads[0], Quad::default());
        assert_eq!(quads[2], Quad::from_sprite(&sprites[0]));
        assert_eq!(quads[4], Quad::default());
    }

    #[test]
    fn quad_layout_is_tight() {
        assert_eq!(std::mem::size_of::<Quad>(), 56);
        assert_eq!(std::mem::size_of::<SortKey>(), 8);
    }
}
