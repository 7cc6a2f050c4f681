//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`TexelRect`] describes a region of a texture in
//! pixel units, and [`ortho_projection`] builds the screen-to-clip matrix the
//! sprite shader expects.

pub use glam::{Mat4, Vec2, Vec4};

/// A rectangle within a texture, in texels, with a **top-left** origin.
///
/// Source rectangles are always given in this space. The vertex generator
/// flips V when normalizing, so a loader that produces bottom-left-origin
/// pixel rows must flip them before upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TexelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TexelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle covering a whole `width` x `height` texture.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// True if the rectangle covers no texels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Orthographic projection for a `width` x `height` pixel viewport.
///
/// Maps pixel space, origin at the top-left and Y growing downward, onto clip
/// space where Y grows upward:
///
/// ```text
///  pixel (0,0) ──────── (w,0)        clip (-1, 1) ──────── (1, 1)
///     │                   │      →        │                   │
///  (0,h) ────────────── (w,h)           (-1,-1) ─────────── (1,-1)
/// ```
///
/// Z passes through unchanged. The matrix is column-major, matching both
/// glam and the WGSL `mat4x4<f32>` uniform layout.
pub fn ortho_projection(width: u32, height: u32) -> Mat4 {
    let sx = 1.0 / (width.max(1) as f32 * 0.5);
    let sy = 1.0 / (height.max(1) as f32 * 0.5);
    Mat4::from_cols_array(&[
        sx, 0.0, 0.0, 0.0, //
        0.0, -sy, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        -1.0, 1.0, 0.0, 1.0,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(m: Mat4, x: f32, y: f32) -> Vec2 {
        let p = m * Vec4::new(x, y, 0.0, 1.0);
        Vec2::new(p.x, p.y)
    }

    #[test]
    fn projection_maps_corners_with_y_flip() {
        let m = ortho_projection(800, 600);
        assert!(clip(m, 0.0, 0.0).abs_diff_eq(Vec2::new(-1.0, 1.0), 1e-6));
        assert!(clip(m, 800.0, 0.0).abs_diff_eq(Vec2::new(1.0, 1.0), 1e-6));
        assert!(clip(m, 800.0, 600.0).abs_diff_eq(Vec2::new(1.0, -1.0), 1e-6));
        assert!(clip(m, 0.0, 600.0).abs_diff_eq(Vec2::new(-1.0, -1.0), 1e-6));
        assert!(clip(m, 400.0, 300.0).abs_diff_eq(Vec2::ZERO, 1e-6));
    }

    #[test]
    fn projection_survives_zero_size() {
        let m = ortho_projection(0, 0);
        assert!(m.is_finite());
    }

    #[test]
    fn texel_rect_full_and_empty() {
        assert_eq!(TexelRect::full(64, 32), TexelRect::new(0, 0, 64, 32));
        assert!(TexelRect::new(3, 3, 0, 8).is_empty());
        assert!(!TexelRect::full(1, 1).is_empty());
    }
}
