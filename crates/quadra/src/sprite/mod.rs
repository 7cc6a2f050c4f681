//! # Sprite — Batched 2D Quads Streamed to the GPU
//!
//! A *sprite* is a request to draw a rectangular region of a texture somewhere
//! on screen: moved, rotated about an origin, scaled, and tinted. Games queue
//! hundreds or thousands of them per frame. This module turns that flat list
//! of requests into as few GPU draw calls as possible.
//!
//! ## Architecture
//!
//! Every frame follows the same pipeline:
//!
//! ```text
//!   Sprite, Sprite, Sprite ...          (SpriteRenderer::add)
//!          │
//!          ▼
//!   ┌─────────────────────┐   quad.rs
//!   │ generate quads      │   Sprite → Quad + SortKey, order[i] = i
//!   └──────────┬──────────┘
//!              ▼
//!   ┌─────────────────────┐   sort.rs / batch.rs
//!   │ sort order array    │   indirect: only the u32 permutation moves
//!   └──────────┬──────────┘
//!              ▼
//!   ┌─────────────────────┐   effect.rs / vertex.rs
//!   │ buffer_data         │   write 4 vertices + 6 indices per quad into
//!   │                     │   the GPU ring; orphan when it fills up
//!   └──────────┬──────────┘
//!              ▼
//!   ┌─────────────────────┐   draw.rs
//!   │ draw_region         │   one draw call per run of equal render state,
//!   │                     │   EffectHooks::apply at every boundary
//!   └─────────────────────┘
//! ```
//!
//! ## Design Decisions
//!
//! **Split quad and sort data.** A [`Quad`] is 56 bytes; a [`SortKey`] is 8.
//! Sorting compares keys only, and only the `u32` order array is permuted, so
//! a sort touches a fraction of the memory a sort of full quads would.
//!
//! **CPU-side transform.** Rotation, origin, and scale are applied while the
//! vertices are generated, so sprites with different transforms still share a
//! draw call as long as their render state matches.
//!
//! **Ring buffer with orphaning.** The vertex and index buffers are written
//! front to back across frames. When the write cursor hits the end, both
//! buffers get fresh storage instead of being overwritten. The GPU may still
//! be reading the old contents, and writing over them would force the CPU to
//! wait.
//!
//! **Render state is opaque.** The pipeline only compares render-state
//! values for equality and order. What a value *means* (usually a texture
//! handle) is decided by the [`EffectHooks`] implementation.

pub mod atlas;
pub mod batch;
pub mod blend;
pub mod device;
pub mod draw;
pub mod effect;
pub mod headless;
pub mod quad;
pub mod renderer;
pub mod sort;
pub mod vertex;

pub use atlas::{AtlasPacker, PackedRect};
pub use batch::SpriteBatch;
pub use blend::{BlendFactor, BlendMode, BlendOp, BlendState};
pub use device::{BufferTarget, StreamDevice};
pub use draw::{EffectHooks, SamplerHooks};
pub use effect::{Buffered, DrawPhase, FrameStats, SpriteEffect};
pub use headless::HeadlessDevice;
pub use quad::{Quad, SortKey, generate_quads};
pub use renderer::{SpriteFrame, SpriteRenderer};
pub use sort::SortOrder;
pub use vertex::{IndexFormat, SpriteVertex};

use crate::math::{TexelRect, Vec2};

/// Anything a sprite can be cut from.
///
/// The sprite pipeline never looks at pixels; it needs the texture's size to
/// normalize texture coordinates and an opaque render-state value to group
/// draws by.
pub trait TextureSource {
    /// The render-state value sprites from this texture are grouped under.
    fn render_state(&self) -> u32;
    /// Width of the texture, in texels.
    fn width(&self) -> u32;
    /// Height of the texture, in texels.
    fn height(&self) -> u32;
}

/// A tint color packed into 32 bits, red in the lowest byte.
///
/// This is the byte order the shader reads as `unorm8x4`, so the value is
/// copied into each vertex untouched.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Pack four 8-bit channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_le_bytes([r, g, b, a]))
    }

    /// Unpack into `[r, g, b, a]`.
    pub const fn channels(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl Default for PackedColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// An RGBA color with floating-point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const RED: Self = Self { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Self = Self { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Self = Self { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    /// Create a color from RGB (alpha = 1).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Quantize to 8 bits per channel.
    pub fn pack(self) -> PackedColor {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        PackedColor::rgba(q(self.r), q(self.g), q(self.b), q(self.a))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Color> for PackedColor {
    fn from(c: Color) -> Self {
        c.pack()
    }
}

/// One queued draw request.
///
/// A sprite is consumed exactly once, when its batch is flushed. The drawn
/// size is always the source rectangle's size times `scale`; there is no
/// independent destination size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    /// Screen-space position of the origin point, in pixels (Y down).
    pub position: Vec2,
    /// Origin offset from the source region's upper-left corner, in texels.
    /// Rotation and positioning happen about this point.
    pub origin: Vec2,
    /// Horizontal and vertical scale factors.
    pub scale: Vec2,
    /// Rotation in radians, clockwise on screen.
    pub orientation: f32,
    /// Tint multiplied with the texture sample.
    pub tint: PackedColor,
    /// Region of the texture to draw, top-left origin.
    pub source: TexelRect,
    /// Width of the whole texture the region belongs to.
    pub texture_width: u32,
    /// Height of the whole texture the region belongs to.
    pub texture_height: u32,
    /// Larger values are farther from the viewer.
    pub layer_depth: u32,
    /// Grouping key, usually the texture's handle.
    pub render_state: u32,
}

impl Sprite {
    /// A sprite showing all of `texture`, unrotated, at the screen origin.
    pub fn new(texture: &impl TextureSource) -> Self {
        Self {
            source: TexelRect::full(texture.width(), texture.height()),
            texture_width: texture.width(),
            texture_height: texture.height(),
            render_state: texture.render_state(),
            ..Self::default()
        }
    }

    /// Set the screen position.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the origin offset, in texels from the region's upper-left corner.
    pub fn origin(mut self, x: f32, y: f32) -> Self {
        self.origin = Vec2::new(x, y);
        self
    }

    /// Put the origin at the center of the source region.
    pub fn centered(mut self) -> Self {
        self.origin = Vec2::new(self.source.width as f32, self.source.height as f32) * 0.5;
        self
    }

    /// Set non-uniform scale.
    pub fn scale(mut self, sx: f32, sy: f32) -> Self {
        self.scale = Vec2::new(sx, sy);
        self
    }

    /// Set the rotation in radians.
    pub fn rotation(mut self, radians: f32) -> Self {
        self.orientation = radians;
        self
    }

    /// Set the tint color.
    pub fn tint(mut self, tint: impl Into<PackedColor>) -> Self {
        self.tint = tint.into();
        self
    }

    /// Draw only part of the texture.
    pub fn region(mut self, source: TexelRect) -> Self {
        self.source = source;
        self
    }

    /// Set the layer depth.
    pub fn layer(mut self, depth: u32) -> Self {
        self.layer_depth = depth;
        self
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            orientation: 0.0,
            tint: PackedColor::WHITE,
            source: TexelRect::full(1, 1),
            texture_width: 1,
            texture_height: 1,
            layer_depth: 0,
            render_state: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sheet;

    impl TextureSource for Sheet {
        fn render_state(&self) -> u32 {
            7
        }
        fn width(&self) -> u32 {
            128
        }
        fn height(&self) -> u32 {
            64
        }
    }

    #[test]
    fn packed_color_is_red_in_low_byte() {
        let c = PackedColor::rgba(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.0, 0x4433_2211);
        assert_eq!(c.channels(), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn float_color_packs_with_rounding() {
        assert_eq!(Color::WHITE.pack(), PackedColor::WHITE);
        assert_eq!(Color::rgba(1.0, 0.0, 0.5, 2.0).pack(), PackedColor::rgba(255, 0, 128, 255));
    }

    #[test]
    fn sprite_from_texture_covers_it() {
        let s = Sprite::new(&Sheet).region(TexelRect::new(32, 0, 16, 16)).centered().layer(3);
        assert_eq!(s.render_state, 7);
        assert_eq!((s.texture_width, s.texture_height), (128, 64));
        assert_eq!(s.origin, Vec2::new(8.0, 8.0));
        assert_eq!(s.layer_depth, 3);
        assert_eq!(s.scale, Vec2::ONE);
    }
}
