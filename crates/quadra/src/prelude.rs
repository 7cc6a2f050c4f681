//! Convenience re-exports: `use quadra::prelude::*` for the common items.

pub use crate::config::{RendererConfig, WindowConfig};
pub use crate::error::{Error, Result};
pub use crate::input::Input;
pub use crate::math::{Mat4, TexelRect, Vec2, Vec4};
pub use crate::render::{ClearColor, TextureHandle, TextureInfo};
pub use crate::sprite::{
    AtlasPacker, BlendFactor, BlendMode, BlendOp, BlendState, Color, FrameStats, PackedColor,
    PackedRect, SortOrder, Sprite, SpriteFrame, SpriteRenderer, TextureSource,
};
pub use crate::time::Time;

// Windowed runner (feature-gated)
#[cfg(feature = "window")]
pub use crate::app::{App, Context, Game, InputState};
#[cfg(feature = "window")]
pub use crate::input::{KeyCode, MouseButton};
