//! wgpu backend for the sprite pipeline.
//!
//! Everything here needs only a `wgpu::Device` and `wgpu::Queue`; the
//! window-bound surface setup lives in [`gpu`] behind the `window` feature.

#[cfg(feature = "window")]
pub mod gpu;
pub mod pass;
pub mod pipeline;
pub mod stream;
pub mod texture;

#[cfg(feature = "window")]
pub use gpu::GpuContext;
pub use pass::{ClearColor, SpriteBackend};
pub use pipeline::SpritePipeline;
pub use stream::{StreamBuffers, WgpuStreamDevice};
pub use texture::{TextureHandle, TextureInfo, TextureStore};
