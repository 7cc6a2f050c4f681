//! # Quadra — Batched Sprite Rendering
//!
//! A 2D sprite renderer for games that draw thousands of textured quads a
//! frame. Sprites are turned into quads on the CPU, sorted through an
//! indirection array, streamed into a ring of GPU buffers, and drawn with one
//! call per run of sprites that share a texture.
//!
//! The pipeline itself ([`sprite`]) only talks to a [`StreamDevice`]
//! trait, so it runs the same against wgpu ([`render`]) or the recording
//! [`HeadlessDevice`] used in tests.
//!
//! Start with `use quadra::prelude::*` and implement [`Game`](app::Game)
//! (with the default `window` feature), or drive a
//! [`SpriteRenderer`](sprite::SpriteRenderer) yourself.
//!
//! [`StreamDevice`]: sprite::StreamDevice
//! [`HeadlessDevice`]: sprite::HeadlessDevice

pub mod config;
pub mod error;
pub mod input;
pub mod math;
pub mod prelude;
pub mod render;
pub mod sprite;
pub mod time;

#[cfg(feature = "window")]
pub mod app;
#[cfg(feature = "window")]
pub(crate) mod window;

#[cfg(feature = "diagnostics")]
pub mod diag;

pub use error::{Error, Result};
