//! App builder and the per-frame game interface.
//!
//! [`App`] opens a window, brings up the GPU, and drives a [`Game`] until the
//! window closes. Each frame the game gets an `update` with the
//! [`Context`], then a `draw` with a [`SpriteFrame`] that streams whatever it
//! queues.
//!
//! # Example
//!
//! ```ignore
//! use quadra::prelude::*;
//!
//! struct Ship {
//!     texture: Option<TextureInfo>,
//!     angle: f32,
//! }
//!
//! impl Game for Ship {
//!     fn setup(&mut self, ctx: &mut Context) -> Result<()> {
//!         self.texture = Some(ctx.load_texture("assets/ship.png")?);
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, ctx: &mut Context) {
//!         self.angle += ctx.time.delta_secs();
//!     }
//!
//!     fn draw(&mut self, frame: &mut SpriteFrame<'_>) {
//!         if let Some(tex) = &self.texture {
//!             frame.add(&Sprite::new(tex).at(640.0, 360.0).centered().rotation(self.angle));
//!         }
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     App::new("ship").run(Ship { texture: None, angle: 0.0 })
//! }
//! ```

use std::path::Path;

use crate::config::{RendererConfig, WindowConfig};
use crate::error::{Error, Result};
use crate::input::{Input, KeyCode, MouseButton};
use crate::math::Vec2;
use crate::render::TextureInfo;
use crate::sprite::{FrameStats, SpriteFrame};
use crate::time::Time;
use crate::window::Graphics;

/// A game driven by [`App::run`].
pub trait Game {
    /// Called once, after the window and GPU are ready. Load textures here.
    fn setup(&mut self, ctx: &mut Context) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called once per frame before drawing.
    fn update(&mut self, ctx: &mut Context);

    /// Queue this frame's sprites.
    fn draw(&mut self, frame: &mut SpriteFrame<'_>);
}

// ── InputState ──────────────────────────────────────────────────────────

/// Keyboard and mouse state. Access via [`Context::input`].
#[derive(Default)]
pub struct InputState {
    pub(crate) keys: Input<KeyCode>,
    pub(crate) mouse: Input<MouseButton>,
}

impl InputState {
    pub fn keys(&self) -> &Input<KeyCode> {
        &self.keys
    }

    pub fn mouse(&self) -> &Input<MouseButton> {
        &self.mouse
    }

    pub fn pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed(key)
    }

    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.keys.just_pressed(key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse.pressed(button)
    }

    pub(crate) fn end_frame(&mut self) {
        self.keys.end_frame();
        self.mouse.end_frame();
    }
}

// ── Context ──────────────────────────────────────────────────────────────

/// What a [`Game`] can see and touch outside of drawing.
pub struct Context {
    pub time: Time,
    pub input: InputState,
    /// Cursor position in window pixels, origin top-left.
    pub cursor: Vec2,
    pub(crate) graphics: Option<Graphics>,
    pub(crate) last_stats: FrameStats,
    pub(crate) exit_requested: bool,
}

impl Context {
    pub(crate) fn new() -> Self {
        Self {
            time: Time::new(),
            input: InputState::default(),
            cursor: Vec2::ZERO,
            graphics: None,
            last_stats: FrameStats::default(),
            exit_requested: false,
        }
    }

    fn graphics_mut(&mut self) -> Result<&mut Graphics> {
        self.graphics
            .as_mut()
            .ok_or_else(|| Error::Gpu("textures need a running GPU".into()))
    }

    /// Decode an image file into a texture. Loading the same path twice
    /// returns the first texture.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureInfo> {
        let g = self.graphics_mut()?;
        g.backend.load_texture(&g.gpu.device, &g.gpu.queue, path)
    }

    /// Upload tightly packed RGBA8 pixels, top row first.
    pub fn create_texture(&mut self, label: &str, width: u32, height: u32, rgba: &[u8]) -> Result<TextureInfo> {
        let g = self.graphics_mut()?;
        g.backend
            .create_texture(&g.gpu.device, &g.gpu.queue, label, width, height, rgba)
    }

    /// The built-in 1x1 white texture. Sprites cut from it draw as solid
    /// rectangles in their tint.
    pub fn white_texture(&self) -> Option<TextureInfo> {
        self.graphics.as_ref().map(|g| g.backend.textures().white())
    }

    /// Drawable size in pixels; `(0, 0)` before the window exists.
    pub fn viewport_size(&self) -> (u32, u32) {
        self.graphics.as_ref().map_or((0, 0), |g| g.gpu.surface_size())
    }

    /// Counters from the previous frame's sprite drawing.
    pub fn frame_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    /// Close the window after this frame.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }
}

// ── App ──────────────────────────────────────────────────────────────────

/// Window + renderer settings, then [`run`](App::run).
pub struct App {
    window: WindowConfig,
    renderer: RendererConfig,
}

impl App {
    pub fn new(title: &str) -> Self {
        Self {
            window: WindowConfig {
                title: title.to_string(),
                ..WindowConfig::default()
            },
            renderer: RendererConfig::default(),
        }
    }

    /// Replace the window settings. An empty title keeps the one passed to
    /// [`App::new`].
    pub fn window(mut self, config: WindowConfig) -> Self {
        let title = std::mem::take(&mut self.window.title);
        self.window = config;
        if self.window.title.is_empty() {
            self.window.title = title;
        }
        self
    }

    pub fn renderer(mut self, config: RendererConfig) -> Self {
        self.renderer = config;
        self
    }

    /// Open the window and run `game` until it closes. Returns the first
    /// error from window/GPU setup or from [`Game::setup`].
    pub fn run(self, game: impl Game + 'static) -> Result<()> {
        init_logging();
        self.renderer.validate()?;

        let event_loop = winit::event_loop::EventLoop::new()
            .map_err(|e| Error::Window(format!("cannot create event loop: {e}")))?;
        let mut app = crate::window::WinitApp::new(Box::new(game), self.window, self.renderer);
        event_loop
            .run_app(&mut app)
            .map_err(|e| Error::Window(format!("event loop error: {e}")))?;
        app.into_result()
    }
}

fn init_logging() {
    #[cfg(feature = "diagnostics")]
    crate::diag::init_logger();
    #[cfg(not(feature = "diagnostics"))]
    {
        let _ = env_logger::try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_calls_need_a_gpu() {
        let mut ctx = Context::new();
        assert!(matches!(ctx.load_texture("missing.png"), Err(Error::Gpu(_))));
        assert!(ctx.white_texture().is_none());
        assert_eq!(ctx.viewport_size(), (0, 0));
    }

    #[test]
    fn window_config_keeps_title_when_blank() {
        let app = App::new("swarm").window(WindowConfig {
            title: String::new(),
            width: 800,
            ..WindowConfig::default()
        });
        assert_eq!(app.window.title, "swarm");
        assert_eq!(app.window.width, 800);
    }

    #[test]
    fn input_state_clears_edges() {
        let mut input = InputState::default();
        input.keys.press(KeyCode::Space);
        input.mouse.press(MouseButton::Left);
        assert!(input.just_pressed(KeyCode::Space));
        input.end_frame();
        assert!(input.pressed(KeyCode::Space) && !input.just_pressed(KeyCode::Space));
        assert!(input.mouse_pressed(MouseButton::Left));
    }
}
