//! Window management via winit.
//!
//! Implements [`winit::application::ApplicationHandler`] to drive the event
//! loop: window and GPU creation, input forwarding, resize, and the frame
//! loop (update, draw sprites, present).

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::app::{Context, Game};
use crate::config::{RendererConfig, WindowConfig};
use crate::error::{Error, Result};
use crate::render::{ClearColor, GpuContext, SpriteBackend};
use crate::sprite::SpriteRenderer;

/// Everything that exists only while the window does.
pub(crate) struct Graphics {
    pub(crate) window: Arc<Window>,
    pub(crate) gpu: GpuContext,
    pub(crate) backend: SpriteBackend,
    pub(crate) renderer: SpriteRenderer,
}

/// The application state that winit drives.
pub(crate) struct WinitApp {
    ctx: Context,
    game: Box<dyn Game>,
    window_config: WindowConfig,
    renderer_config: RendererConfig,
    clear: ClearColor,
    started: bool,
    error: Option<Error>,
    #[cfg(feature = "diagnostics")]
    diag: Option<crate::diag::DiagSender>,
    #[cfg(feature = "diagnostics")]
    budget: crate::diag::FrameBudget,
}

impl WinitApp {
    pub fn new(game: Box<dyn Game>, window_config: WindowConfig, renderer_config: RendererConfig) -> Self {
        Self {
            ctx: Context::new(),
            game,
            window_config,
            clear: ClearColor(renderer_config.clear_color),
            renderer_config,
            started: false,
            error: None,
            #[cfg(feature = "diagnostics")]
            diag: crate::diag::DiagSender::new(),
            #[cfg(feature = "diagnostics")]
            budget: crate::diag::FrameBudget::default(),
        }
    }

    /// The error that stopped the loop, if any.
    pub fn into_result(self) -> Result<()> {
        self.error.map_or(Ok(()), Err)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{error}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn create_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics> {
        let attrs = Window::default_attributes()
            .with_title(&self.window_config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.window_config.width as f64,
                self.window_config.height as f64,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| Error::Window(format!("cannot create window: {e}")))?,
        );

        let gpu = GpuContext::new(window.clone(), self.window_config.vsync)?;
        let renderer = SpriteRenderer::new(&self.renderer_config)?;
        let backend = SpriteBackend::new(&gpu.device, &gpu.queue, gpu.surface_format(), &renderer);

        Ok(Graphics {
            window,
            gpu,
            backend,
            renderer,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.ctx.time.update();

        let update_start = Instant::now();
        self.game.update(&mut self.ctx);
        self.ctx.input.end_frame();
        let update_ms = update_start.elapsed().as_secs_f32() * 1000.0;

        let draw_start = Instant::now();
        self.render(event_loop);
        let draw_ms = draw_start.elapsed().as_secs_f32() * 1000.0;

        #[cfg(feature = "diagnostics")]
        {
            self.budget = crate::diag::FrameBudget { update_ms, draw_ms };
            if let Some(diag) = self.diag.as_mut() {
                diag.record(&self.ctx.last_stats);
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        let _ = (update_ms, draw_ms);

        if self.ctx.exit_requested {
            log::info!("exit requested by game");
            event_loop.exit();
            return;
        }
        if let Some(g) = &self.ctx.graphics {
            g.window.request_redraw();
        }
    }

    /// Draw one frame and handle surface errors.
    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let Some(g) = self.ctx.graphics.as_mut() else {
            return;
        };

        let output = match g.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                g.gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                event_loop.exit();
                return;
            }
            Err(e) => {
                log::warn!("surface error: {e:?}");
                return;
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = g.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("quadra frame encoder"),
        });

        let size = g.gpu.surface_size();
        let game = &mut self.game;
        g.backend.draw(
            &g.gpu.device,
            &g.gpu.queue,
            &mut encoder,
            &view,
            self.clear,
            size,
            &mut g.renderer,
            |frame| game.draw(frame),
        );

        g.gpu.queue.submit(std::iter::once(encoder.finish()));
        g.window.pre_present_notify();
        output.present();

        self.ctx.last_stats = g.renderer.take_stats();
    }
}

impl ApplicationHandler for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.graphics.is_none() {
            match self.create_graphics(event_loop) {
                Ok(graphics) => {
                    graphics.window.request_redraw();
                    self.ctx.graphics = Some(graphics);
                }
                Err(e) => {
                    self.fail(event_loop, e);
                    return;
                }
            }
        }

        if !self.started {
            self.started = true;
            if let Err(e) = self.game.setup(&mut self.ctx) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                // The renderer picks up the new size at the start of the next frame.
                if let Some(g) = self.ctx.graphics.as_mut() {
                    g.gpu.resize(size.width, size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.ctx.input.keys.press(key_code),
                        ElementState::Released => self.ctx.input.keys.release(key_code),
                    }
                }
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => self.ctx.input.mouse.press(button),
                ElementState::Released => self.ctx.input.mouse.release(button),
            },

            WindowEvent::CursorMoved { position, .. } => {
                self.ctx.cursor.x = position.x as f32;
                self.ctx.cursor.y = position.y as f32;
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        #[cfg(feature = "diagnostics")]
        if let Some(diag) = self.diag.as_mut() {
            let textures = self.ctx.graphics.as_ref().map_or(0, |g| g.backend.textures().len());
            diag.send(&self.ctx.time, self.budget, textures);
        }
    }
}
