//! Swarm: thousands of glowing particles orbiting the cursor.
//!
//! Particles are drawn with additive blending from a glow texture built at
//! startup; a ring of solid squares on top uses alpha blending, so every
//! frame switches blend mode once. With the default 4096-quad buffers the
//! particle count forces several orphans per frame.
//!
//! Controls: Space toggles additive/alpha for the particles, Up/Down change
//! the particle count, S cycles the sort order, Escape quits.
//!
//! Set `QUADRA_CONFIG=path/to/renderer.json` to load renderer settings.

use quadra::prelude::*;

const GLOW_SIZE: u32 = 32;

struct Particle {
    position: Vec2,
    velocity: Vec2,
    hue: f32,
}

struct Swarm {
    glow: Option<TextureInfo>,
    white: Option<TextureInfo>,
    particles: Vec<Particle>,
    target: usize,
    additive: bool,
    sort_order: Option<SortOrder>,
    rng: u32,
    spin: f32,
}

impl Swarm {
    fn new() -> Self {
        Self {
            glow: None,
            white: None,
            particles: Vec::new(),
            target: 10_000,
            additive: true,
            sort_order: Some(SortOrder::BackToFront),
            rng: 0x9e37_79b9,
            spin: 0.0,
        }
    }

    /// xorshift32, enough for scattering particles.
    fn random(&mut self) -> f32 {
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 17;
        self.rng ^= self.rng << 5;
        (self.rng >> 8) as f32 / (1u32 << 24) as f32
    }

    fn spawn(&mut self, center: Vec2) {
        let angle = self.random() * std::f32::consts::TAU;
        let radius = 40.0 + self.random() * 300.0;
        let offset = Vec2::new(angle.cos(), angle.sin()) * radius;
        let hue = self.random();
        self.particles.push(Particle {
            position: center + offset,
            velocity: offset.perp() * 0.8,
            hue,
        });
    }
}

/// Radial falloff, white with alpha fading to the edge.
fn glow_pixels(size: u32) -> Vec<u8> {
    let half = size as f32 * 0.5;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let d = Vec2::new(x as f32 + 0.5 - half, y as f32 + 0.5 - half).length() / half;
            let a = (1.0 - d).clamp(0.0, 1.0).powi(2);
            pixels.extend_from_slice(&[255, 255, 255, (a * 255.0) as u8]);
        }
    }
    pixels
}

fn hue_color(hue: f32) -> Color {
    let h = hue.fract() * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    Color::rgba(r, g, b, 0.8)
}

impl Game for Swarm {
    fn setup(&mut self, ctx: &mut Context) -> Result<()> {
        self.glow = Some(ctx.create_texture("glow", GLOW_SIZE, GLOW_SIZE, &glow_pixels(GLOW_SIZE))?);
        self.white = ctx.white_texture();
        log::info!("swarm ready: {} particles, Space toggles blend, S cycles sort", self.target);
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context) {
        let dt = ctx.time.delta_secs().min(0.05);
        let (w, h) = ctx.viewport_size();
        let center = if ctx.cursor == Vec2::ZERO {
            Vec2::new(w as f32, h as f32) * 0.5
        } else {
            ctx.cursor
        };

        if ctx.input.just_pressed(KeyCode::Escape) {
            ctx.exit();
        }
        if ctx.input.just_pressed(KeyCode::Space) {
            self.additive = !self.additive;
        }
        if ctx.input.just_pressed(KeyCode::ArrowUp) {
            self.target += 5_000;
        }
        if ctx.input.just_pressed(KeyCode::ArrowDown) {
            self.target = self.target.saturating_sub(5_000);
        }
        if ctx.input.just_pressed(KeyCode::KeyS) {
            self.sort_order = match self.sort_order {
                Some(SortOrder::BackToFront) => Some(SortOrder::FrontToBack),
                Some(SortOrder::FrontToBack) => Some(SortOrder::ByRenderState),
                Some(SortOrder::ByRenderState) => None,
                None => Some(SortOrder::BackToFront),
            };
            log::info!("sort order: {:?}", self.sort_order);
        }

        while self.particles.len() < self.target {
            self.spawn(center);
        }
        self.particles.truncate(self.target);

        for p in &mut self.particles {
            let to_center = center - p.position;
            let pull = to_center.normalize_or_zero() * 2000.0 / to_center.length().max(40.0);
            p.velocity = (p.velocity + pull * dt * 60.0) * 0.995;
            p.position += p.velocity * dt;
            p.hue += dt * 0.1;
        }
        self.spin += dt;

        if ctx.time.frame_count() % 120 == 0 {
            let stats = ctx.frame_stats();
            log::info!(
                "{:.0} fps, {} sprites, {} draws, {} orphans",
                ctx.time.fps(),
                stats.sprites,
                stats.draw_calls,
                stats.orphans
            );
        }
    }

    fn draw(&mut self, frame: &mut SpriteFrame<'_>) {
        let (Some(glow), Some(white)) = (self.glow, self.white) else {
            return;
        };

        frame.set_sort_order(self.sort_order);
        frame.set_blend_mode(if self.additive { BlendMode::Additive } else { BlendMode::Alpha });
        for (i, p) in self.particles.iter().enumerate() {
            let size = 0.5 + (i % 4) as f32 * 0.25;
            frame.add(
                &Sprite::new(&glow)
                    .at(p.position.x, p.position.y)
                    .centered()
                    .scale(size, size)
                    .tint(hue_color(p.hue))
                    .layer(1 + (i % 8) as u32),
            );
        }

        // Solid markers on top, in a separate blend mode.
        frame.set_blend_mode(BlendMode::Alpha);
        for i in 0..12 {
            let angle = self.spin + i as f32 * std::f32::consts::TAU / 12.0;
            let pos = Vec2::new(angle.cos(), angle.sin()) * 60.0 + Vec2::new(100.0, 100.0);
            frame.add(
                &Sprite::new(&white)
                    .at(pos.x, pos.y)
                    .centered()
                    .scale(12.0, 12.0)
                    .rotation(angle)
                    .tint(Color::WHITE)
                    .layer(0),
            );
        }
    }
}

fn main() -> Result<()> {
    let mut app = App::new("quadra swarm");
    if let Ok(path) = std::env::var("QUADRA_CONFIG") {
        app = app.renderer(RendererConfig::from_json_file(path)?);
    }
    app.run(Swarm::new())
}
