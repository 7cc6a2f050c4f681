//! Atlas: many small images packed onto one texture, drawn in one call.
//!
//! Generates a few dozen ship and bullet shapes of different sizes, packs
//! them with [`AtlasPacker`], uploads the result as a single texture, and
//! draws every shape from it. All sprites share a render state, so each
//! frame is a single draw call; the log line every two seconds shows it.
//!
//! Pass an image path to draw it next to the atlas: `cargo run --example
//! atlas -- assets/ship.png`.

use quadra::prelude::*;

const ATLAS_SIZE: u32 = 256;
const PADDING: u32 = 1;

/// A filled shape as RGBA pixels.
struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// A diamond, the classic enemy.
    fn diamond(size: u32, color: [u8; 3]) -> Self {
        Self::filled(size, size, color, |u, v| (u - 0.5).abs() + (v - 0.5).abs() <= 0.5)
    }

    /// A pointed ship hull, nose up.
    fn ship(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::filled(width, height, color, |u, v| (u - 0.5).abs() * 2.0 <= v)
    }

    fn dot(size: u32, color: [u8; 3]) -> Self {
        Self::filled(size, size, color, |u, v| (u - 0.5).powi(2) + (v - 0.5).powi(2) <= 0.25)
    }

    fn filled(width: u32, height: u32, [r, g, b]: [u8; 3], inside: impl Fn(f32, f32) -> bool) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let u = (x as f32 + 0.5) / width as f32;
                let v = (y as f32 + 0.5) / height as f32;
                let a = if inside(u, v) { 255 } else { 0 };
                pixels.extend_from_slice(&[r, g, b, a]);
            }
        }
        Self { width, height, pixels }
    }
}

/// Pack `images` and compose them into one RGBA buffer. Images that do not
/// fit are skipped with a warning.
fn build_atlas(images: &[Image]) -> (Vec<PackedRect>, Vec<u8>) {
    let mut packer = AtlasPacker::new(ATLAS_SIZE, ATLAS_SIZE, images.len());
    let mut pixels = vec![0u8; (ATLAS_SIZE * ATLAS_SIZE * 4) as usize];

    // Largest first packs tighter.
    let mut by_size: Vec<usize> = (0..images.len()).collect();
    by_size.sort_by_key(|&i| std::cmp::Reverse(images[i].width * images[i].height));

    for i in by_size {
        let image = &images[i];
        let Some(rect) = packer.insert(image.width, image.height, PADDING, PADDING, i as u32) else {
            log::warn!("image {i} ({}x{}) does not fit in the atlas", image.width, image.height);
            continue;
        };
        let row_bytes = (image.width * 4) as usize;
        for row in 0..image.height {
            let src = (row * image.width * 4) as usize;
            let dst = (((rect.y + row) * ATLAS_SIZE + rect.x) * 4) as usize;
            pixels[dst..dst + row_bytes].copy_from_slice(&image.pixels[src..src + row_bytes]);
        }
    }

    log::info!(
        "packed {} of {} images, {:.0}% of the atlas used",
        packer.rects().len(),
        images.len(),
        packer.used_area() as f64 * 100.0 / (ATLAS_SIZE * ATLAS_SIZE) as f64
    );
    (packer.rects().to_vec(), pixels)
}

struct AtlasDemo {
    extra_image: Option<String>,
    atlas: Option<TextureInfo>,
    extra: Option<TextureInfo>,
    rects: Vec<PackedRect>,
    time: f32,
}

impl Game for AtlasDemo {
    fn setup(&mut self, ctx: &mut Context) -> Result<()> {
        let palette = [[255, 80, 80], [80, 255, 120], [90, 140, 255], [255, 220, 60]];
        let mut images = Vec::new();
        for (i, color) in palette.iter().enumerate() {
            let step = i as u32 * 6;
            images.push(Image::diamond(16 + step, *color));
            images.push(Image::ship(20 + step, 28 + step, *color));
            for d in 0..4 {
                images.push(Image::dot(4 + d * 2, *color));
            }
        }

        let (rects, pixels) = build_atlas(&images);
        self.atlas = Some(ctx.create_texture("shape atlas", ATLAS_SIZE, ATLAS_SIZE, &pixels)?);
        self.rects = rects;

        if let Some(path) = &self.extra_image {
            self.extra = Some(ctx.load_texture(path)?);
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context) {
        self.time += ctx.time.delta_secs();
        if ctx.input.just_pressed(KeyCode::Escape) {
            ctx.exit();
        }
        if ctx.time.frame_count() % 120 == 0 {
            let stats = ctx.frame_stats();
            log::info!("{} sprites in {} draw call(s)", stats.sprites, stats.draw_calls);
        }
    }

    fn draw(&mut self, frame: &mut SpriteFrame<'_>) {
        let Some(atlas) = self.atlas else {
            return;
        };

        // The whole atlas, for reference.
        frame.add(&Sprite::new(&atlas).at(16.0, 16.0).tint(Color::rgba(1.0, 1.0, 1.0, 0.5)).layer(2));

        for (i, rect) in self.rects.iter().enumerate() {
            let column = (i % 8) as f32;
            let row = (i / 8) as f32;
            let wobble = (self.time * 2.0 + i as f32).sin() * 0.3;
            frame.add(
                &Sprite::new(&atlas)
                    .region(rect.texel_rect())
                    .at(360.0 + column * 64.0, 64.0 + row * 64.0)
                    .centered()
                    .scale(1.5, 1.5)
                    .rotation(wobble)
                    .layer(1),
            );
        }

        if let Some(extra) = &self.extra {
            frame.add(&Sprite::new(extra).at(16.0, 300.0).layer(0));
        }
    }
}

fn main() -> Result<()> {
    App::new("quadra atlas")
        .renderer(RendererConfig {
            clear_color: [0.05, 0.05, 0.08, 1.0],
            ..RendererConfig::default()
        })
        .run(AtlasDemo {
            extra_image: std::env::args().nth(1),
            atlas: None,
            extra: None,
            rects: Vec::new(),
            time: 0.0,
        })
}
