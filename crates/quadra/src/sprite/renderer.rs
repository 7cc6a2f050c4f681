//! The front door of the sprite pipeline.
//!
//! [`SpriteRenderer`] ties a [`SpriteBatch`] to a [`SpriteEffect`]: sprites
//! are queued with [`add`](SpriteRenderer::add), and
//! [`flush`](SpriteRenderer::flush) sorts them and streams them to a device.
//! Anything that changes how queued sprites would be drawn (blend mode,
//! viewport) flushes first, so no sprite is ever drawn with state it was
//! not queued under.
//!
//! [`SpriteFrame`] bundles a renderer with the device and hooks for one
//! frame, which is what game code sees.

use crate::config::RendererConfig;
use crate::error::Result;

use super::Sprite;
use super::batch::SpriteBatch;
use super::blend::BlendMode;
use super::device::StreamDevice;
use super::draw::EffectHooks;
use super::effect::{FrameStats, SpriteEffect};
use super::sort::SortOrder;

/// Queues sprites and draws them through a [`SpriteEffect`].
#[derive(Debug)]
pub struct SpriteRenderer {
    batch: SpriteBatch,
    effect: SpriteEffect,
    sort_order: Option<SortOrder>,
    blend_mode: BlendMode,
}

impl SpriteRenderer {
    /// Build a renderer. Fails with [`Error::Config`](crate::error::Error::Config)
    /// when `config` does not [`validate`](RendererConfig::validate).
    pub fn new(config: &RendererConfig) -> Result<Self> {
        config.validate()?;
        let mut effect = SpriteEffect::new(config.max_quads, config.index_format);
        effect.set_blend_mode(config.blend_mode);
        Ok(Self {
            batch: SpriteBatch::with_capacity(config.initial_batch_capacity),
            effect,
            sort_order: config.sort_order,
            blend_mode: config.blend_mode,
        })
    }

    /// Queue one sprite for the next flush.
    pub fn add(&mut self, sprite: &Sprite) {
        self.batch.add(sprite);
    }

    /// Queue many sprites for the next flush.
    pub fn extend(&mut self, sprites: &[Sprite]) {
        self.batch.extend(sprites);
    }

    /// Sprites waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.batch.count()
    }

    /// Sort and draw every queued sprite, then empty the queue. Returns the
    /// number of sprites drawn.
    pub fn flush(&mut self, device: &mut dyn StreamDevice, hooks: &mut dyn EffectHooks) -> usize {
        let count = self.batch.count();
        if count == 0 {
            return 0;
        }
        if let Some(order) = self.sort_order {
            self.batch.sort(order);
        }
        self.effect.draw_batch(&self.batch, device, hooks);
        self.effect.stats.sprites += count as u64;
        self.batch.flush();
        count
    }

    /// Draw what is queued under the current blend mode, then switch.
    pub fn set_blend_mode(&mut self, mode: BlendMode, device: &mut dyn StreamDevice, hooks: &mut dyn EffectHooks) {
        if mode == self.blend_mode {
            return;
        }
        self.flush(device, hooks);
        self.effect.set_blend_mode(mode);
        self.blend_mode = mode;
    }

    /// Draw what is queued under the current projection, then switch to a
    /// `width` x `height` viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32, device: &mut dyn StreamDevice, hooks: &mut dyn EffectHooks) {
        self.flush(device, hooks);
        self.effect.set_viewport(width, height);
    }

    /// Change how future flushes are ordered. Applies to sprites already
    /// queued.
    pub fn set_sort_order(&mut self, order: Option<SortOrder>) {
        self.sort_order = order;
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort_order
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn effect(&self) -> &SpriteEffect {
        &self.effect
    }

    pub fn batch(&self) -> &SpriteBatch {
        &self.batch
    }

    /// Counters collected since the last call; resets them.
    pub fn take_stats(&mut self) -> FrameStats {
        self.effect.take_stats()
    }
}

/// A renderer borrowed together with the device and hooks it draws with.
pub struct SpriteFrame<'f> {
    renderer: &'f mut SpriteRenderer,
    device: &'f mut dyn StreamDevice,
    hooks: &'f mut dyn EffectHooks,
}

impl<'f> SpriteFrame<'f> {
    pub fn new(
        renderer: &'f mut SpriteRenderer,
        device: &'f mut dyn StreamDevice,
        hooks: &'f mut dyn EffectHooks,
    ) -> Self {
        Self { renderer, device, hooks }
    }

    pub fn add(&mut self, sprite: &Sprite) {
        self.renderer.add(sprite);
    }

    pub fn extend(&mut self, sprites: &[Sprite]) {
        self.renderer.extend(sprites);
    }

    /// Switch blend mode, drawing queued sprites first.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.renderer.set_blend_mode(mode, self.device, self.hooks);
    }

    pub fn set_sort_order(&mut self, order: Option<SortOrder>) {
        self.renderer.set_sort_order(order);
    }

    /// Switch to a `width` x `height` viewport, drawing queued sprites first.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.renderer.set_viewport(width, height, self.device, self.hooks);
    }

    pub fn pending(&self) -> usize {
        self.renderer.pending()
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.renderer.blend_mode()
    }

    /// Draw everything queued so far.
    pub fn flush(&mut self) -> usize {
        self.renderer.flush(self.device, self.hooks)
    }

    /// Flush and release the borrows.
    pub fn finish(mut self) -> usize {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::math::TexelRect;
    use crate::sprite::IndexFormat;
    use crate::sprite::headless::{Command, HeadlessDevice};
    use crate::sprite::{BlendState, SamplerHooks};

    fn sprite(layer: u32, state: u32) -> Sprite {
        Sprite {
            source: TexelRect::full(8, 8),
            texture_width: 8,
            texture_height: 8,
            layer_depth: layer,
            render_state: state,
            ..Sprite::default()
        }
    }

    fn setup(config: RendererConfig) -> (SpriteRenderer, HeadlessDevice) {
        let renderer = SpriteRenderer::new(&config).unwrap();
        let device = HeadlessDevice::for_effect(renderer.effect());
        (renderer, device)
    }

    fn blends(device: &HeadlessDevice) -> Vec<BlendState> {
        device
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetBlend(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn flush_sorts_and_draws() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        renderer.extend(&[sprite(1, 4), sprite(9, 4), sprite(1, 2)]);
        assert_eq!(renderer.pending(), 3);

        assert_eq!(renderer.flush(&mut device, &mut SamplerHooks), 3);
        assert_eq!(renderer.pending(), 0);
        // Back to front: layer 9 first, then layer 1 by state.
        assert_eq!(device.draws(), vec![(0, 6), (6, 6), (12, 6)]);

        let stats = renderer.take_stats();
        assert_eq!(stats.sprites, 3);
        assert_eq!(stats.draw_calls, 3);
    }

    #[test]
    fn flush_without_sprites_does_nothing() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        assert_eq!(renderer.flush(&mut device, &mut SamplerHooks), 0);
        assert_eq!(device.commands().len(), 2);
    }

    #[test]
    fn blend_change_flushes_queued_sprites_first() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        renderer.add(&sprite(0, 1));
        renderer.set_blend_mode(BlendMode::Additive, &mut device, &mut SamplerHooks);
        assert_eq!(renderer.pending(), 0);
        assert_eq!(device.draws().len(), 1);

        renderer.add(&sprite(0, 1));
        renderer.flush(&mut device, &mut SamplerHooks);

        assert_eq!(blends(&device), vec![BlendMode::Alpha.state(), BlendMode::Additive.state()]);
        assert_eq!(renderer.blend_mode(), BlendMode::Additive);
    }

    #[test]
    fn same_blend_mode_does_not_flush() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        renderer.add(&sprite(0, 1));
        renderer.set_blend_mode(BlendMode::Alpha, &mut device, &mut SamplerHooks);
        assert_eq!(renderer.pending(), 1);
        assert!(device.draws().is_empty());
    }

    #[test]
    fn viewport_change_flushes() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        renderer.add(&sprite(0, 0));
        renderer.set_viewport(320, 200, &mut device, &mut SamplerHooks);
        assert_eq!(renderer.pending(), 0);
        assert_eq!(*renderer.effect().projection(), crate::math::ortho_projection(320, 200));
    }

    #[test]
    fn viewport_change_keeps_earlier_draws_on_old_projection() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        let mut hooks = SamplerHooks;
        let mut frame = SpriteFrame::new(&mut renderer, &mut device, &mut hooks);
        frame.set_viewport(800, 600);
        frame.add(&sprite(0, 0));
        frame.set_viewport(400, 300);
        frame.add(&sprite(0, 0));
        frame.finish();

        let order: Vec<_> = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetProjection(m) => Some(Some(*m)),
                Command::Draw { .. } => Some(None),
                _ => None,
            })
            .collect();
        assert_eq!(
            order,
            vec![
                Some(crate::math::ortho_projection(800, 600)),
                None,
                Some(crate::math::ortho_projection(400, 300)),
                None,
            ]
        );
    }

    #[test]
    fn rejects_configs_that_overflow_indices() {
        let config = RendererConfig {
            max_quads: 20_000,
            index_format: IndexFormat::U16,
            ..RendererConfig::default()
        };
        assert!(matches!(SpriteRenderer::new(&config), Err(Error::Config(_))));

        let config = RendererConfig {
            max_quads: 0,
            ..RendererConfig::default()
        };
        assert!(matches!(SpriteRenderer::new(&config), Err(Error::Config(_))));

        let config = RendererConfig {
            max_quads: 20_000,
            index_format: IndexFormat::U32,
            ..RendererConfig::default()
        };
        assert_eq!(SpriteRenderer::new(&config).unwrap().effect().max_quads(), 20_000);
    }

    #[test]
    fn unsorted_keeps_submission_order() {
        let config = RendererConfig {
            sort_order: None,
            ..RendererConfig::default()
        };
        let (mut renderer, mut device) = setup(config);
        renderer.extend(&[sprite(0, 2), sprite(5, 1), sprite(0, 2)]);
        renderer.flush(&mut device, &mut SamplerHooks);
        let binds: Vec<u32> = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::BindSampler { texture, .. } => Some(*texture),
                _ => None,
            })
            .collect();
        assert_eq!(binds, vec![2, 1, 2]);
    }

    #[test]
    fn frame_forwards_to_renderer() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        let mut hooks = SamplerHooks;
        let mut frame = SpriteFrame::new(&mut renderer, &mut device, &mut hooks);
        frame.add(&sprite(0, 3));
        frame.set_blend_mode(BlendMode::Premultiplied);
        frame.add(&sprite(0, 3));
        assert_eq!(frame.blend_mode(), BlendMode::Premultiplied);
        assert_eq!(frame.pending(), 1);
        assert_eq!(frame.finish(), 1);
        assert_eq!(device.draws().len(), 2);
    }

    #[test]
    fn frame_viewport_uses_new_projection_for_later_sprites() {
        let (mut renderer, mut device) = setup(RendererConfig::default());
        let mut hooks = SamplerHooks;
        let mut frame = SpriteFrame::new(&mut renderer, &mut device, &mut hooks);
        frame.set_viewport(640, 480);
        frame.add(&sprite(0, 0));
        frame.finish();

        let projections: Vec<_> = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetProjection(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(projections, vec![crate::math::ortho_projection(640, 480)]);
    }
}
