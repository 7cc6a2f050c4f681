//! # Draw — Turning a Sorted Batch Into Draw Calls
//!
//! [`SpriteEffect::draw_batch`] walks the batch's order array in chunks that
//! fit the GPU buffers. Within each chunk, consecutive quads that share a
//! render state are drawn with a single indexed draw:
//!
//! ```text
//!  order:   q7  q2  q9  q4  q1  q0  q3
//!  state:    A   A   A   B   B   A   A
//!           └────┬────┘ └──┬──┘ └──┬──┘
//!  draws:     draw 18     draw 12   draw 12
//!  hooks:   apply(A)    apply(B)  apply(A)
//! ```
//!
//! The render state applied last is remembered across chunks, so a run that
//! straddles an orphan boundary is split into two draws but applied once.
//!
//! ## Hooks
//!
//! The pipeline never interprets render-state values. [`EffectHooks::apply`]
//! is called at every run boundary to bind whatever the value stands for,
//! typically a texture. [`EffectHooks::setup`] runs once per batch.

use super::batch::SpriteBatch;
use super::device::StreamDevice;
use super::effect::{DrawPhase, SpriteEffect};

/// Caller-supplied callbacks invoked while a batch is drawn.
pub trait EffectHooks {
    /// Called once at the start of every batch. The default binds the
    /// streaming buffers, then applies the blend state and projection.
    fn setup(&mut self, effect: &SpriteEffect, device: &mut dyn StreamDevice) {
        effect.bind_buffers(device);
        effect.apply_blend_state(device);
        effect.apply_projection(device);
    }

    /// Called whenever the render state changes between consecutive quads.
    fn apply(&mut self, effect: &SpriteEffect, device: &mut dyn StreamDevice, render_state: u32);
}

/// Hooks that treat the render state as a texture handle and bind it to
/// sampler unit 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplerHooks;

impl EffectHooks for SamplerHooks {
    fn apply(&mut self, _effect: &SpriteEffect, device: &mut dyn StreamDevice, render_state: u32) {
        device.bind_sampler(0, render_state);
    }
}

impl SpriteEffect {
    /// Stream and draw every live quad of `batch`, in its current order.
    pub fn draw_batch(
        &mut self,
        batch: &SpriteBatch,
        device: &mut dyn StreamDevice,
        hooks: &mut dyn EffectHooks,
    ) {
        hooks.setup(self, device);
        self.current_state = None;

        let mut offset = 0;
        let mut remaining = batch.count();
        while remaining > 0 {
            let buffered = self.buffer_data(device, batch.quads(), batch.order(), offset, remaining);
            if buffered.count == 0 {
                log::error!("sprite effect buffered nothing; dropping {remaining} quads");
                break;
            }
            self.draw_region(batch, offset, buffered.count, buffered.base_index, device, hooks);
            offset += buffered.count;
            remaining -= buffered.count;
        }
        self.phase = DrawPhase::NotDrawing;
    }

    /// Draw `count` already-buffered quads, `order[offset..]`, whose indices
    /// start at `base_index`. One draw call per run of equal render state.
    pub fn draw_region(
        &mut self,
        batch: &SpriteBatch,
        offset: usize,
        count: usize,
        base_index: u32,
        device: &mut dyn StreamDevice,
        hooks: &mut dyn EffectHooks,
    ) {
        self.phase = DrawPhase::DrawingRun;

        let keys = batch.keys();
        let ids = &batch.order()[offset..offset + count];
        let mut first_index = base_index;
        let mut run_start = 0;

        for (i, &id) in ids.iter().enumerate() {
            let state = keys[id as usize].render_state;
            if self.current_state == Some(state) {
                continue;
            }
            if i > run_start {
                first_index = self.issue_draw(device, first_index, i - run_start);
            }
            hooks.apply(self, device, state);
            self.stats.state_changes += 1;
            self.current_state = Some(state);
            run_start = i;
        }
        if count > run_start {
            self.issue_draw(device, first_index, count - run_start);
        }
    }

    /// Draw `quads` quads starting at `first_index`; returns the index
    /// following the last one drawn.
    fn issue_draw(&mut self, device: &mut dyn StreamDevice, first_index: u32, quads: usize) -> u32 {
        let index_count = (quads * 6) as u32;
        log::trace!("draw run: {quads} quads from index {first_index}");
        device.draw_indexed(self.index_format(), first_index, index_count);
        self.stats.draw_calls += 1;
        first_index + index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TexelRect;
    use crate::sprite::headless::{Command, HeadlessDevice};
    use crate::sprite::vertex::{IndexFormat, quad_vertices};
    use crate::sprite::{Quad, SortOrder, Sprite};

    /// Records every hook call.
    #[derive(Default)]
    struct Recorder {
        setups: usize,
        applied: Vec<u32>,
    }

    impl EffectHooks for Recorder {
        fn setup(&mut self, effect: &SpriteEffect, device: &mut dyn StreamDevice) {
            self.setups += 1;
            effect.bind_buffers(device);
        }

        fn apply(&mut self, _effect: &SpriteEffect, _device: &mut dyn StreamDevice, render_state: u32) {
            self.applied.push(render_state);
        }
    }

    fn sprite(x: f32, layer: u32, state: u32) -> Sprite {
        Sprite {
            source: TexelRect::full(16, 16),
            texture_width: 16,
            texture_height: 16,
            layer_depth: layer,
            render_state: state,
            ..Sprite::default()
        }
        .at(x, 0.0)
    }

    fn batch_with_states(states: &[u32]) -> SpriteBatch {
        let sprites: Vec<Sprite> = states
            .iter()
            .enumerate()
            .map(|(i, &s)| sprite(i as f32, 0, s))
            .collect();
        let mut batch = SpriteBatch::default();
        batch.extend(&sprites);
        batch
    }

    #[test]
    fn one_draw_per_run() {
        let batch = batch_with_states(&[1, 1, 1, 2, 2, 1, 1]);
        let mut effect = SpriteEffect::new(64, IndexFormat::U16);
        let mut device = HeadlessDevice::for_effect(&effect);
        let mut hooks = Recorder::default();

        effect.draw_batch(&batch, &mut device, &mut hooks);

        assert_eq!(hooks.setups, 1);
        assert_eq!(hooks.applied, vec![1, 2, 1]);
        assert_eq!(device.draws(), vec![(0, 18), (18, 12), (30, 12)]);
        assert_eq!(effect.phase(), DrawPhase::NotDrawing);
        assert_eq!(effect.current_state(), Some(1));
    }

    #[test]
    fn draw_count_equals_run_count() {
        let states = [5, 5, 3, 3, 3, 5, 9, 9, 9, 9, 3];
        let batch = batch_with_states(&states);
        let mut effect = SpriteEffect::new(64, IndexFormat::U32);
        let mut device = HeadlessDevice::for_effect(&effect);
        effect.draw_batch(&batch, &mut device, &mut SamplerHooks);

        let runs = 1 + states.windows(2).filter(|w| w[0] != w[1]).count();
        let draws = device.draws();
        assert_eq!(draws.len(), runs);
        assert_eq!(draws.iter().map(|d| d.1).sum::<u32>(), states.len() as u32 * 6);

        let sampler_binds: Vec<u32> = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::BindSampler { unit: 0, texture } => Some(*texture),
                _ => None,
            })
            .collect();
        assert_eq!(sampler_binds, vec![5, 3, 5, 9, 3]);
    }

    #[test]
    fn default_setup_binds_blend_and_projection() {
        let batch = batch_with_states(&[0]);
        let mut effect = SpriteEffect::new(4, IndexFormat::U16);
        effect.set_viewport(100, 100);
        let mut device = HeadlessDevice::for_effect(&effect);
        effect.draw_batch(&batch, &mut device, &mut SamplerHooks);

        let cmds = device.commands();
        assert!(matches!(cmds[2], Command::BindBuffers(IndexFormat::U16)));
        assert!(matches!(cmds[3], Command::SetBlend(_)));
        assert!(matches!(cmds[4], Command::SetProjection(m) if m == *effect.projection()));
    }

    #[test]
    fn chunks_across_orphan_keep_state_and_draw_everything() {
        let k = 4;
        let states: Vec<u32> = (0..k + 5).map(|i| if i < 6 { 7 } else { 8 }).collect();
        let batch = batch_with_states(&states);
        let mut effect = SpriteEffect::new(k, IndexFormat::U16);
        let mut device = HeadlessDevice::for_effect(&effect);
        let mut hooks = Recorder::default();

        effect.draw_batch(&batch, &mut device, &mut hooks);

        // Chunks of 4, 4, 1; state 7 runs across the first orphan.
        assert_eq!(hooks.applied, vec![7, 8]);
        assert_eq!(device.draws(), vec![(0, 24), (0, 12), (12, 12), (0, 6)]);
        assert_eq!(effect.take_stats().orphans, 2);

        let drawn = device.drawn_quads();
        assert_eq!(drawn.len(), k + 5);
        for (i, verts) in drawn.iter().enumerate() {
            assert_eq!(*verts, quad_vertices(&batch.quads()[i]));
        }
    }

    #[test]
    fn end_to_end_sorted_frame() {
        // Two sprites with texture A at depth 5, one with texture B at depth 3.
        let sprites = [sprite(0.0, 5, 1), sprite(10.0, 3, 2), sprite(20.0, 5, 1)];
        let mut batch = SpriteBatch::default();
        batch.extend(&sprites);
        batch.sort(SortOrder::BackToFront);
        assert_eq!(batch.order(), &[0, 2, 1]);

        let mut effect = SpriteEffect::new(1024, IndexFormat::U16);
        let mut device = HeadlessDevice::for_effect(&effect);
        let mut hooks = Recorder::default();
        effect.draw_batch(&batch, &mut device, &mut hooks);

        assert_eq!(hooks.applied, vec![1, 2]);
        assert_eq!(device.draws(), vec![(0, 12), (12, 6)]);
        assert_eq!(effect.vertex_offset(), 12);
        assert_eq!(effect.index_offset(), 18);

        let expected: Vec<_> = [0usize, 2, 1]
            .iter()
            .map(|&i| quad_vertices(&Quad::from_sprite(&sprites[i])))
            .collect();
        assert_eq!(device.drawn_quads(), expected);

        let stats = effect.take_stats();
        assert_eq!((stats.draw_calls, stats.state_changes), (2, 2));
    }

    #[test]
    fn empty_batch_only_runs_setup() {
        let batch = SpriteBatch::default();
        let mut effect = SpriteEffect::new(4, IndexFormat::U16);
        let mut device = HeadlessDevice::for_effect(&effect);
        let mut hooks = Recorder::default();
        effect.draw_batch(&batch, &mut device, &mut hooks);
        assert_eq!(hooks.setups, 1);
        assert!(device.draws().is_empty());
        assert_eq!(effect.current_state(), None);
    }
}
