//! # Batch — The Per-Frame Sprite Store
//!
//! A [`SpriteBatch`] owns three parallel arrays that always share one length:
//!
//! ```text
//!  index:   0        1        2        3   ...  count ... capacity
//!  quads:  [Quad]   [Quad]   [Quad]   [Quad]     (56 B each)
//!  keys:   [Key]    [Key]    [Key]    [Key]      ( 8 B each)
//!  order:  [ 2 ]    [ 0 ]    [ 3 ]    [ 1 ]      ( 4 B each)
//!            │        │
//!            └────────┴──── draw order, a permutation of 0..count
//! ```
//!
//! Slots `0..count` are live. Slots past `count` keep whatever the previous
//! frame left there and are overwritten before they are read again.
//!
//! ## Design Decisions
//!
//! **Grow, never shrink.** [`SpriteBatch::ensure`] at least doubles the
//! capacity whenever it has to grow, so a frame that queues sprites one at a
//! time still reallocates only O(log n) times. A game's sprite count settles
//! quickly, after which no frame allocates.
//!
//! **Flush is just `count = 0`.** The arrays stay allocated for the next frame.

use std::cmp::Ordering;

use super::Sprite;
use super::quad::{Quad, SortKey, generate_quads};
use super::sort::SortOrder;

/// Quads, sort keys, and the draw order for one frame's sprites.
#[derive(Debug, Default)]
pub struct SpriteBatch {
    quads: Vec<Quad>,
    keys: Vec<SortKey>,
    order: Vec<u32>,
    count: usize,
}

impl SpriteBatch {
    /// Create a batch with room for `capacity` quads.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut batch = Self::default();
        batch.ensure(capacity);
        batch
    }

    /// Number of live quads.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of quads the arrays hold without growing.
    pub fn capacity(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Make room for at least `n` quads. Grows to `max(n, 2 * capacity)`;
    /// never shrinks.
    pub fn ensure(&mut self, n: usize) {
        let capacity = self.capacity();
        if n <= capacity {
            return;
        }
        let new_capacity = n.max(capacity * 2);
        self.quads.resize(new_capacity, Quad::default());
        self.keys.resize(new_capacity, SortKey::default());
        self.order.resize(new_capacity, 0);
        log::debug!("sprite batch grown: {capacity} -> {new_capacity} quads");
    }

    /// Append one sprite.
    pub fn add(&mut self, sprite: &Sprite) {
        self.extend(std::slice::from_ref(sprite));
    }

    /// Append many sprites. Their order slots start out as identity.
    pub fn extend(&mut self, sprites: &[Sprite]) {
        if sprites.is_empty() {
            return;
        }
        let start = self.count;
        self.ensure(start + sprites.len());
        generate_quads(&mut self.quads, &mut self.keys, &mut self.order, start, sprites);
        self.count += sprites.len();
    }

    /// Drop every live quad; capacity is kept.
    pub fn flush(&mut self) {
        self.count = 0;
    }

    /// Reorder the live part of the order array.
    pub fn sort(&mut self, order: SortOrder) {
        order.sort(&self.keys, &mut self.order[..self.count]);
    }

    /// Reorder the live part of the order array with a custom comparator
    /// over `(keys, a, b)`.
    pub fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&[SortKey], u32, u32) -> Ordering,
    {
        let keys = &self.keys;
        self.order[..self.count].sort_by(|&a, &b| cmp(keys, a, b));
    }

    /// Live quads, in submission order.
    pub fn quads(&self) -> &[Quad] {
        &self.quads[..self.count]
    }

    /// Live sort keys, in submission order.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys[..self.count]
    }

    /// Live draw order.
    pub fn order(&self) -> &[u32] {
        &self.order[..self.count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TexelRect;

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

    #[test]
    fn ensure_grows_geometrically_and_never_shrinks() {
        let mut batch = SpriteBatch::with_capacity(4);
        assert_eq!(batch.capacity(), 4);

        batch.ensure(5);
        assert_eq!(batch.capacity(), 8);

        batch.ensure(100);
        assert_eq!(batch.capacity(), 100);

        batch.ensure(3);
        assert_eq!(batch.capacity(), 100);

        batch.flush();
        assert_eq!(batch.capacity(), 100);
    }

    #[test]
    fn capacity_is_monotonic_over_random_adds() {
        let mut batch = SpriteBatch::with_capacity(1);
        let mut last = batch.capacity();
        for round in 0..50usize {
            let n = (round * 7) % 13;
            let sprites = vec![sprite(0, 0); n];
            batch.extend(&sprites);
            assert!(batch.capacity() >= last);
            assert!(batch.capacity() >= batch.count());
            last = batch.capacity();
            if round % 5 == 4 {
                batch.flush();
            }
        }
    }

    #[test]
    fn add_appends_with_identity_order() {
        let mut batch = SpriteBatch::default();
        batch.add(&sprite(0, 1));
        batch.extend(&[sprite(0, 2), sprite(0, 3)]);
        assert_eq!(batch.count(), 3);
        assert_eq!(batch.order(), &[0, 1, 2]);
        assert_eq!(batch.keys()[2].render_state, 3);
    }

    #[test]
    fn flush_resets_count_and_reuses_slots() {
        let mut batch = SpriteBatch::default();
        batch.extend(&[sprite(0, 1), sprite(0, 2)]);
        batch.flush();
        assert!(batch.is_empty());
        batch.add(&sprite(0, 9));
        assert_eq!(batch.keys(), &[SortKey { layer_depth: 0, render_state: 9 }]);
        assert_eq!(batch.order(), &[0]);
    }

    #[test]
    fn sort_moves_only_order() {
        let mut batch = SpriteBatch::default();
        batch.extend(&[sprite(1, 0), sprite(5, 0), sprite(3, 0)]);
        let quads_before = batch.quads().to_vec();

        batch.sort(SortOrder::BackToFront);
        assert_eq!(batch.order(), &[1, 2, 0]);
        assert_eq!(batch.quads(), &quads_before[..]);

        batch.sort_by(|keys, a, b| keys[a as usize].layer_depth.cmp(&keys[b as usize].layer_depth));
        assert_eq!(batch.order(), &[0, 2, 1]);
    }
}
