//! Sort comparators over the order array.
//!
//! Sorting is indirect: the comparators look up [`SortKey`]s by quad index
//! and only the `u32` order array is permuted. Every order is total (ties
//! fall back to the quad index), so an unstable sort gives the same result
//! as a stable one.

use std::cmp::Ordering;

use super::quad::SortKey;

/// Which total order to draw a batch in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Painter's algorithm: deepest layer first, then render state, then
    /// submission order.
    BackToFront,
    /// Nearest layer first, then render state. Equal keys draw in reverse
    /// submission order.
    FrontToBack,
    /// Render state only, ignoring depth. Fewest state changes, no layering.
    ByRenderState,
}

impl SortOrder {
    /// Compare the quads at indices `a` and `b`.
    pub fn compare(self, keys: &[SortKey], a: u32, b: u32) -> Ordering {
        let ka = &keys[a as usize];
        let kb = &keys[b as usize];
        match self {
            SortOrder::BackToFront => kb
                .layer_depth
                .cmp(&ka.layer_depth)
                .then(ka.render_state.cmp(&kb.render_state))
                .then(a.cmp(&b)),
            SortOrder::FrontToBack => ka
                .layer_depth
                .cmp(&kb.layer_depth)
                .then(ka.render_state.cmp(&kb.render_state))
                .then(b.cmp(&a)),
            SortOrder::ByRenderState => ka.render_state.cmp(&kb.render_state).then(a.cmp(&b)),
        }
    }

    /// Reorder `order` in place.
    pub fn sort(self, keys: &[SortKey], order: &mut [u32]) {
        order.sort_unstable_by(|&a, &b| self.compare(keys, a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(layer_depth: u32, render_state: u32) -> SortKey {
        SortKey { layer_depth, render_state }
    }

    fn sorted(order: SortOrder, keys: &[SortKey]) -> Vec<u32> {
        let mut ids: Vec<u32> = (0..keys.len() as u32).collect();
        order.sort(keys, &mut ids);
        ids
    }

    #[test]
    fn back_to_front_deepest_first() {
        let keys = [key(1, 0), key(3, 5), key(3, 2), key(1, 0), key(2, 9)];
        assert_eq!(sorted(SortOrder::BackToFront, &keys), vec![2, 1, 4, 0, 3]);
    }

    #[test]
    fn front_to_back_reverses_ties() {
        let keys = [key(1, 0), key(3, 5), key(3, 2), key(1, 0), key(2, 9)];
        assert_eq!(sorted(SortOrder::FrontToBack, &keys), vec![3, 0, 4, 2, 1]);
    }

    #[test]
    fn by_render_state_ignores_depth() {
        let keys = [key(9, 2), key(0, 1), key(5, 2), key(1, 1)];
        assert_eq!(sorted(SortOrder::ByRenderState, &keys), vec![1, 3, 0, 2]);
    }

    #[test]
    fn orders_are_total() {
        let keys = [key(4, 4), key(4, 4), key(4, 4)];
        for order in [SortOrder::BackToFront, SortOrder::FrontToBack, SortOrder::ByRenderState] {
            for a in 0..3u32 {
                for b in 0..3u32 {
                    assert_eq!(order.compare(&keys, a, b) == Ordering::Equal, a == b);
                }
            }
        }
    }

    #[test]
    fn parses_snake_case() {
        let order: SortOrder = serde_json::from_str("\"back_to_front\"").unwrap();
        assert_eq!(order, SortOrder::BackToFront);
    }
}
