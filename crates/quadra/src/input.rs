//! Keyboard state for game code.
//!
//! [`Input`] tracks which keys are held, and which went down or up since the
//! previous frame. The runner feeds it from window events and clears the
//! per-frame sets after each update.

use std::collections::HashSet;
use std::hash::Hash;

#[cfg(feature = "window")]
pub use winit::event::MouseButton;
#[cfg(feature = "window")]
pub use winit::keyboard::KeyCode;

/// Held / just-pressed / just-released sets over some key type.
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Held down right now.
    pub fn pressed(&self, key: T) -> bool {
        self.pressed.contains(&key)
    }

    /// Went down this frame.
    pub fn just_pressed(&self, key: T) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Went up this frame.
    pub fn just_released(&self, key: T) -> bool {
        self.just_released.contains(&key)
    }

    /// True if any of `keys` is held.
    pub fn any_pressed(&self, keys: impl IntoIterator<Item = T>) -> bool {
        keys.into_iter().any(|k| self.pressed(k))
    }

    /// `+1.0` while only `positive` is held, `-1.0` while only `negative`
    /// is, `0.0` otherwise.
    pub fn axis(&self, negative: T, positive: T) -> f32 {
        match (self.pressed(negative), self.pressed(positive)) {
            (false, true) => 1.0,
            (true, false) => -1.0,
            _ => 0.0,
        }
    }

    pub(crate) fn press(&mut self, key: T) {
        // Key repeat sends press again while held; only the first counts.
        if self.pressed.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub(crate) fn release(&mut self, key: T) {
        if self.pressed.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Forget this frame's edges.
    pub(crate) fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        Left,
        Right,
        Fire,
    }

    #[test]
    fn press_release_edges() {
        let mut input = Input::new();
        input.press(Key::Fire);
        assert!(input.pressed(Key::Fire) && input.just_pressed(Key::Fire));

        input.end_frame();
        input.press(Key::Fire);
        assert!(input.pressed(Key::Fire));
        assert!(!input.just_pressed(Key::Fire));

        input.release(Key::Fire);
        assert!(!input.pressed(Key::Fire) && input.just_released(Key::Fire));
        input.end_frame();
        assert!(!input.just_released(Key::Fire));
    }

    #[test]
    fn axis_cancels_out() {
        let mut input = Input::new();
        assert_eq!(input.axis(Key::Left, Key::Right), 0.0);
        input.press(Key::Right);
        assert_eq!(input.axis(Key::Left, Key::Right), 1.0);
        input.press(Key::Left);
        assert_eq!(input.axis(Key::Left, Key::Right), 0.0);
        input.release(Key::Right);
        assert_eq!(input.axis(Key::Left, Key::Right), -1.0);
        assert!(input.any_pressed([Key::Fire, Key::Left]));
    }
}
