//! Frame timing.
//!
//! [`Time`] is advanced once per frame by the runner. Game code reads the
//! frame delta for movement and the smoothed frame rate for display; the
//! diagnostics stream reports both.

use std::time::{Duration, Instant};

/// Weight of the newest frame in the smoothed frame rate.
const FPS_SMOOTHING: f32 = 0.1;

/// Frame clock.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    startup: Instant,
    frame_start: Instant,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
    smoothed_fps: f32,
}

impl Time {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            startup: now,
            frame_start: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            smoothed_fps: 0.0,
        }
    }

    /// Start a new frame.
    pub fn update(&mut self) {
        self.tick(Instant::now());
    }

    fn tick(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.frame_start);
        self.frame_start = now;
        self.elapsed = now.saturating_duration_since(self.startup);
        self.frame_count += 1;

        let secs = self.delta.as_secs_f32();
        if secs > 0.0 {
            let fps = 1.0 / secs;
            self.smoothed_fps = if self.smoothed_fps == 0.0 {
                fps
            } else {
                self.smoothed_fps + (fps - self.smoothed_fps) * FPS_SMOOTHING
            };
        }
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Frames started so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frame rate averaged over roughly the last ten frames.
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_tracks_delta_and_elapsed() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.tick(start + Duration::from_millis(16));
        time.tick(start + Duration::from_millis(36));
        assert_eq!(time.delta(), Duration::from_millis(20));
        assert_eq!(time.elapsed(), Duration::from_millis(36));
        assert_eq!(time.frame_count(), 2);
    }

    #[test]
    fn fps_is_smoothed() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.tick(start + Duration::from_millis(10));
        assert!((time.fps() - 100.0).abs() < 0.01);
        time.tick(start + Duration::from_millis(30));
        // 100 + (50 - 100) * 0.1
        assert!((time.fps() - 95.0).abs() < 0.01);
    }

    #[test]
    fn zero_delta_leaves_fps_alone() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.tick(start);
        assert_eq!(time.fps(), 0.0);
    }
}
