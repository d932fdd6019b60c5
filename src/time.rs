//! Frame clock for the render loop.
//!
//! Wall-clock deltas are handed to the integrator as-is unless a maximum is
//! configured. A long stall (window drag, debugger) then produces one large
//! step, which the spring system may not survive; see
//! [`ClothConfig::with_max_delta_time`](crate::config::ClothConfig::with_max_delta_time).
//!
//! # Example
//!
//! ```ignore
//! use drape::time::FrameClock;
//!
//! let mut clock = FrameClock::new(Some(1.0 / 30.0));
//!
//! // In your render loop:
//! let delta_time = clock.tick();
//! println!("Frame {} at {:.1} FPS", clock.frame(), clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Bound a raw delta to `[0, max]` when a maximum is set.
#[inline]
pub fn clamp_delta(raw: f32, max: Option<f32>) -> f32 {
    match max {
        Some(max) => raw.clamp(0.0, max.max(0.0)),
        None => raw,
    }
}

/// Delta, elapsed time and FPS tracking.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    /// Total elapsed time in seconds.
    elapsed_secs: f32,
    /// Time since last frame in seconds, after clamping.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
    /// Upper bound applied to every delta.
    max_delta: Option<f32>,
}

impl FrameClock {
    /// Create a clock starting from now.
    pub fn new(max_delta: Option<f32>) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_secs(1),
            max_delta,
        }
    }

    /// Advance one frame and return the delta time to simulate.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = clamp_delta(raw_delta, self.max_delta);
        self.last_frame = now;
        self.elapsed_secs = now.duration_since(self.start).as_secs_f32();
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Total elapsed time in seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Delta of the last [`tick`](Self::tick).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last measurement window.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Frame count at which the FPS value was last refreshed. Changes at
    /// most once per second.
    #[inline]
    pub fn fps_generation(&self) -> u64 {
        self.fps_frame_count
    }

    #[inline]
    pub fn max_delta(&self) -> Option<f32> {
        self.max_delta
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::default();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.delta(), 0.0);
        assert!(clock.max_delta().is_none());
    }

    #[test]
    fn test_clock_tick() {
        let mut clock = FrameClock::new(None);
        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();

        assert!(delta > 0.0);
        assert!(clock.elapsed() > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_clock_clamps_stall() {
        let mut clock = FrameClock::new(Some(0.005));
        thread::sleep(Duration::from_millis(50));
        let delta = clock.tick();

        assert!(delta <= 0.005);
        assert!(clock.elapsed() >= 0.05);
    }

    #[test]
    fn test_clamp_delta() {
        assert_eq!(clamp_delta(0.5, None), 0.5);
        assert_eq!(clamp_delta(0.5, Some(0.1)), 0.1);
        assert_eq!(clamp_delta(0.01, Some(0.1)), 0.01);
        assert_eq!(clamp_delta(-1.0, Some(0.1)), 0.0);
    }
}
