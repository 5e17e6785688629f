//! Frame timing.
//!
//! [`Time`] is the single source of truth for how much wall-clock time a
//! frame represents. It can follow the real clock (`update`) or be stepped
//! by hand (`advance`), which is how tests replay a spectacle
//! deterministically.
//!
//! # Example
//!
//! ```ignore
//! use glyphfall::time::Time;
//!
//! let mut time = Time::new();
//!
//! // In the host's frame callback:
//! let delta_ms = time.update();
//! sim.frame(delta_ms, Some(&mut surface));
//! ```

use std::time::{Duration, Instant};

/// Longest delta handed to the engine. A tab that was hidden for a minute
/// must not produce a one-minute physics step.
pub const MAX_DELTA_MS: f32 = 100.0;

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct Time {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Accumulated simulated time in milliseconds.
    elapsed_ms: f64,
    /// Delta of the most recent frame in milliseconds.
    delta_ms: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Elapsed time at last FPS update.
    fps_update_ms: f64,
    /// How often to update the FPS figure.
    fps_update_interval_ms: f64,
    /// Whether time is paused (host hidden).
    paused: bool,
    /// Fixed delta for deterministic updates.
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_ms: 0.0,
            fps_update_interval_ms: 500.0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Sample the real clock. Call once per frame.
    ///
    /// Returns the delta in milliseconds to hand to the engine.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        self.advance(raw)
    }

    /// Step time by hand. Returns the (scaled, clamped) delta in milliseconds.
    pub fn advance(&mut self, raw_delta_ms: f32) -> f32 {
        if self.paused {
            self.delta_ms = 0.0;
            return 0.0;
        }

        let delta = self.fixed_delta.unwrap_or(raw_delta_ms).clamp(0.0, MAX_DELTA_MS) * self.time_scale;
        self.delta_ms = delta;
        self.elapsed_ms += delta as f64;
        self.frame_count += 1;

        let since = self.elapsed_ms - self.fps_update_ms;
        if since >= self.fps_update_interval_ms {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = (frames as f64 * 1000.0 / since) as f32;
            self.fps_frame_count = self.frame_count;
            self.fps_update_ms = self.elapsed_ms;
        }

        delta
    }

    /// Total simulated time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Delta of the last frame in milliseconds.
    #[inline]
    pub fn delta_ms(&self) -> f32 {
        self.delta_ms
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Pause time progression. While paused every delta is 0.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after pausing. The paused interval is not replayed.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    /// Use a fixed delta instead of the measured one. `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta_ms: Option<f32>) {
        self.fixed_delta = delta_ms;
    }

    /// Set time scale multiplier. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Delta of the last frame as a `Duration`.
    #[inline]
    pub fn delta_duration(&self) -> Duration {
        Duration::from_secs_f32(self.delta_ms / 1000.0)
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
