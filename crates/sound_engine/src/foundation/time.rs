//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-interval accumulator for work that runs at a steady rate
/// independent of the frame rate (e.g. middleware pumping at 60 Hz).
pub struct FixedStep {
    interval: f32,
    accumulator: f32,
}

impl FixedStep {
    /// Create an accumulator firing every `interval` seconds
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            accumulator: 0.0,
        }
    }

    /// Create an accumulator firing `hz` times per second
    pub fn from_hz(hz: f32) -> Self {
        Self::new(1.0 / hz)
    }

    /// Accumulate `delta_time`; returns `true` if the interval elapsed.
    ///
    /// The accumulator is reset rather than carried over, matching a
    /// "at most once per interval" contract.
    pub fn tick(&mut self, delta_time: f32) -> bool {
        self.accumulator += delta_time;
        if self.accumulator >= self.interval {
            self.accumulator = 0.0;
            true
        } else {
            false
        }
    }

    /// Get the configured interval in seconds
    pub fn interval(&self) -> f32 {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_fires_after_interval() {
        let mut step = FixedStep::new(1.0 / 60.0);
        assert!(!step.tick(0.010));
        assert!(step.tick(0.010)); // 20 ms accumulated
    }

    #[test]
    fn test_fixed_step_resets_after_firing() {
        let mut step = FixedStep::new(0.1);
        assert!(step.tick(0.2));
        assert!(!step.tick(0.05));
    }

    #[test]
    fn test_from_hz() {
        let step = FixedStep::from_hz(60.0);
        assert!((step.interval() - 1.0 / 60.0).abs() < 1e-6);
    }
}
