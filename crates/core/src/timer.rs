//! Frame timing utilities.

use std::time::{Duration, Instant};

/// Monotonic timer used for frame pacing statistics.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
}

impl Timer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
        }
    }

    /// Total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in seconds since the timer was created.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Time elapsed since the last call to `tick()`.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta
    }

    /// Delta time in seconds since the last tick.
    pub fn delta_secs(&mut self) -> f32 {
        self.tick().as_secs_f32()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_secs_advances() {
        let timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        let first = timer.elapsed_secs();
        assert!(first > 0.0);
        // Monotonic: a later reading is never smaller
        assert!(timer.elapsed_secs() >= first);
    }

    #[test]
    fn test_tick_resets_delta() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        let first = timer.delta_secs();
        let second = timer.delta_secs();
        assert!(first > 0.0);
        assert!(second < first);
    }
}
