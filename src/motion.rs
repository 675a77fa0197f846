use std::time::{Duration, Instant};

/// Shortest interval a motion sample may span; keeps the velocity finite.
pub const MIN_ELAPSED: Duration = Duration::from_millis(1);

/// Turns relative mouse deltas into velocities (units per second) using the
/// wall-clock time since the previous motion sample.
#[derive(Debug, Clone)]
pub struct MotionNormalizer {
    last_sample: Instant,
}

impl MotionNormalizer {
    pub fn new(now: Instant) -> Self {
        Self { last_sample: now }
    }

    /// Records a sample at `now` and returns the elapsed seconds since the
    /// previous one, floored at [`MIN_ELAPSED`].
    pub fn sample(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last_sample).max(MIN_ELAPSED);
        self.last_sample = now;
        elapsed.as_secs_f32()
    }

    /// Velocity of `(dx, dy)` over the time since the previous sample.
    pub fn velocity(&mut self, dx: i32, dy: i32, now: Instant) -> (f32, f32) {
        let elapsed = self.sample(now);
        (dx as f32 / elapsed, dy as f32 / elapsed)
    }

    pub fn last_sample(&self) -> Instant {
        self.last_sample
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_sample)
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_sample = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_over_ten_millis() {
        let start = Instant::now();
        let mut motion = MotionNormalizer::new(start);
        let (vx, vy) = motion.velocity(50, -20, start + Duration::from_millis(10));
        assert!((vx - 5000.0).abs() < 1.0, "vx = {}", vx);
        assert!((vy + 2000.0).abs() < 1.0, "vy = {}", vy);
    }

    #[test]
    fn same_instant_is_floored() {
        let start = Instant::now();
        let mut motion = MotionNormalizer::new(start);
        let elapsed = motion.sample(start);
        assert!((elapsed - 0.001).abs() < 1e-6);

        let (vx, _) = motion.velocity(3, 0, start);
        assert!(vx.is_finite());
        assert!((vx - 3000.0).abs() < 1.0);
    }

    #[test]
    fn clock_going_backwards_is_floored() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut motion = MotionNormalizer::new(start);
        let elapsed = motion.sample(start - Duration::from_millis(500));
        assert!((elapsed - 0.001).abs() < 1e-6);
    }

    #[test]
    fn idle_time_tracks_last_sample() {
        let start = Instant::now();
        let mut motion = MotionNormalizer::new(start);
        motion.sample(start + Duration::from_millis(5));
        assert_eq!(motion.idle_for(start + Duration::from_millis(25)), Duration::from_millis(20));
    }
}
