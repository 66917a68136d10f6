use std::time::{Duration, Instant};

pub struct Time {
    start: Instant,
    last: Instant,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, delta: Duration::from_secs_f32(0.0) }
    }

    pub fn tick(&mut self, now: Instant) {
        self.delta = now - self.last;
        self.last = now;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock gate that caps how often the render loop runs a full tick.
/// Early ticks are dropped outright rather than deferred, so a slow frame
/// never produces a burst of catch-up ticks afterwards.
pub struct FrameThrottle {
    target_interval: Duration,
    last_executed: Option<Instant>,
}

impl FrameThrottle {
    pub fn from_fps(fps_cap: u32) -> Self {
        let fps = fps_cap.max(1);
        Self { target_interval: Duration::from_secs_f64(1.0 / fps as f64), last_executed: None }
    }

    pub fn should_run(&mut self, now: Instant) -> bool {
        match self.last_executed {
            Some(last) if now.duration_since(last) < self.target_interval => false,
            _ => {
                self.last_executed = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_executed = None;
    }
}
