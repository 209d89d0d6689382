//! Monotonic millisecond clock and the fixed-delay frame pacer.
//!
//! Frames are paced the simple way: after each iteration finishes, the next one
//! is scheduled a fixed `1000 / 60` ms later. There is no accumulator and no
//! catch-up; a slow frame just pushes every later frame back.

use std::time::{Duration, Instant};

pub const TARGET_FPS: u64 = 60;
pub const FRAME_DELAY_MS: u64 = 1000 / TARGET_FPS;

const FPS_SAMPLE_COUNT: usize = 60;
const MAX_FRAME_DT: f64 = 0.25;

/// Source of monotonic milliseconds. Readings never decrease.
pub trait MonotonicClock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn instant_at(&self, ms: u64) -> Instant {
        self.origin + Duration::from_millis(ms)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

pub struct FramePacer {
    pub frame_delay_ms: u64,
    pub max_dt: f64,
    pub frame_count: u64,
    /// Seconds between the starts of the last two frames.
    pub real_dt: f64,
    last_frame_ms: Option<u64>,
    next_frame_ms: u64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FramePacer {
    pub fn new() -> Self {
        Self {
            frame_delay_ms: FRAME_DELAY_MS,
            max_dt: MAX_FRAME_DT,
            frame_count: 0,
            real_dt: 0.0,
            last_frame_ms: None,
            next_frame_ms: 0,
            fps_samples: [1.0 / TARGET_FPS as f64; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: TARGET_FPS as f64,
            smoothed_frame_time_ms: 1000.0 / TARGET_FPS as f64,
        }
    }

    /// True once the delay after the previous frame has run out.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_frame_ms
    }

    /// Millisecond timestamp at which the next frame may start.
    pub fn next_frame_ms(&self) -> u64 {
        self.next_frame_ms
    }

    pub fn begin_frame(&mut self, now_ms: u64) {
        self.real_dt = match self.last_frame_ms {
            Some(last) => now_ms.saturating_sub(last) as f64 / 1000.0,
            None => self.frame_delay_ms as f64 / 1000.0,
        };
        self.last_frame_ms = Some(now_ms);
        self.frame_count += 1;

        // A stall (window drag, debugger) must not launch the actor across the screen.
        if self.real_dt > self.max_dt {
            log::warn!(
                "Frame took {:.1}ms, capping dt to {}ms",
                self.real_dt * 1000.0,
                self.max_dt * 1000.0
            );
            self.real_dt = self.max_dt;
        }

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// Schedule the next frame a fixed delay after this one finished.
    pub fn end_frame(&mut self, now_ms: u64) {
        self.next_frame_ms = now_ms + self.frame_delay_ms;
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct ManualClock(Cell<u64>);

    impl MonotonicClock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[test]
    fn frame_delay_is_sixty_hertz() {
        assert_eq!(FRAME_DELAY_MS, 16);
        assert_eq!(FramePacer::new().frame_delay_ms, 16);
    }

    #[test]
    fn first_frame_is_due_immediately() {
        let pacer = FramePacer::new();
        assert!(pacer.is_due(0));
    }

    #[test]
    fn next_frame_waits_fixed_delay_after_end() {
        let clock = ManualClock(Cell::new(100));
        let mut pacer = FramePacer::new();
        pacer.begin_frame(clock.now_ms());
        clock.0.set(110); // frame took 10ms
        pacer.end_frame(clock.now_ms());

        assert_eq!(pacer.next_frame_ms(), 126);
        assert!(!pacer.is_due(125));
        assert!(pacer.is_due(126));
    }

    #[test]
    fn real_dt_measures_frame_starts() {
        let mut pacer = FramePacer::new();
        pacer.begin_frame(1_000);
        pacer.end_frame(1_004);
        pacer.begin_frame(1_020);
        assert!((pacer.real_dt - 0.020).abs() < 1e-9);
        assert_eq!(pacer.frame_count, 2);
    }

    #[test]
    fn real_dt_is_capped_after_stall() {
        let mut pacer = FramePacer::new();
        pacer.begin_frame(0);
        pacer.begin_frame(5_000);
        assert!((pacer.real_dt - MAX_FRAME_DT).abs() < 1e-9);
    }

    #[test]
    fn smoothed_fps_tracks_samples() {
        let mut pacer = FramePacer::new();
        let mut now = 0;
        for _ in 0..(FPS_SAMPLE_COUNT * 2) {
            pacer.begin_frame(now);
            now += 20;
        }
        assert!((pacer.smoothed_fps - 50.0).abs() < 0.01);
        assert!((pacer.smoothed_frame_time_ms - 20.0).abs() < 0.01);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
