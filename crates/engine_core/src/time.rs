//! Frame timing for the host loop.

use std::time::{Duration, Instant};

/// Timing information handed to every per-frame callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Frame index since the clock started (first tick is 1).
    pub frame: u64,
    /// Seconds since the previous tick.
    pub delta: f32,
    /// Seconds since the clock started.
    pub elapsed: f32,
    /// Milliseconds since the clock started. Integer so equality checks are exact.
    pub timestamp: u64,
}

#[derive(Debug)]
enum ClockSource {
    Wall { start: Instant, last: Instant },
    Fixed { step: Duration, elapsed: Duration },
}

/// Produces [`FrameTime`]s, either from the wall clock or at a fixed rate.
#[derive(Debug)]
pub struct FrameClock {
    source: ClockSource,
    frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Wall-clock driven frames.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            source: ClockSource::Wall {
                start: now,
                last: now,
            },
            frame: 0,
        }
    }

    /// Deterministic frames at `hz` ticks per second (headless hosts, tests).
    pub fn fixed(hz: f64) -> Self {
        Self {
            source: ClockSource::Fixed {
                step: Duration::from_secs_f64(1.0 / hz),
                elapsed: Duration::ZERO,
            },
            frame: 0,
        }
    }

    /// Advance to the next frame.
    pub fn tick(&mut self) -> FrameTime {
        self.frame += 1;
        let (delta, elapsed) = match &mut self.source {
            ClockSource::Wall { start, last } => {
                let now = Instant::now();
                let delta = now - *last;
                *last = now;
                (delta, now - *start)
            }
            ClockSource::Fixed { step, elapsed } => {
                *elapsed += *step;
                (*step, *elapsed)
            }
        };
        FrameTime {
            frame: self.frame,
            delta: delta.as_secs_f32(),
            elapsed: elapsed.as_secs_f32(),
            timestamp: elapsed.as_millis() as u64,
        }
    }

    /// Number of frames produced so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}
