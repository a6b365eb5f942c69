//! Relative-motion accumulation between flush ticks.
//!
//! Touch-move callbacks fire far faster than a sane outbound message rate;
//! deltas pile up here and leave as one `mouse_move` per 16 ms tick. The
//! deadline is a single recurring schedule owned by this struct: it advances
//! by whole intervals and is never restarted, so a busy loop iteration cannot
//! produce duplicate flushes.

use std::time::{Duration, Instant};

pub const FLUSH_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug)]
pub struct MotionAccumulator {
    dx: f32,
    dy: f32,
    next_flush: Instant,
}

impl MotionAccumulator {
    pub fn new(now: Instant) -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            next_flush: now + FLUSH_INTERVAL,
        }
    }

    pub fn add(&mut self, dx: f32, dy: f32) {
        self.dx += dx;
        self.dy += dy;
    }

    /// Discard pending motion without emitting. The flush schedule keeps
    /// running.
    pub fn reset(&mut self) {
        self.dx = 0.0;
        self.dy = 0.0;
    }

    /// If a flush tick is due, consume the accumulated vector. An empty tick
    /// returns `None` but still advances the schedule; both axes are zero
    /// after every due tick.
    pub fn poll(&mut self, now: Instant) -> Option<(f32, f32)> {
        if now < self.next_flush {
            return None;
        }
        while self.next_flush <= now {
            self.next_flush += FLUSH_INTERVAL;
        }
        if self.dx == 0.0 && self.dy == 0.0 {
            return None;
        }
        let out = (self.dx, self.dy);
        self.dx = 0.0;
        self.dy = 0.0;
        Some(out)
    }

    /// When the next flush is due; the run loop sleeps no longer than this.
    pub fn next_deadline(&self) -> Instant {
        self.next_flush
    }
}
