use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use glcanvas_common::config::FPS_WINDOW_MS;

/// Millisecond time source for frame timing.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock measured from the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic timing. Clones share one time value.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Frame counter and windowed frames-per-second estimate.
///
/// `fps` is a step function: it only changes once `FPS_WINDOW_MS` has
/// elapsed since `last_time_ms`, at which point `frame_number` restarts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub frame_number: u32,
    pub last_time_ms: f64,
    pub fps: f64,
    pub render_time_ms: f64,
}

impl FrameTiming {
    pub fn new(now_ms: f64) -> Self {
        Self {
            frame_number: 0,
            last_time_ms: now_ms,
            fps: 0.0,
            render_time_ms: 0.0,
        }
    }

    /// Account for one frame rendered between `start_ms` and `end_ms`.
    /// Returns true when the window elapsed and `fps` was recomputed.
    pub fn record(&mut self, start_ms: f64, end_ms: f64) -> bool {
        self.render_time_ms = end_ms - start_ms;
        self.frame_number += 1;

        let elapsed = end_ms - self.last_time_ms;
        if elapsed < FPS_WINDOW_MS {
            return false;
        }
        self.fps = self.frame_number as f64 / (elapsed / FPS_WINDOW_MS);
        self.frame_number = 0;
        self.last_time_ms = end_ms;
        true
    }
}

/// Most recent render times in milliseconds, oldest overwritten first.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: Vec<f64>,
    capacity: usize,
    next: usize,
}

impl FrameTimer {
    /// Keep the last `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    /// Negative and non-finite times are stored as zero.
    pub fn record_ms(&mut self, ms: f64) {
        let ms = if ms.is_finite() { ms.max(0.0) } else { 0.0 };
        if self.samples.len() < self.capacity {
            self.samples.push(ms);
        } else {
            self.samples[self.next] = ms;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn min_ms(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn max_ms(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }
}
