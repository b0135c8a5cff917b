//! Frame-rate and latency tracking for the diagnostics panel

use std::collections::VecDeque;
use std::time::Duration;

/// Durations over a sliding window
#[derive(Debug)]
pub struct TimingTracker {
    samples: VecDeque<Duration>,
    window: usize,
}

impl TimingTracker {
    pub fn new(window: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() >= self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().max().copied().unwrap_or(Duration::ZERO)
    }

    pub fn percentile_95(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.samples.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// "avg 120ms, p95 340ms (n=12)", or an empty string with no samples
    pub fn summary(&self) -> String {
        if self.samples.is_empty() {
            return String::new();
        }
        format!(
            "avg {}ms, p95 {}ms (n={})",
            self.average().as_millis(),
            self.percentile_95().as_millis(),
            self.count()
        )
    }
}

/// Frames per second averaged over the last `window` frames
#[derive(Debug)]
pub struct FrameRate {
    frame_times: VecDeque<f64>,
    window: usize,
}

impl FrameRate {
    pub fn new(window: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    /// Record one frame's delta (seconds) and return the current FPS
    pub fn tick(&mut self, delta_secs: f64) -> f32 {
        self.frame_times.push_back(delta_secs);
        if self.frame_times.len() > self.window {
            self.frame_times.pop_front();
        }
        self.fps()
    }

    pub fn fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let avg = self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
        if avg > 0.0 {
            (1.0 / avg) as f32
        } else {
            0.0
        }
    }
}
