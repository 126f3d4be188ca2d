//! Causal peak picking over the onset-strength function
//!
//! Emits a peak when the envelope turns downward after an ascending run,
//! gated by an adaptive threshold derived from the recent onset-strength
//! maximum. Candidates within a short coalescing window are collapsed to the
//! strongest one, which absorbs double-peaks from closely spaced onsets.
//!
//! The picker is a pure transducer: the driver pushes one onset-strength
//! sample per hop and receives at most one peak back per push.

use crate::config::DetectorConfig;

use super::Peak;

/// Streaming peak picker over onset-strength samples
pub struct PeakPicker {
    trailing: TrailingWindow,
    counter: u64,
    last_magnitude: f32,
    is_onsetting: bool,
    queue: Vec<Peak>,
    osf_rate: f32,
    /// Seconds between successive onset-strength samples
    osf_period: f64,
    coalesce_interval: f64,
    threshold_ratio: f32,
}

impl PeakPicker {
    /// Create a peak picker sized from the configuration
    ///
    /// The trailing threshold window covers `recent_history_duration`
    /// seconds of onset-strength samples; the coalescing queue is pre-sized
    /// to the largest number of candidates one coalescing window can hold.
    pub fn new(config: &DetectorConfig) -> Self {
        let osf_rate = config.osf_rate();
        let window = (osf_rate * config.recent_history_duration).round() as usize;
        let queue_capacity = (config.coalesce_interval * osf_rate as f64).ceil() as usize + 1;

        log::debug!(
            "Peak picker: {:.1} OSF samples/s, trailing window {}, threshold ratio {:.2}, coalesce {:.3} s",
            osf_rate,
            window,
            config.recent_max_threshold_ratio,
            config.coalesce_interval
        );

        Self {
            trailing: TrailingWindow::new(window),
            counter: 0,
            last_magnitude: 0.0,
            is_onsetting: false,
            queue: Vec::with_capacity(queue_capacity),
            osf_rate,
            osf_period: config.hop_size as f64 / config.sample_rate as f64,
            coalesce_interval: config.coalesce_interval,
            threshold_ratio: config.recent_max_threshold_ratio,
        }
    }

    /// Feed one onset-strength sample, returning at most one peak
    ///
    /// Peaks are reported at the previous hop's timestamp (where the local
    /// maximum actually sat) and come out in strictly increasing timestamp
    /// order. Nothing is emitted during the first second of input while the
    /// adaptive threshold stabilizes.
    pub fn push(&mut self, timestamp: f64, magnitude: f32) -> Option<Peak> {
        let recent_max = self.trailing.max();
        let threshold = recent_max * self.threshold_ratio;
        self.trailing.push(magnitude);

        let mut candidate = None;
        let warmed_up = self.counter as f32 > self.osf_rate;
        if warmed_up && magnitude < self.last_magnitude && self.is_onsetting {
            // The previous sample was a local maximum
            self.is_onsetting = false;
            if self.last_magnitude >= threshold {
                candidate = Some(Peak {
                    timestamp: timestamp - self.osf_period,
                    magnitude: self.last_magnitude,
                });
            }
        } else {
            self.is_onsetting = magnitude > self.last_magnitude;
        }

        self.counter += 1;
        self.last_magnitude = magnitude;

        match candidate {
            Some(peak) if self.coalesce_interval == 0.0 => Some(peak),
            Some(peak) => {
                self.queue.push(peak);
                self.flush_queue(timestamp)
            }
            None => self.flush_queue(timestamp),
        }
    }

    /// Collapse the pending candidates once the coalescing window has passed
    ///
    /// The strongest candidate wins; on equal magnitudes the earliest one
    /// does.
    fn flush_queue(&mut self, now: f64) -> Option<Peak> {
        let first = self.queue.first()?;
        if now - first.timestamp <= self.coalesce_interval {
            return None;
        }

        let mut best = self.queue[0];
        for &peak in &self.queue[1..] {
            if peak.magnitude > best.magnitude {
                best = peak;
            }
        }
        self.queue.clear();
        Some(best)
    }

    /// Re-initialize all streaming state
    pub fn reset(&mut self) {
        self.trailing.clear();
        self.counter = 0;
        self.last_magnitude = 0.0;
        self.is_onsetting = false;
        self.queue.clear();
    }
}

/// Fixed-capacity ring of the most recent onset-strength magnitudes
struct TrailingWindow {
    values: Vec<f32>,
    head: usize,
    len: usize,
}

impl TrailingWindow {
    fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, value: f32) {
        let capacity = self.values.len();
        self.values[(self.head + self.len) % capacity] = value;
        if self.len < capacity {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % capacity;
        }
    }

    /// Maximum over the window, zero when empty
    fn max(&self) -> f32 {
        self.values[..self.len.min(self.values.len())]
            .iter()
            .copied()
            .fold(0.0f32, f32::max)
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
