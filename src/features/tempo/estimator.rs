//! Interval-clustering tempo estimation
//!
//! Maintains a sliding history of folded inter-peak intervals, partitions
//! them into equal-width buckets over the active interval range and reads
//! the tempo off the median of the most populated bucket. An integer
//! confidence state resists transient tempo flips, and common half, double
//! and triplet misreadings are folded back onto the held tempo without a
//! confidence penalty.
//!
//! Bucketing resists occasional spurious peaks; the median within the
//! predominant bucket absorbs small timing jitter.

use std::collections::VecDeque;

use crate::config::DetectorConfig;
use crate::features::onset::Peak;

use super::{PeakInterval, TempoEstimate};

/// Multiples of the held tempo checked for octave misreadings, in match
/// order; the first match wins
const OCTAVE_MULTIPLES: [f32; 4] = [0.5, 1.333_33, 1.5, 2.0];

/// Ceiling of the integer confidence state
const MAX_CONFIDENCE: i32 = 10;

/// Confidence above which a destabilizing estimate is held back
const SUPPRESS_ABOVE: i32 = 7;

/// BPM distance treated as agreement with the held tempo
const STABLE_TOLERANCE: f32 = 2.0;

/// BPM distance per unit multiple treated as an octave misreading
const OCTAVE_TOLERANCE: f32 = 3.0;

/// Streaming tempo estimator over onset peaks
pub struct TempoEstimator {
    min_interval: f32,
    max_interval: f32,
    bucket_count: usize,
    history_length: f64,
    last_peak_timestamp: Option<f64>,
    history: VecDeque<PeakInterval>,
    buckets: Vec<Vec<f32>>,
    median_scratch: Vec<f32>,
    last_measured_tempo: f32,
    confidence: i32,
}

impl TempoEstimator {
    /// Create an estimator sized from the configuration
    ///
    /// History and bucket storage are pre-sized for the worst-case peak rate
    /// (one peak per hop) so the streaming path does not allocate.
    pub fn new(config: &DetectorConfig) -> Self {
        let capacity = (config.peak_history_length * config.osf_rate()).ceil() as usize + 1;

        log::debug!(
            "Tempo estimator: interval range [{:.3}, {:.3}] s, {} buckets, {:.1} s history",
            config.min_interval(),
            config.max_interval(),
            config.bucket_count,
            config.peak_history_length
        );

        Self {
            min_interval: config.min_interval(),
            max_interval: config.max_interval(),
            bucket_count: config.bucket_count,
            history_length: config.peak_history_length as f64,
            last_peak_timestamp: None,
            history: VecDeque::with_capacity(capacity),
            buckets: (0..config.bucket_count)
                .map(|_| Vec::with_capacity(capacity))
                .collect(),
            median_scratch: Vec::with_capacity(capacity),
            last_measured_tempo: 0.0,
            confidence: 0,
        }
    }

    /// Feed one onset peak, returning a tempo estimate when bucket analysis
    /// runs and is not suppressed
    ///
    /// The first peak only anchors the interval chain. Analysis triggers
    /// once the history spans at least the configured window.
    pub fn push(&mut self, peak: Peak) -> Option<TempoEstimate> {
        let previous = match self.last_peak_timestamp.replace(peak.timestamp) {
            Some(timestamp) => timestamp,
            None => return None,
        };

        let interval = self.fold((peak.timestamp - previous) as f32)?;
        self.history.push_back(PeakInterval {
            timestamp: peak.timestamp,
            magnitude: peak.magnitude,
            interval,
        });

        let span = peak.timestamp - self.history.front()?.timestamp;
        if span < self.history_length {
            return None;
        }

        self.analyze(peak.timestamp)
    }

    /// Current confidence in the held tempo, always in `[0, 10]`
    pub fn confidence(&self) -> i32 {
        self.confidence
    }

    /// Re-initialize all streaming state
    pub fn reset(&mut self) {
        self.last_peak_timestamp = None;
        self.history.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.last_measured_tempo = 0.0;
        self.confidence = 0;
    }

    /// Fold an interval into the active range by octave doubling and halving
    ///
    /// Normalizes double- and half-time readings of the same pulse into one
    /// tempo band. Non-positive and non-finite intervals are dropped.
    fn fold(&self, mut interval: f32) -> Option<f32> {
        if !(interval > 0.0) || !interval.is_finite() {
            return None;
        }
        while interval < self.min_interval {
            interval *= 2.0;
        }
        while interval > self.max_interval {
            interval /= 2.0;
        }
        Some(interval)
    }

    /// Cluster the history into buckets and derive a BPM reading
    fn analyze(&mut self, now: f64) -> Option<TempoEstimate> {
        // Step 1: histogram over the active interval range
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        let range = self.max_interval - self.min_interval;
        for entry in &self.history {
            let idx = ((entry.interval - self.min_interval) / range * self.bucket_count as f32)
                .round()
                .clamp(0.0, (self.bucket_count - 1) as f32) as usize;
            self.buckets[idx].push(entry.interval);
        }

        // Step 2: prune entries that fell out of the sliding window
        let horizon = now - self.history_length;
        while self
            .history
            .front()
            .map_or(false, |entry| entry.timestamp < horizon)
        {
            self.history.pop_front();
        }

        // Step 3: predominant bucket; equal counts resolve to the longer
        // interval (lower tempo)
        let mut predominant = 0;
        for (idx, bucket) in self.buckets.iter().enumerate() {
            if bucket.len() >= self.buckets[predominant].len() {
                predominant = idx;
            }
        }
        if self.buckets[predominant].is_empty() {
            return None;
        }

        self.median_scratch.clear();
        self.median_scratch
            .extend_from_slice(&self.buckets[predominant]);
        let median_interval = median_in_place(&mut self.median_scratch);
        let bpm = 60.0 / median_interval;

        log::debug!(
            "Bucket analysis at {:.2} s: {} intervals, bucket {} holds {}, median {:.4} s -> {:.1} BPM",
            now,
            self.history.len(),
            predominant,
            self.buckets[predominant].len(),
            median_interval,
            bpm
        );

        // Step 4: confidence and octave correction against the held tempo
        let last = self.last_measured_tempo;
        let emitted = if last == 0.0 || (bpm - last).abs() < STABLE_TOLERANCE {
            self.confidence = (self.confidence + 1).min(MAX_CONFIDENCE);
            bpm
        } else if let Some(&multiple) = OCTAVE_MULTIPLES
            .iter()
            .find(|&&m| (m * last - bpm).abs() < OCTAVE_TOLERANCE * m)
        {
            // The reading is an octave-type misreading of the held tempo;
            // correct it without touching confidence
            bpm / multiple
        } else {
            let held = self.confidence > SUPPRESS_ABOVE;
            self.confidence = (self.confidence - 1).max(0);
            // Track the raw reading even when the emission is held back, so
            // a genuine tempo change settles on the second tick
            self.last_measured_tempo = bpm;
            if held {
                return None;
            }
            bpm
        };

        self.last_measured_tempo = emitted;
        Some(TempoEstimate {
            timestamp: now,
            bpm: emitted,
        })
    }
}

/// Median by full sort; bucket populations are a few dozen at most
fn median_in_place(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len().is_multiple_of(2) {
        (values[mid - 1] + values[mid]) * 0.5
    } else {
        values[mid]
    }
}
