//! Tempo estimation modules
//!
//! Converts the onset peak stream into BPM estimates:
//! - Inter-peak interval folding into the active tempo range
//! - Histogram clustering with confidence tracking and octave correction

pub mod estimator;

use serde::{Deserialize, Serialize};

/// A tempo estimate emitted to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Time of the triggering onset peak in seconds
    pub timestamp: f64,

    /// Estimated tempo in beats per minute
    pub bpm: f32,
}

/// An onset peak annotated with the folded interval that precedes it
#[derive(Debug, Clone, Copy)]
pub struct PeakInterval {
    /// Peak time in seconds
    pub timestamp: f64,

    /// Onset strength at the peak
    pub magnitude: f32,

    /// Inter-peak interval folded into `[60 / max_tempo, 60 / min_tempo]`
    /// seconds
    pub interval: f32,
}
