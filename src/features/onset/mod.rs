//! Onset detection modules
//!
//! Streaming onset analysis over band-energy frames:
//! - Onset-strength function (cross-band median of log-spectral flux)
//! - Causal peak picking with an adaptive recent-maximum threshold

pub mod flux;
pub mod peak_picker;

use serde::{Deserialize, Serialize};

/// A detected onset peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Peak time in seconds
    pub timestamp: f64,

    /// Onset strength at the peak
    pub magnitude: f32,
}
