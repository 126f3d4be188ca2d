//! Streaming driver
//!
//! Owns the sample queue and runs the analysis pipeline chunk by chunk as
//! audio blocks arrive.

mod driver;

pub use driver::{BeatHandler, TempoDetector};

/// Observational sink for per-hop diagnostics
///
/// A sink receives the onset-strength envelope and the detected peaks,
/// typically to write plot files during validation runs. Attaching one must
/// not alter detection behavior; the driver invokes it synchronously from
/// [`process_block`](TempoDetector::process_block).
pub trait PlotSink {
    /// Called once per analysis hop with the onset-strength value
    fn osf_sample(&mut self, timestamp: f64, magnitude: f32);

    /// Called for each detected onset peak
    fn peak(&mut self, timestamp: f64);
}
