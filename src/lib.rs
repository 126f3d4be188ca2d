//! # Cadence DSP
//!
//! A real-time tempo detection engine for streaming audio, continuously
//! estimating the dominant tempo of music in beats per minute.
//!
//! ## Features
//!
//! - **Streaming onset detection**: Hann-windowed spectral analysis reduced
//!   to log-spaced bands, with a median log-flux onset-strength function
//! - **Causal peak picking**: adaptive recent-maximum thresholding with
//!   temporal coalescing of double-peaks
//! - **Tempo estimation**: inter-peak interval clustering with confidence
//!   hysteresis and half/double/triplet octave correction
//!
//! The engine runs causally, block by block, on an unbounded audio stream
//! with bounded memory; the hot path is allocation-free after construction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cadence_dsp::{DetectorConfig, TempoDetector};
//!
//! let mut detector = TempoDetector::new(DetectorConfig::default())?;
//! detector.set_beat_handler(|timestamp, bpm| {
//!     println!("{:.2} s: {:.1} BPM", timestamp, bpm);
//! });
//!
//! // Feed normalized mono samples as they arrive, any block length
//! let samples = vec![0.0f32; 4096];
//! detector.process_block(&samples, 0.0);
//! # Ok::<(), cadence_dsp::DetectorError>(())
//! ```
//!
//! ## Architecture
//!
//! The pipeline runs synchronously inside `process_block`:
//!
//! ```text
//! Audio Blocks → Windowed FFT → Log-Band Energies → Onset Strength
//!              → Peak Picking → Tempo Estimation → BPM Updates
//! ```
//!
//! The detector owns no threads. Audio decoding, capture and any UI belong
//! to the producer and consumer on either side of the callback boundary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod features;
pub mod stream;

// Re-export main types
pub use config::DetectorConfig;
pub use error::DetectorError;
pub use features::onset::Peak;
pub use features::tempo::TempoEstimate;
pub use stream::{PlotSink, TempoDetector};
