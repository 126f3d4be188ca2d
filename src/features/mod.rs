//! Feature extraction modules
//!
//! The streaming analysis stages, in dependency order:
//! - Spectrum: windowed FFT magnitudes and log-band energies
//! - Onset: onset-strength function and causal peak picking
//! - Tempo: interval clustering and BPM estimation

pub mod onset;
pub mod spectrum;
pub mod tempo;
