//! Spectral front end
//!
//! Reduces each analysis chunk to a small vector of log-spaced band
//! magnitudes:
//! - Hann-windowed FFT magnitude computation
//! - Log-band energy reduction

pub mod bands;
pub mod window;
