//! Hann-windowed FFT magnitude computation

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Computes magnitude spectra over fixed-size analysis chunks
///
/// The FFT plan, the Hann window and all working buffers are allocated once
/// at construction; [`magnitudes`](SpectrumAnalyzer::magnitudes) itself is
/// allocation-free so it can run inside a real-time audio callback.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    chunk_size: usize,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for chunks of `chunk_size` samples
    ///
    /// `chunk_size` must be a power of two; the configuration is validated
    /// before any analyzer is constructed.
    pub fn new(chunk_size: usize) -> Self {
        debug_assert!(chunk_size.is_power_of_two());

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(chunk_size);
        let scratch_len = fft.get_inplace_scratch_len();

        let window: Vec<f32> = (0..chunk_size)
            .map(|n| {
                let phase = 2.0 * std::f32::consts::PI * n as f32 / chunk_size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        log::debug!(
            "Spectrum analyzer: chunk={}, fft scratch={}",
            chunk_size,
            scratch_len
        );

        Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); chunk_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; chunk_size / 2],
            chunk_size,
        }
    }

    /// Compute the magnitude spectrum of one chunk
    ///
    /// Applies the Hann window, runs the forward FFT and returns `|X[k]|`
    /// for `k` in `[0, chunk_size / 2)`. `samples` must hold exactly
    /// `chunk_size` values.
    pub fn magnitudes(&mut self, samples: &[f32]) -> &[f32] {
        debug_assert_eq!(samples.len(), self.chunk_size);

        for ((dst, &sample), &weight) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *dst = Complex::new(sample * weight, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *magnitude = bin.norm();
        }

        &self.magnitudes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_yields_zero_spectrum() {
        let mut analyzer = SpectrumAnalyzer::new(1024);
        let samples = vec![0.0f32; 1024];
        let magnitudes = analyzer.magnitudes(&samples);

        assert_eq!(magnitudes.len(), 512);
        assert!(magnitudes.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let chunk_size = 1024;
        let bin = 100;
        let samples: Vec<f32> = (0..chunk_size)
            .map(|n| {
                (2.0 * std::f32::consts::PI * bin as f32 * n as f32 / chunk_size as f32).sin()
            })
            .collect();

        let mut analyzer = SpectrumAnalyzer::new(chunk_size);
        let magnitudes = analyzer.magnitudes(&samples);

        let argmax = magnitudes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(argmax, bin, "spectral peak should land on the sine's bin");
    }

    #[test]
    fn test_output_is_reused_across_calls() {
        let mut analyzer = SpectrumAnalyzer::new(512);
        let loud = vec![0.5f32; 512];
        let quiet = vec![0.0f32; 512];

        let loud_energy: f32 = analyzer.magnitudes(&loud).iter().sum();
        let quiet_energy: f32 = analyzer.magnitudes(&quiet).iter().sum();

        assert!(loud_energy > 0.0);
        assert_eq!(quiet_energy, 0.0, "stale magnitudes must be overwritten");
    }
}
