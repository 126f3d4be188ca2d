//! Log-spaced band energy reduction
//!
//! Collapses a linear magnitude spectrum into a small number of
//! logarithmically spaced frequency bands. Log spacing matches perceptual
//! frequency resolution, and keeping the band count small (6-30) stabilizes
//! the onset-strength function downstream.

/// Lowest band edge in Hz
const BAND_FLOOR_HZ: f32 = 100.0;

/// Highest band edge in Hz
const BAND_CEIL_HZ: f32 = 5512.0;

/// Reduces magnitude spectra to per-band mean magnitudes
///
/// Band-to-bin mapping is resolved once at construction; `extract` is
/// allocation-free.
pub struct BandExtractor {
    /// Half-open FFT bin ranges per band
    bins: Vec<(usize, usize)>,
    energies: Vec<f32>,
}

impl BandExtractor {
    /// Create an extractor for `band_count` bands
    ///
    /// Bands span 100 Hz to 5512 Hz with `band_count / 6` bands per octave,
    /// so 6 bands give one band per octave, 12 give two and 30 give five.
    /// A bin belongs to the band whose `[f_low, f_high)` range contains its
    /// center frequency.
    pub fn new(band_count: usize, sample_rate: u32, chunk_size: usize) -> Self {
        let bands_per_octave = band_count as f32 / 6.0;
        let bin_hz = sample_rate as f32 / chunk_size as f32;
        let bin_count = chunk_size / 2;

        let mut bins = Vec::with_capacity(band_count);
        for band in 0..band_count {
            let f_low = BAND_FLOOR_HZ * 2.0f32.powf(band as f32 / bands_per_octave);
            let f_high = (BAND_FLOOR_HZ * 2.0f32.powf((band + 1) as f32 / bands_per_octave))
                .min(BAND_CEIL_HZ);

            // First bin at or above f_low, first bin at or above f_high (exclusive)
            let lo = ((f_low / bin_hz).ceil() as usize).min(bin_count);
            let hi = ((f_high / bin_hz).ceil() as usize).clamp(lo, bin_count);
            bins.push((lo, hi));
        }

        log::debug!(
            "Band extractor: {} bands ({:.1}/octave), {:.2} Hz per bin",
            band_count,
            bands_per_octave,
            bin_hz
        );

        Self {
            bins,
            energies: vec![0.0; band_count],
        }
    }

    /// Collapse a magnitude spectrum into per-band mean magnitudes
    ///
    /// A band whose frequency range contains no bin centers (possible at low
    /// frequencies with coarse spectral resolution) reads as zero.
    pub fn extract(&mut self, magnitudes: &[f32]) -> &[f32] {
        for (energy, &(lo, hi)) in self.energies.iter_mut().zip(&self.bins) {
            let lo = lo.min(magnitudes.len());
            let hi = hi.min(magnitudes.len());
            *energy = if hi > lo {
                magnitudes[lo..hi].iter().sum::<f32>() / (hi - lo) as f32
            } else {
                0.0
            };
        }
        &self.energies
    }
}
