//! Onset-strength function
//!
//! Produces one onset-strength value per analysis hop by differencing
//! log-band energies across successive frames and taking the cross-band
//! median of the positive changes (half-wave rectified log-spectral flux).
//!
//! # Reference
//!
//! McFee, B., & Ellis, D. P. W. (2014). Better Beat Tracking Through Robust
//! Onset Aggregation. *Proceedings of the IEEE International Conference on
//! Acoustics, Speech and Signal Processing*.
//!
//! The median across bands yields a markedly smoother envelope than the
//! conventional sum and tolerates a single noisy band.

/// Scale factor applied to the rectified flux; chosen for plot legibility
/// and irrelevant to detection behavior
const FLUX_SCALE: f32 = 1000.0;

/// Streaming onset-strength function over band-energy frames
pub struct OnsetStrength {
    /// Log-band energies of the previous frame
    prev_log_bands: Vec<f32>,
    deltas: Vec<f32>,
    ready: bool,
}

impl OnsetStrength {
    /// Create an onset-strength function over `band_count` bands
    pub fn new(band_count: usize) -> Self {
        Self {
            prev_log_bands: vec![0.0; band_count],
            deltas: vec![0.0; band_count],
            ready: false,
        }
    }

    /// Feed one frame of band energies, returning its onset strength
    ///
    /// Returns `None` for the very first frame: no previous frame exists to
    /// difference against.
    pub fn push(&mut self, bands: &[f32]) -> Option<f32> {
        debug_assert_eq!(bands.len(), self.prev_log_bands.len());

        if !self.ready {
            for (prev, &magnitude) in self.prev_log_bands.iter_mut().zip(bands) {
                *prev = log_guarded(magnitude);
            }
            self.ready = true;
            return None;
        }

        for ((delta, prev), &magnitude) in self
            .deltas
            .iter_mut()
            .zip(self.prev_log_bands.iter_mut())
            .zip(bands)
        {
            let log_magnitude = log_guarded(magnitude);
            *delta = (log_magnitude - *prev).max(0.0) * FLUX_SCALE;
            *prev = log_magnitude;
        }

        Some(median_in_place(&mut self.deltas))
    }

    /// Forget the stored frame so the next push primes the differencer again
    pub fn reset(&mut self) {
        self.ready = false;
    }
}

/// `log10`, leaving non-positive magnitudes unchanged so silent bands cannot
/// inject `-inf` into the difference
fn log_guarded(magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        magnitude.log10()
    } else {
        magnitude
    }
}

/// Median by full sort; band counts are at most 30, where sorting beats
/// quickselect bookkeeping
fn median_in_place(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len().is_multiple_of(2) {
        (values[mid - 1] + values[mid]) * 0.5
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_emits_nothing() {
        let mut osf = OnsetStrength::new(12);
        assert_eq!(osf.push(&vec![1.0; 12]), None);
        assert!(osf.push(&vec![1.0; 12]).is_some());
    }

    #[test]
    fn test_constant_energy_reads_zero() {
        let mut osf = OnsetStrength::new(6);
        let frame = vec![2.5f32; 6];
        osf.push(&frame);
        assert_eq!(osf.push(&frame), Some(0.0));
    }

    #[test]
    fn test_silence_stays_finite() {
        let mut osf = OnsetStrength::new(12);
        let silence = vec![0.0f32; 12];
        osf.push(&silence);
        let value = osf.push(&silence).unwrap();
        assert!(value.is_finite());
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_broadband_rise_reads_positive() {
        let mut osf = OnsetStrength::new(6);
        osf.push(&vec![1.0f32; 6]);
        let value = osf.push(&vec![10.0f32; 6]).unwrap();
        // log10(10) - log10(1) = 1 per band, scaled by 1000
        assert!((value - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_single_hot_band_is_ignored() {
        let mut osf = OnsetStrength::new(12);
        osf.push(&vec![1.0f32; 12]);

        let mut frame = vec![1.0f32; 12];
        frame[3] = 1000.0;
        let value = osf.push(&frame).unwrap();

        assert_eq!(value, 0.0, "median must reject a single noisy band");
    }

    #[test]
    fn test_decay_is_rectified_away() {
        let mut osf = OnsetStrength::new(6);
        osf.push(&vec![10.0f32; 6]);
        assert_eq!(osf.push(&vec![1.0f32; 6]), Some(0.0));
    }

    #[test]
    fn test_reset_primes_again() {
        let mut osf = OnsetStrength::new(6);
        osf.push(&vec![1.0f32; 6]);
        osf.push(&vec![5.0f32; 6]);
        osf.reset();
        assert_eq!(osf.push(&vec![1.0f32; 6]), None);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median_in_place(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_in_place(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}
