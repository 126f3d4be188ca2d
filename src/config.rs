//! Configuration parameters for tempo detection

use crate::error::DetectorError;

/// Band counts the log-band extractor supports (1, 2 and 5 bands per octave)
pub const SUPPORTED_BAND_COUNTS: [usize; 3] = [6, 12, 30];

/// Tempo detection configuration parameters
///
/// The configuration is immutable for the lifetime of a detector. Changing
/// the tempo range in particular would invalidate the folded intervals held
/// in the peak history; construct a new detector (or call
/// [`reset`](crate::TempoDetector::reset) on one built with the new values)
/// instead.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Sample rate of the incoming audio in Hz (default: 22050)
    pub sample_rate: u32,

    /// Analysis window length in samples, must be a power of two (default: 2048)
    pub chunk_size: usize,

    /// Samples advanced between successive analysis windows (default: 90)
    ///
    /// At the default sample rate this yields ~245 onset-strength samples
    /// per second.
    pub hop_size: usize,

    /// Minimum tempo to consider in BPM (default: 40.0)
    pub min_tempo: f32,

    /// Maximum tempo to consider in BPM (default: 240.0)
    pub max_tempo: f32,

    /// Number of logarithmically spaced frequency bands (default: 12)
    ///
    /// Must be one of 6, 12 or 30, i.e. 1, 2 or 5 bands per octave.
    pub frequency_bands: usize,

    /// Number of histogram buckets for interval clustering (default: 10)
    pub bucket_count: usize,

    /// Sliding window over inter-peak intervals in seconds (default: 4.0)
    pub peak_history_length: f32,

    /// Window for coalescing closely spaced onset peaks in seconds
    /// (default: 0.1; 0 emits every peak immediately)
    pub coalesce_interval: f64,

    /// Fraction of the recent onset-strength maximum used as the peak
    /// threshold (default: 0.6)
    pub recent_max_threshold_ratio: f32,

    /// Duration of onset-strength history backing the adaptive threshold in
    /// seconds (default: 1.25)
    pub recent_history_duration: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            chunk_size: 2048,
            hop_size: 90,
            min_tempo: 40.0,
            max_tempo: 240.0,
            frequency_bands: 12,
            bucket_count: 10,
            peak_history_length: 4.0,
            coalesce_interval: 0.1,
            recent_max_threshold_ratio: 0.6,
            recent_history_duration: 1.25,
        }
    }
}

impl DetectorConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `DetectorError::InvalidConfig` describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.sample_rate == 0 {
            return Err(DetectorError::InvalidConfig(
                "Sample rate must be > 0".to_string(),
            ));
        }

        if self.chunk_size == 0 || !self.chunk_size.is_power_of_two() {
            return Err(DetectorError::InvalidConfig(format!(
                "Chunk size must be a power of two, got {}",
                self.chunk_size
            )));
        }

        if self.hop_size == 0 || self.hop_size > self.chunk_size {
            return Err(DetectorError::InvalidConfig(format!(
                "Hop size must be in [1, chunk_size], got {}",
                self.hop_size
            )));
        }

        if !SUPPORTED_BAND_COUNTS.contains(&self.frequency_bands) {
            return Err(DetectorError::InvalidConfig(format!(
                "Frequency band count must be one of {:?}, got {}",
                SUPPORTED_BAND_COUNTS, self.frequency_bands
            )));
        }

        if !(self.min_tempo > 0.0) || !self.max_tempo.is_finite() || self.min_tempo >= self.max_tempo
        {
            return Err(DetectorError::InvalidConfig(format!(
                "Invalid tempo range: [{:.1}, {:.1}]",
                self.min_tempo, self.max_tempo
            )));
        }

        if self.bucket_count == 0 {
            return Err(DetectorError::InvalidConfig(
                "Bucket count must be > 0".to_string(),
            ));
        }

        if !(self.peak_history_length > 0.0) {
            return Err(DetectorError::InvalidConfig(format!(
                "Peak history length must be > 0, got {}",
                self.peak_history_length
            )));
        }

        if !(self.coalesce_interval >= 0.0) {
            return Err(DetectorError::InvalidConfig(format!(
                "Coalesce interval must be >= 0, got {}",
                self.coalesce_interval
            )));
        }

        if !(self.recent_max_threshold_ratio >= 0.0) {
            return Err(DetectorError::InvalidConfig(format!(
                "Threshold ratio must be >= 0, got {}",
                self.recent_max_threshold_ratio
            )));
        }

        if !(self.recent_history_duration > 0.0) {
            return Err(DetectorError::InvalidConfig(format!(
                "Recent history duration must be > 0, got {}",
                self.recent_history_duration
            )));
        }

        Ok(())
    }

    /// Onset-strength samples per second (`sample_rate / hop_size`)
    pub fn osf_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size as f32
    }

    /// Shortest inter-peak interval in the active tempo range, in seconds
    pub fn min_interval(&self) -> f32 {
        60.0 / self.max_tempo
    }

    /// Longest inter-peak interval in the active tempo range, in seconds
    pub fn max_interval(&self) -> f32 {
        60.0 / self.min_tempo
    }
}
