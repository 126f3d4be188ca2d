//! Stream driver wiring the analysis stages together
//!
//! The driver accepts raw audio blocks of any length, maintains a FIFO
//! sample queue and dispatches hop-aligned chunks through the pipeline:
//! windowed FFT, log-band energies, onset strength, peak picking and tempo
//! estimation. Everything runs synchronously inside
//! [`process_block`](TempoDetector::process_block); the core spawns no
//! threads of its own.

use std::collections::VecDeque;

use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::features::onset::flux::OnsetStrength;
use crate::features::onset::peak_picker::PeakPicker;
use crate::features::spectrum::bands::BandExtractor;
use crate::features::spectrum::window::SpectrumAnalyzer;
use crate::features::tempo::estimator::TempoEstimator;

use super::PlotSink;

/// Callback invoked with `(timestamp, bpm)` on every tempo emission
pub type BeatHandler = Box<dyn FnMut(f64, f32) + Send>;

/// Streaming tempo detector
///
/// Feed blocks of normalized mono samples through
/// [`process_block`](TempoDetector::process_block); tempo updates arrive
/// synchronously on the handler installed with
/// [`set_beat_handler`](TempoDetector::set_beat_handler).
///
/// All buffers are pre-sized at construction, so after warmup the streaming
/// path is allocation-free and safe to drive from a real-time audio
/// callback. If the consumer needs results on another thread, that hand-off
/// is the consumer's responsibility.
pub struct TempoDetector {
    config: DetectorConfig,
    queue: VecDeque<f32>,
    /// Contiguous staging buffer for the chunk handed to the FFT
    chunk: Vec<f32>,
    /// Timestamp of the next chunk to dispatch; `None` until the first block
    next_chunk_timestamp: Option<f64>,
    hop_period: f64,
    spectrum: SpectrumAnalyzer,
    bands: BandExtractor,
    osf: OnsetStrength,
    picker: PeakPicker,
    estimator: TempoEstimator,
    beat_handler: Option<BeatHandler>,
    plot_sink: Option<Box<dyn PlotSink + Send>>,
    analysis_range: Option<(f64, f64)>,
}

impl TempoDetector {
    /// Create a detector for the given configuration
    ///
    /// # Errors
    ///
    /// Returns `DetectorError::InvalidConfig` if the configuration is
    /// rejected by [`DetectorConfig::validate`].
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        config.validate()?;

        log::debug!(
            "Creating tempo detector: {} Hz, chunk={}, hop={}, {} bands, tempo range [{:.1}, {:.1}] BPM",
            config.sample_rate,
            config.chunk_size,
            config.hop_size,
            config.frequency_bands,
            config.min_tempo,
            config.max_tempo
        );

        Ok(Self {
            queue: VecDeque::with_capacity(config.chunk_size * 2),
            chunk: vec![0.0; config.chunk_size],
            next_chunk_timestamp: None,
            hop_period: config.hop_size as f64 / config.sample_rate as f64,
            spectrum: SpectrumAnalyzer::new(config.chunk_size),
            bands: BandExtractor::new(
                config.frequency_bands,
                config.sample_rate,
                config.chunk_size,
            ),
            osf: OnsetStrength::new(config.frequency_bands),
            picker: PeakPicker::new(&config),
            estimator: TempoEstimator::new(&config),
            beat_handler: None,
            plot_sink: None,
            analysis_range: None,
            config,
        })
    }

    /// The configuration this detector was built with
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Install the consumer callback for `(timestamp, bpm)` updates
    ///
    /// Replaces any previously installed handler.
    pub fn set_beat_handler(&mut self, handler: impl FnMut(f64, f32) + Send + 'static) {
        self.beat_handler = Some(Box::new(handler));
    }

    /// Attach an observational sink for onset-strength and peak diagnostics
    pub fn set_plot_sink(&mut self, sink: impl PlotSink + Send + 'static) {
        self.plot_sink = Some(Box::new(sink));
    }

    /// Restrict analysis to `[start, end]` seconds
    ///
    /// Intended for offline sources with a known time range: chunks outside
    /// the range are not analyzed, but queue and timestamp accounting still
    /// advance as usual.
    pub fn set_analysis_range(&mut self, start: f64, end: f64) {
        self.analysis_range = Some((start, end));
    }

    /// Feed a block of mono samples
    ///
    /// `first_sample_timestamp` is the time in seconds of `samples[0]`.
    /// Blocks are treated as contiguous: after the first block the driver
    /// derives chunk timestamps from its own sample accounting, so feeding
    /// the same audio re-chunked into different block sizes produces
    /// identical output. Never fails; all emission happens through the
    /// installed handler.
    pub fn process_block(&mut self, samples: &[f32], first_sample_timestamp: f64) {
        let mut timestamp = match self.next_chunk_timestamp {
            Some(t) => t,
            None => first_sample_timestamp,
        };

        self.queue.extend(samples.iter().copied());

        while self.queue.len() >= self.config.chunk_size {
            if self.in_range(timestamp) {
                for (dst, &src) in self.chunk.iter_mut().zip(self.queue.iter()) {
                    *dst = src;
                }
                self.dispatch_chunk(timestamp);
            }
            self.queue.drain(..self.config.hop_size);
            timestamp += self.hop_period;
        }

        self.next_chunk_timestamp = Some(timestamp);
    }

    /// Re-initialize all streaming state
    ///
    /// The configuration, the installed handler and the plot sink survive; a
    /// reset detector behaves exactly like a freshly constructed one. Must
    /// be called from the thread driving `process_block`.
    pub fn reset(&mut self) {
        log::debug!("Resetting tempo detector state");
        self.queue.clear();
        self.next_chunk_timestamp = None;
        self.osf.reset();
        self.picker.reset();
        self.estimator.reset();
    }

    fn in_range(&self, timestamp: f64) -> bool {
        match self.analysis_range {
            Some((start, end)) => timestamp >= start && timestamp <= end,
            None => true,
        }
    }

    /// Run one staged chunk through the pipeline
    fn dispatch_chunk(&mut self, timestamp: f64) {
        let magnitudes = self.spectrum.magnitudes(&self.chunk);
        let energies = self.bands.extract(magnitudes);

        let osf = match self.osf.push(energies) {
            Some(value) => value,
            // First chunk primes the flux differencer
            None => return,
        };

        if let Some(sink) = &mut self.plot_sink {
            sink.osf_sample(timestamp, osf);
        }

        let peak = match self.picker.push(timestamp, osf) {
            Some(peak) => peak,
            None => return,
        };

        if let Some(sink) = &mut self.plot_sink {
            sink.peak(peak.timestamp);
        }

        if let Some(estimate) = self.estimator.push(peak) {
            if let Some(handler) = &mut self.beat_handler {
                handler(estimate.timestamp, estimate.bpm);
            }
        }
    }
}
