//! End-to-end tests for the streaming tempo detector
//!
//! Drives the public API with synthetic click trains and checks the emitted
//! BPM stream against the known tempo.

use std::sync::{Arc, Mutex};

use cadence_dsp::{DetectorConfig, PlotSink, TempoDetector};

const SAMPLE_RATE: u32 = 22050;

/// Deterministic white noise, xorshift-based
struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        (self.state as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// Generate a click train at `bpm`
///
/// Each click is a 50 ms broadband noise burst with an exponential decay
/// envelope, so every log band sees the onset. `keep_beat` selects which
/// beats actually sound (used for the missing-clicks scenario).
fn click_train_filtered(
    duration_seconds: f32,
    bpm: f32,
    keep_beat: impl Fn(usize) -> bool,
) -> Vec<f32> {
    let num_samples = (duration_seconds * SAMPLE_RATE as f32) as usize;
    let mut samples = vec![0.0f32; num_samples];

    let beat_interval = 60.0 / bpm * SAMPLE_RATE as f32;
    let click_samples = (0.05 * SAMPLE_RATE as f32) as usize;

    let mut noise = NoiseSource::new(0x5EED);
    let click: Vec<f32> = (0..click_samples)
        .map(|i| {
            let t = i as f32 / click_samples as f32;
            noise.next() * (-t * 5.0).exp() * 0.8
        })
        .collect();

    let mut beat = 0usize;
    loop {
        let pos = (beat as f32 * beat_interval).round() as usize;
        if pos >= num_samples {
            break;
        }
        if keep_beat(beat) {
            let end = (pos + click_samples).min(num_samples);
            samples[pos..end].copy_from_slice(&click[..end - pos]);
        }
        beat += 1;
    }

    samples
}

fn click_train(duration_seconds: f32, bpm: f32) -> Vec<f32> {
    click_train_filtered(duration_seconds, bpm, |_| true)
}

/// Run a detector over `samples` in blocks of `block_size`, collecting
/// `(timestamp, bpm)` emissions
fn run_detector(
    samples: &[f32],
    config: DetectorConfig,
    block_size: usize,
    start_time: f64,
) -> Vec<(f64, f32)> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut detector = TempoDetector::new(config).expect("valid test config");
    let emissions = Arc::new(Mutex::new(Vec::new()));
    let sink = emissions.clone();
    detector.set_beat_handler(move |timestamp, bpm| {
        sink.lock().unwrap().push((timestamp, bpm));
    });

    for (i, block) in samples.chunks(block_size).enumerate() {
        let timestamp = start_time + (i * block_size) as f64 / SAMPLE_RATE as f64;
        detector.process_block(block, timestamp);
    }

    let collected = emissions.lock().unwrap().clone();
    collected
}

fn tempo_config(min_tempo: f32, max_tempo: f32) -> DetectorConfig {
    DetectorConfig {
        min_tempo,
        max_tempo,
        ..Default::default()
    }
}

/// Assert the final estimate and the consumer contract for a steady tempo
fn assert_converges(emissions: &[(f64, f32)], expected_bpm: f32, tolerance: f32, config: &DetectorConfig) {
    assert!(
        !emissions.is_empty(),
        "expected tempo emissions for a {:.0} BPM click train",
        expected_bpm
    );

    for &(timestamp, bpm) in emissions {
        assert!(bpm.is_finite() && bpm > 0.0);
        assert!(
            bpm >= config.min_tempo / 2.0 && bpm <= config.max_tempo * 2.0,
            "emitted {:.2} BPM outside the consumer contract",
            bpm
        );
        assert!(timestamp.is_finite());
    }

    let (_, final_bpm) = emissions[emissions.len() - 1];
    assert!(
        (final_bpm - expected_bpm).abs() <= tolerance,
        "expected {:.0} +/- {:.0} BPM, got {:.2}",
        expected_bpm,
        tolerance,
        final_bpm
    );
}

#[test]
fn test_click_train_88_bpm() {
    let audio = click_train(10.0, 88.0);
    let config = tempo_config(40.0, 240.0);
    let emissions = run_detector(&audio, config.clone(), 4096, 0.0);
    assert_converges(&emissions, 88.0, 1.0, &config);
}

#[test]
fn test_click_train_126_bpm() {
    let audio = click_train(15.0, 126.0);
    let config = tempo_config(40.0, 240.0);
    let emissions = run_detector(&audio, config.clone(), 4096, 0.0);
    assert_converges(&emissions, 126.0, 1.0, &config);
}

#[test]
fn test_click_train_60_bpm() {
    let audio = click_train(10.0, 60.0);
    let config = tempo_config(40.0, 240.0);
    let emissions = run_detector(&audio, config.clone(), 4096, 0.0);
    assert_converges(&emissions, 60.0, 1.0, &config);
}

#[test]
fn test_missing_clicks_fold_back_to_base_tempo() {
    // Every other click dropped: raw inter-peak intervals read 45 BPM,
    // which interval folding maps back onto 90
    let audio = click_train_filtered(15.0, 90.0, |beat| beat % 2 == 0);
    let config = tempo_config(60.0, 120.0);
    let emissions = run_detector(&audio, config.clone(), 4096, 0.0);
    assert_converges(&emissions, 90.0, 3.0, &config);
}

#[test]
fn test_tempo_switch_converges() {
    // 100 BPM for 10 s, then 120 BPM for 10 s
    let mut audio = click_train(10.0, 100.0);
    audio.extend(click_train(10.0, 120.0));

    let config = tempo_config(80.0, 160.0);
    let emissions = run_detector(&audio, config.clone(), 4096, 0.0);
    assert_converges(&emissions, 120.0, 3.0, &config);

    // Within 8 s of the switch every estimate tracks the new tempo
    let settled: Vec<_> = emissions.iter().filter(|(t, _)| *t >= 18.0).collect();
    assert!(!settled.is_empty(), "expected emissions after convergence");
    for (timestamp, bpm) in settled {
        assert!(
            (bpm - 120.0).abs() <= 3.0,
            "at {:.2} s expected ~120 BPM, got {:.2}",
            timestamp,
            bpm
        );
    }
}

#[test]
fn test_click_train_180_bpm() {
    let audio = click_train(10.0, 180.0);
    let config = tempo_config(100.0, 200.0);
    let emissions = run_detector(&audio, config.clone(), 4096, 0.0);
    assert_converges(&emissions, 180.0, 3.0, &config);
}

#[test]
fn test_silence_emits_nothing() {
    struct Counters {
        peaks: Arc<Mutex<usize>>,
    }

    impl PlotSink for Counters {
        fn osf_sample(&mut self, _timestamp: f64, _magnitude: f32) {}
        fn peak(&mut self, _timestamp: f64) {
            *self.peaks.lock().unwrap() += 1;
        }
    }

    let mut detector = TempoDetector::new(DetectorConfig::default()).unwrap();
    let peaks = Arc::new(Mutex::new(0usize));
    detector.set_plot_sink(Counters {
        peaks: peaks.clone(),
    });
    let emissions = Arc::new(Mutex::new(Vec::new()));
    let sink = emissions.clone();
    detector.set_beat_handler(move |timestamp, bpm| {
        sink.lock().unwrap().push((timestamp, bpm));
    });

    detector.process_block(&vec![0.0f32; SAMPLE_RATE as usize * 10], 0.0);

    assert_eq!(*peaks.lock().unwrap(), 0, "silence must yield no peaks");
    assert!(emissions.lock().unwrap().is_empty());
}

#[test]
fn test_single_impulse_emits_nothing() {
    // One click in eight seconds of silence: a tempo needs at least two
    // peaks and a full history window
    let audio = click_train_filtered(8.0, 30.0, |beat| beat == 1);
    let emissions = run_detector(&audio, DetectorConfig::default(), 4096, 0.0);
    assert!(emissions.is_empty());
}

#[test]
fn test_rechunking_is_equivalent() {
    let audio = click_train(12.0, 126.0);
    let config = tempo_config(40.0, 240.0);

    let whole = run_detector(&audio, config.clone(), audio.len(), 0.0);
    let medium = run_detector(&audio, config.clone(), 1024, 0.0);
    let ragged = run_detector(&audio, config.clone(), 333, 0.0);

    assert!(!whole.is_empty());
    assert_eq!(whole, medium, "block size must not affect output");
    assert_eq!(whole, ragged, "ragged block sizes must not affect output");
}

#[test]
fn test_timestamp_shift_invariance() {
    let audio = click_train(10.0, 126.0);
    let config = tempo_config(40.0, 240.0);
    let shift = 1000.25;

    let base = run_detector(&audio, config.clone(), 4096, 0.0);
    let shifted = run_detector(&audio, config, 4096, shift);

    assert!(!base.is_empty());
    assert_eq!(base.len(), shifted.len());
    for (&(t0, bpm0), &(t1, bpm1)) in base.iter().zip(&shifted) {
        assert!(
            (t1 - t0 - shift).abs() < 1e-6,
            "timestamps must shift by the input offset"
        );
        assert!(
            (bpm1 - bpm0).abs() < 1e-3,
            "BPM values must be shift invariant: {} vs {}",
            bpm0,
            bpm1
        );
    }
}

#[test]
fn test_reset_matches_fresh_detector() {
    let audio = click_train(10.0, 126.0);
    let config = tempo_config(40.0, 240.0);

    let fresh = run_detector(&audio, config.clone(), 4096, 0.0);

    let mut detector = TempoDetector::new(config).unwrap();
    let emissions = Arc::new(Mutex::new(Vec::new()));
    let sink = emissions.clone();
    detector.set_beat_handler(move |timestamp, bpm| {
        sink.lock().unwrap().push((timestamp, bpm));
    });

    // Pollute the streaming state, then reset
    detector.process_block(&click_train(3.0, 77.0), 0.0);
    detector.reset();
    emissions.lock().unwrap().clear();

    for (i, block) in audio.chunks(4096).enumerate() {
        detector.process_block(block, (i * 4096) as f64 / SAMPLE_RATE as f64);
    }

    let after_reset = emissions.lock().unwrap().clone();
    assert_eq!(fresh, after_reset, "reset must restore fresh behavior");
}

#[test]
fn test_emission_timestamps_increase() {
    let audio = click_train(15.0, 126.0);
    let emissions = run_detector(&audio, tempo_config(40.0, 240.0), 4096, 0.0);

    assert!(emissions.len() > 1);
    for pair in emissions.windows(2) {
        assert!(pair[1].0 > pair[0].0, "emission timestamps must increase");
    }
}
