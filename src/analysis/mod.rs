//! Per-frame spectrum analysis: bands, metrics, history, beat and onset.

pub mod bands;
pub mod detect;
pub mod history;
pub mod metrics;

use serde::{Deserialize, Serialize};

use crate::audio::source::SignalSource;
use crate::error::AnalyzerError;

pub use bands::{Band, BandName, Bands, BAND_TABLE_END};
pub use detect::{Beat, Onset, TempoTracker};
pub use history::{History, Window};
pub use metrics::{spectral_rolloff, Metrics};

/// Tunables of the analysis engine. Defaults tuned for ~60 fps rendering of a
/// 1024-bin spectrum.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AnalyzerConfig {
    #[serde(default = "default_band_decay")]
    pub band_decay: f32,
    #[serde(default = "default_rolloff_fraction")]
    pub rolloff_fraction: f32,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// ~1 second of frames at 60 fps
    #[serde(default = "default_beat_window")]
    pub beat_window: usize,
    #[serde(default = "default_onset_window")]
    pub onset_window: usize,
    #[serde(default = "default_onset_threshold")]
    pub onset_threshold: f32,
    /// Frames per second the analyzer is driven at; only used for tempo.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            band_decay: default_band_decay(),
            rolloff_fraction: default_rolloff_fraction(),
            history_capacity: default_history_capacity(),
            beat_window: default_beat_window(),
            onset_window: default_onset_window(),
            onset_threshold: default_onset_threshold(),
            frame_rate: default_frame_rate(),
        }
    }
}

fn default_band_decay() -> f32 { 0.9 }
fn default_rolloff_fraction() -> f32 { 0.85 }
fn default_history_capacity() -> usize { 100 }
fn default_beat_window() -> usize { 43 }
fn default_onset_window() -> usize { 3 }
fn default_onset_threshold() -> f32 { 1.5 }
fn default_frame_rate() -> f32 { 60.0 }

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if !(0.0..=1.0).contains(&self.band_decay) {
            return Err(AnalyzerError::InvalidBandDecay(self.band_decay));
        }
        if self.beat_window == 0 {
            return Err(AnalyzerError::EmptyWindow { name: "beat" });
        }
        if self.onset_window == 0 {
            return Err(AnalyzerError::EmptyWindow { name: "onset" });
        }
        if self.history_capacity < self.onset_window {
            return Err(AnalyzerError::HistoryTooShort {
                capacity: self.history_capacity,
                required: self.onset_window,
            });
        }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(AnalyzerError::InvalidFrameRate(self.frame_rate));
        }
        Ok(())
    }
}

/// Everything a visualizer needs for the current frame.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct AnalysisFrame<'a> {
    pub bands: &'a Bands,
    pub metrics: &'a Metrics,
    pub beat: &'a Beat,
    pub onset: &'a Onset,
    #[serde(skip)]
    pub raw: &'a [u8],
}

/// Owns the snapshot buffer and all derived state. Drive it once per frame.
pub struct AudioAnalyzer {
    config: AnalyzerConfig,
    snapshot: Vec<u8>,
    bands: Bands,
    metrics: Metrics,
    history: History,
    beat: Beat,
    onset: Onset,
    tempo: TempoTracker,
}

impl AudioAnalyzer {
    pub fn new(config: AnalyzerConfig, bin_count: usize) -> Result<Self, AnalyzerError> {
        config.validate()?;
        if bin_count < BAND_TABLE_END {
            return Err(AnalyzerError::BinCountTooSmall {
                bins: bin_count,
                required: BAND_TABLE_END,
            });
        }

        log::debug!(
            "Analyzer: {} bins, history={}, beat window={}",
            bin_count, config.history_capacity, config.beat_window
        );

        Ok(Self {
            snapshot: vec![0; bin_count],
            bands: Bands::default(),
            metrics: Metrics::default(),
            history: History::new(config.history_capacity),
            beat: Beat::default(),
            onset: Onset::default(),
            tempo: TempoTracker::new(config.frame_rate),
            config,
        })
    }

    pub fn bin_count(&self) -> usize {
        self.snapshot.len()
    }

    /// Pull the next snapshot from `source` and analyze it. Returns false once
    /// the source is exhausted, leaving the previous frame's results intact.
    pub fn analyze<S: SignalSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<bool, AnalyzerError> {
        if source.bin_count() != self.snapshot.len() {
            return Err(AnalyzerError::SnapshotLength {
                expected: self.snapshot.len(),
                actual: source.bin_count(),
            });
        }
        if !source.refresh(&mut self.snapshot) {
            return Ok(false);
        }
        self.process();
        Ok(true)
    }

    /// Analyze a snapshot supplied directly by the caller.
    pub fn analyze_snapshot(&mut self, snapshot: &[u8]) -> Result<(), AnalyzerError> {
        if snapshot.len() != self.snapshot.len() {
            return Err(AnalyzerError::SnapshotLength {
                expected: self.snapshot.len(),
                actual: snapshot.len(),
            });
        }
        self.snapshot.copy_from_slice(snapshot);
        self.process();
        Ok(())
    }

    fn process(&mut self) {
        self.bands.aggregate(&self.snapshot, self.config.band_decay);
        self.metrics
            .compute(&self.snapshot, &self.bands, self.config.rolloff_fraction);

        // Detection compares against history as it stood before this frame.
        let energy = self.metrics.energy;
        let (detected, confidence) =
            detect::detect_beat(energy, &self.history.energy, self.config.beat_window);
        let (kick, snare, hihat) = detect::drum_flags(&self.bands);
        self.beat = Beat {
            detected,
            confidence,
            bpm: self.tempo.update(detected),
            kick,
            snare,
            hihat,
        };
        self.onset = detect::detect_onset(
            energy,
            &self.history.energy,
            self.config.onset_window,
            self.config.onset_threshold,
        );

        self.history
            .record(energy, self.bands.bass.value, self.metrics.spectral_centroid);
    }

    pub fn data(&self) -> AnalysisFrame<'_> {
        AnalysisFrame {
            bands: &self.bands,
            metrics: &self.metrics,
            beat: &self.beat,
            onset: &self.onset,
            raw: &self.snapshot,
        }
    }

    pub fn band(&self, name: BandName) -> &Band {
        self.bands.get(name)
    }

    pub fn metric(&self, name: &str) -> Option<f32> {
        self.metrics.get(name)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Forget history, band averages and tempo, e.g. when the track changes.
    pub fn reset(&mut self) {
        self.history.clear();
        self.bands.reset_averages();
        self.tempo.reset();
        self.beat = Beat::default();
        self.onset = Onset::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINS: usize = 1024;

    fn analyzer() -> AudioAnalyzer {
        AudioAnalyzer::new(AnalyzerConfig::default(), BINS).unwrap()
    }

    /// Snapshot whose energy is `sqrt(lit / BINS)`.
    fn lit(lit: usize) -> Vec<u8> {
        let mut snapshot = vec![0u8; BINS];
        snapshot[..lit].fill(255);
        snapshot
    }

    struct Scripted {
        bins: usize,
        frames: Vec<Vec<u8>>,
    }

    impl Scripted {
        fn new(frames: Vec<Vec<u8>>) -> Self {
            Self { bins: BINS, frames }
        }
    }

    impl SignalSource for Scripted {
        fn bin_count(&self) -> usize {
            self.bins
        }

        fn refresh(&mut self, snapshot: &mut [u8]) -> bool {
            if self.frames.is_empty() {
                return false;
            }
            let frame = self.frames.remove(0);
            snapshot[..frame.len()].copy_from_slice(&frame);
            true
        }
    }

    #[test]
    fn rejects_short_spectrum() {
        assert_eq!(
            AudioAnalyzer::new(AnalyzerConfig::default(), 256).err(),
            Some(AnalyzerError::BinCountTooSmall { bins: 256, required: 512 })
        );
    }

    #[test]
    fn rejects_mismatched_snapshot() {
        let mut a = analyzer();
        assert_eq!(
            a.analyze_snapshot(&[0u8; 100]),
            Err(AnalyzerError::SnapshotLength { expected: BINS, actual: 100 })
        );
    }

    #[test]
    fn validates_config() {
        assert!(AnalyzerConfig::default().validate().is_ok());

        let config = AnalyzerConfig { band_decay: 5.0, ..AnalyzerConfig::default() };
        assert_eq!(
            AudioAnalyzer::new(config, BINS).err(),
            Some(AnalyzerError::InvalidBandDecay(5.0))
        );

        let config = AnalyzerConfig { beat_window: 0, ..AnalyzerConfig::default() };
        assert_eq!(config.validate(), Err(AnalyzerError::EmptyWindow { name: "beat" }));

        let config = AnalyzerConfig { onset_window: 0, ..AnalyzerConfig::default() };
        assert_eq!(config.validate(), Err(AnalyzerError::EmptyWindow { name: "onset" }));

        let config = AnalyzerConfig { history_capacity: 2, ..AnalyzerConfig::default() };
        assert_eq!(
            AudioAnalyzer::new(config, BINS).err(),
            Some(AnalyzerError::HistoryTooShort { capacity: 2, required: 3 })
        );

        let config = AnalyzerConfig { frame_rate: 0.0, ..AnalyzerConfig::default() };
        assert_eq!(config.validate(), Err(AnalyzerError::InvalidFrameRate(0.0)));

        let config = AnalyzerConfig { frame_rate: f32::NAN, ..AnalyzerConfig::default() };
        assert!(matches!(config.validate(), Err(AnalyzerError::InvalidFrameRate(_))));
    }

    #[test]
    fn smallest_history_still_detects_onsets() {
        let config = AnalyzerConfig { history_capacity: 3, ..AnalyzerConfig::default() };
        let mut a = AudioAnalyzer::new(config, BINS).unwrap();
        for _ in 0..5 {
            a.analyze_snapshot(&lit(16)).unwrap();
        }
        a.analyze_snapshot(&[255u8; BINS]).unwrap();
        assert!(a.data().onset.detected);
    }

    #[test]
    fn silence_is_neutral() {
        let mut a = analyzer();
        for _ in 0..60 {
            a.analyze_snapshot(&[0u8; BINS]).unwrap();
        }
        let data = a.data();
        assert!(data.bands.iter().all(|b| b.value == 0.0 && b.peak == 0.0));
        assert_eq!(data.metrics.energy, 0.0);
        assert_eq!(data.metrics.spectral_centroid, 0.0);
        assert_eq!(data.metrics.punch, 0.0);
        assert!(!data.beat.detected);
        assert!(!data.onset.detected);
    }

    #[test]
    fn full_scale_snapshot() {
        let mut a = analyzer();
        a.analyze_snapshot(&[255u8; BINS]).unwrap();
        let data = a.data();
        assert!(data.bands.iter().all(|b| (b.value - 1.0).abs() < 1e-5));
        assert!(data.bands.iter().all(|b| (b.peak - 1.0).abs() < 1e-5));
        assert!((data.metrics.energy - 1.0).abs() < 1e-5);
        assert_eq!(data.metrics.dynamic_range, 0.0);
    }

    #[test]
    fn sub_bass_hit() {
        let mut a = analyzer();
        a.analyze_snapshot(&lit(10)).unwrap();
        assert!((a.band(BandName::SubBass).value - 1.0).abs() < 1e-5);
        assert_eq!(a.band(BandName::Treble).value, 0.0);
        assert!(a.metric("punch").unwrap() > 0.0);
        assert!(a.data().beat.kick);
    }

    #[test]
    fn onset_after_flat_run() {
        let mut a = analyzer();
        // energy 0.125 for five frames, then 1.0
        for _ in 0..5 {
            a.analyze_snapshot(&lit(16)).unwrap();
            assert!(!a.data().onset.detected);
        }
        a.analyze_snapshot(&[255u8; BINS]).unwrap();
        let onset = a.data().onset;
        assert!(onset.detected);
        assert!((onset.strength - 6.5).abs() < 1e-3);
        assert!(a.data().beat.detected);
    }

    #[test]
    fn onset_after_tenfold_jump() {
        let mut a = analyzer();
        // 256 bins at 0.2 give energy 0.1
        let mut quiet = vec![0u8; BINS];
        quiet[..256].fill(51);
        for _ in 0..5 {
            a.analyze_snapshot(&quiet).unwrap();
        }
        assert!((a.history().energy.last(1).sum::<f32>() - 0.1).abs() < 1e-5);

        a.analyze_snapshot(&[255u8; BINS]).unwrap();
        let onset = a.data().onset;
        assert!(onset.detected);
        assert!((onset.strength - 8.5).abs() < 1e-3);
    }

    #[test]
    fn history_is_bounded() {
        let mut a = analyzer();
        for i in 0..150 {
            a.analyze_snapshot(&lit(i % 20)).unwrap();
        }
        assert_eq!(a.history().energy.len(), 100);
        assert_eq!(a.history().bass.len(), 100);
        assert_eq!(a.history().spectral_centroid.len(), 100);
    }

    #[test]
    fn drives_from_source() {
        let mut a = analyzer();
        let mut source = Scripted::new(vec![lit(10), lit(20)]);
        assert_eq!(a.analyze(&mut source), Ok(true));
        assert_eq!(a.analyze(&mut source), Ok(true));
        assert_eq!(a.analyze(&mut source), Ok(false));
        assert_eq!(a.history().energy.len(), 2);
        assert_eq!(a.data().raw[15], 255);
    }

    #[test]
    fn rejects_mismatched_source() {
        let mut a = analyzer();
        a.analyze_snapshot(&[255u8; BINS]).unwrap();

        let mut source = Scripted {
            bins: 512,
            frames: vec![vec![0u8; 512]],
        };
        assert_eq!(
            a.analyze(&mut source),
            Err(AnalyzerError::SnapshotLength { expected: BINS, actual: 512 })
        );
        // nothing was pulled or analysed
        assert_eq!(source.frames.len(), 1);
        assert_eq!(a.history().energy.len(), 1);
        assert!((a.data().metrics.energy - 1.0).abs() < 1e-5);
    }

    #[test]
    fn reset_clears_state() {
        let mut a = analyzer();
        for _ in 0..10 {
            a.analyze_snapshot(&lit(64)).unwrap();
        }
        assert!(a.band(BandName::SubBass).average > 0.0);
        a.reset();
        assert!(a.history().energy.is_empty());
        assert_eq!(a.band(BandName::SubBass).average, 0.0);
        assert_eq!(*a.data().beat, Beat::default());
    }
}
