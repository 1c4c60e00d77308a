use serde::Serialize;
use std::collections::VecDeque;

use super::bands::Bands;
use super::history::Window;

const BEAT_ENERGY_THRESHOLD: f32 = 1.3;
const BEAT_VARIANCE_SLOPE: f32 = -0.0025714;

/// Longest plausible gap between beats (60 BPM) and shortest (200 BPM).
const MAX_BEAT_INTERVAL: f32 = 1.0;
const MIN_BEAT_INTERVAL: f32 = 0.3;
const TEMPO_INTERVALS: usize = 16;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Beat {
    pub detected: bool,
    /// 0.0-1.0, zero unless `detected`
    pub confidence: f32,
    pub bpm: f32,
    pub kick: bool,
    pub snare: bool,
    pub hihat: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Onset {
    pub detected: bool,
    pub strength: f32,
}

/// Energy-against-recent-average beat decision.
///
/// The threshold relaxes as the trailing energy gets noisier:
/// `threshold = -0.0025714 * variance + 1.3`. With no history the result is
/// `(false, 0.0)`.
pub fn detect_beat(energy: f32, history: &Window, window: usize) -> (bool, f32) {
    let count = history.len().min(window);
    if count == 0 {
        return (false, 0.0);
    }

    let n = count as f32;
    let mean = history.last(count).sum::<f32>() / n;
    let variance = history
        .last(count)
        .map(|&e| (e - mean).powi(2))
        .sum::<f32>()
        / n;

    let threshold = BEAT_VARIANCE_SLOPE * variance + BEAT_ENERGY_THRESHOLD;
    let bar = mean * threshold;

    let detected = energy > bar;
    let confidence = if detected { (energy / bar).min(1.0) } else { 0.0 };
    (detected, confidence)
}

/// Kick, snare and hihat flags straight from band levels.
pub fn drum_flags(bands: &Bands) -> (bool, bool, bool) {
    let kick = bands.sub_bass.value > 0.7 || bands.bass.value > 0.75;
    let snare = bands.mid.value > 0.7 && bands.high_mid.value > 0.6;
    let hihat = bands.treble.value > 0.7;
    (kick, snare, hihat)
}

/// Sudden rise of `energy` over the mean of the newest `window` history entries.
pub fn detect_onset(energy: f32, history: &Window, window: usize, threshold: f32) -> Onset {
    if window == 0 || history.len() < window {
        return Onset::default();
    }

    let recent = history.last(window).sum::<f32>() / window as f32;
    let ratio = if recent > 0.0 { energy / recent } else { 1.0 };

    Onset {
        detected: ratio > threshold,
        strength: (ratio - threshold).max(0.0),
    }
}

/// Tempo estimate from the spacing of detected beats.
#[derive(Clone, Debug)]
pub struct TempoTracker {
    frame_rate: f32,
    frame: u64,
    last_beat_frame: Option<u64>,
    previous_detected: bool,
    intervals: VecDeque<f32>,
}

impl TempoTracker {
    pub fn new(frame_rate: f32) -> Self {
        Self {
            frame_rate,
            frame: 0,
            last_beat_frame: None,
            previous_detected: false,
            intervals: VecDeque::with_capacity(TEMPO_INTERVALS + 1),
        }
    }

    /// Feed this frame's beat decision and return the current estimate.
    pub fn update(&mut self, detected: bool) -> f32 {
        if detected && !self.previous_detected {
            if let Some(last) = self.last_beat_frame {
                let interval = (self.frame - last) as f32 / self.frame_rate;
                self.intervals.push_back(interval);
                if self.intervals.len() > TEMPO_INTERVALS {
                    self.intervals.pop_front();
                }
            }
            self.last_beat_frame = Some(self.frame);
        }
        self.previous_detected = detected;
        self.frame += 1;
        self.bpm()
    }

    /// Median of plausible intervals as beats per minute, 0.0 when unknown.
    pub fn bpm(&self) -> f32 {
        let mut reasonable: Vec<f32> = self
            .intervals
            .iter()
            .copied()
            .filter(|&i| (MIN_BEAT_INTERVAL..=MAX_BEAT_INTERVAL).contains(&i))
            .collect();

        if reasonable.len() < 2 {
            return 0.0;
        }

        reasonable.sort_by(|a, b| a.total_cmp(b));
        60.0 / reasonable[reasonable.len() / 2]
    }

    pub fn reset(&mut self) {
        *self = TempoTracker::new(self.frame_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(values: &[f32]) -> Window {
        let mut window = Window::new(100);
        for &v in values {
            window.push(v);
        }
        window
    }

    #[test]
    fn no_beat_without_history() {
        assert_eq!(detect_beat(1.0, &Window::new(100), 43), (false, 0.0));
    }

    #[test]
    fn flat_history_uses_base_threshold() {
        let history = window_of(&[0.5; 43]);
        // variance 0 => threshold 1.3, bar 0.65
        assert_eq!(detect_beat(0.64, &history, 43).0, false);
        let (detected, confidence) = detect_beat(0.7, &history, 43);
        assert!(detected);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn only_trailing_window_counts() {
        let mut values = vec![10.0; 57];
        values.extend(std::iter::repeat(0.1).take(43));
        let history = window_of(&values);
        assert!(detect_beat(0.2, &history, 43).0);
    }

    #[test]
    fn silence_never_beats() {
        let history = window_of(&[0.0; 50]);
        assert_eq!(detect_beat(0.0, &history, 43), (false, 0.0));
    }

    #[test]
    fn onset_on_spike() {
        let history = window_of(&[0.1; 5]);
        let onset = detect_onset(1.0, &history, 3, 1.5);
        assert!(onset.detected);
        assert!((onset.strength - 8.5).abs() < 1e-4);
    }

    #[test]
    fn onset_needs_warm_up() {
        let history = window_of(&[0.1, 0.1]);
        assert_eq!(detect_onset(1.0, &history, 3, 1.5), Onset::default());
    }

    #[test]
    fn onset_ratio_defaults_to_one_on_silence() {
        let history = window_of(&[0.0; 3]);
        let onset = detect_onset(0.5, &history, 3, 1.5);
        assert!(!onset.detected);
        assert_eq!(onset.strength, 0.0);
    }

    #[test]
    fn drum_flags_follow_bands() {
        let mut bands = Bands::default();
        let mut snapshot = [0u8; 512];
        snapshot[..10].fill(255);
        bands.aggregate(&snapshot, 0.9);
        assert_eq!(drum_flags(&bands), (true, false, false));

        snapshot[70..250].fill(230);
        snapshot[250..512].fill(200);
        bands.aggregate(&snapshot, 0.9);
        assert_eq!(drum_flags(&bands), (true, true, true));
    }

    #[test]
    fn tempo_from_regular_beats() {
        let mut tempo = TempoTracker::new(60.0);
        let mut bpm = 0.0;
        for frame in 0..300 {
            bpm = tempo.update(frame % 30 == 0);
        }
        assert!((bpm - 120.0).abs() < 1e-3);

        tempo.reset();
        assert_eq!(tempo.bpm(), 0.0);
    }

    #[test]
    fn held_beat_counts_once() {
        let mut tempo = TempoTracker::new(60.0);
        for frame in 0..300 {
            tempo.update(frame % 30 < 5);
        }
        assert!((tempo.bpm() - 120.0).abs() < 1e-3);
    }
}
