use serde::Serialize;

use super::bands::Bands;

/// Whole-spectrum descriptors, recomputed every frame.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub peak: f32,
    pub rms: f32,
    /// Same as `rms`; kept separately since consumers read it as "energy"
    pub energy: f32,
    /// Magnitude-weighted mean bin index, normalized by bin count (0.0-1.0)
    pub spectral_centroid: f32,
    /// Geometric over arithmetic mean; near 1 for noise, near 0 for tones
    pub spectral_flatness: f32,
    /// Normalized bin below which `rolloff_fraction` of the magnitude sits
    pub spectral_rolloff: f32,
    pub dynamic_range: f32,
    pub punch: f32,
    pub brightness: f32,
    pub warmth: f32,
    pub presence: f32,
}

impl Metrics {
    pub const NAMES: [&'static str; 11] = [
        "peak",
        "rms",
        "energy",
        "spectralCentroid",
        "spectralFlatness",
        "spectralRolloff",
        "dynamicRange",
        "punch",
        "brightness",
        "warmth",
        "presence",
    ];

    /// Look up a metric by its camelCase name.
    pub fn get(&self, name: &str) -> Option<f32> {
        let value = match name {
            "peak" => self.peak,
            "rms" => self.rms,
            "energy" => self.energy,
            "spectralCentroid" => self.spectral_centroid,
            "spectralFlatness" => self.spectral_flatness,
            "spectralRolloff" => self.spectral_rolloff,
            "dynamicRange" => self.dynamic_range,
            "punch" => self.punch,
            "brightness" => self.brightness,
            "warmth" => self.warmth,
            "presence" => self.presence,
            _ => return None,
        };
        Some(value)
    }

    /// Recompute every field from `snapshot` and the already aggregated `bands`.
    pub fn compute(&mut self, snapshot: &[u8], bands: &Bands, rolloff_fraction: f32) {
        let length = snapshot.len();
        if length == 0 {
            *self = Metrics::default();
            return;
        }
        let n = length as f32;

        let mut peak = 0u8;
        let mut min = u8::MAX;
        let mut square_sum = 0.0f32;
        let mut weighted_sum = 0.0f64;
        let mut total: u64 = 0;
        let mut log_sum = 0.0f64;

        for (i, &v) in snapshot.iter().enumerate() {
            let normalized = v as f32 / 255.0;
            peak = peak.max(v);
            min = min.min(v);
            square_sum += normalized * normalized;
            weighted_sum += i as f64 * v as f64;
            total += v as u64;
            log_sum += (v as f64 + 1.0).ln();
        }

        self.peak = peak as f32 / 255.0;
        self.rms = (square_sum / n).sqrt();
        self.energy = self.rms;

        self.spectral_centroid = if total > 0 {
            (weighted_sum / total as f64 / length as f64) as f32
        } else {
            0.0
        };

        let arithmetic_mean = total as f32 / n;
        let geometric_mean = (log_sum / length as f64).exp() as f32;
        self.spectral_flatness = if arithmetic_mean > 0.0 {
            geometric_mean / arithmetic_mean
        } else {
            0.0
        };

        self.spectral_rolloff = spectral_rolloff(snapshot, rolloff_fraction);
        self.dynamic_range = (peak - min) as f32 / 255.0;

        self.punch = ((bands.bass.value + bands.sub_bass.value - 0.5) * 2.0).max(0.0);
        self.brightness = (bands.high_mid.value + bands.treble.value) / 2.0;
        self.warmth = (bands.low_mid.value + bands.mid.value) / 2.0;
        self.presence = bands.high_mid.value;
    }
}

/// Normalized index of the first bin at which the cumulative magnitude
/// reaches `fraction` of the total. `fraction` is clamped to 0.0..=1.0.
pub fn spectral_rolloff(snapshot: &[u8], fraction: f32) -> f32 {
    if snapshot.is_empty() {
        return 0.0;
    }
    let fraction = fraction.clamp(0.0, 1.0) as f64;
    let total: u64 = snapshot.iter().map(|&v| v as u64).sum();
    let threshold = total as f64 * fraction;

    let mut cumulative: u64 = 0;
    for (i, &v) in snapshot.iter().enumerate() {
        cumulative += v as u64;
        if cumulative as f64 >= threshold {
            return i as f32 / snapshot.len() as f32;
        }
    }
    0.0
}
