use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Deserialize;

use super::decode::AudioData;
use crate::error::SourceError;

/// Anything that can refresh a byte spectrum once per frame.
pub trait SignalSource {
    /// Length of the snapshot this source fills.
    fn bin_count(&self) -> usize;

    /// Overwrite `snapshot` with the next frame. Returns false when there are
    /// no more frames; `snapshot` is then left untouched.
    fn refresh(&mut self, snapshot: &mut [u8]) -> bool;
}

/// Browser analyser node parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AnalyserSettings {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f32,
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
        }
    }
}

fn default_fft_size() -> usize { 2048 }
fn default_smoothing() -> f32 { 0.8 }
fn default_min_decibels() -> f32 { -90.0 }
fn default_max_decibels() -> f32 { -10.0 }

impl AnalyserSettings {
    pub fn validate(&self) -> Result<(), SourceError> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(SourceError::InvalidFftSize(self.fft_size));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(SourceError::InvalidSmoothing(self.smoothing));
        }
        if !self.min_decibels.is_finite()
            || !self.max_decibels.is_finite()
            || self.min_decibels >= self.max_decibels
        {
            return Err(SourceError::InvalidDecibelRange {
                min: self.min_decibels,
                max: self.max_decibels,
            });
        }
        Ok(())
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

/// Time-domain window to byte spectrum, the way a browser analyser node does
/// it: Blackman window, FFT, magnitude scaled by 1/N, exponential smoothing
/// over time, then decibels mapped linearly onto 0..=255.
pub struct ByteFrequencyAnalyser {
    settings: AnalyserSettings,
    window: Vec<f32>,
    smoothed: Vec<f32>,
}

impl ByteFrequencyAnalyser {
    pub fn new(settings: AnalyserSettings) -> Result<Self, SourceError> {
        settings.validate()?;
        Ok(Self {
            window: blackman_window(settings.fft_size),
            smoothed: vec![0.0; settings.bin_count()],
            settings,
        })
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }

    /// Unsmoothed magnitude spectrum of one `fft_size` block.
    pub fn magnitudes(&self, planner: &mut FftPlanner<f32>, block: &[f32]) -> Vec<f32> {
        let n = self.settings.fft_size;
        let fft = planner.plan_fft_forward(n);

        let mut buffer: Vec<Complex<f32>> = block
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        buffer.resize(n, Complex::new(0.0, 0.0));
        fft.process(&mut buffer);

        buffer[..n / 2].iter().map(|c| c.norm() / n as f32).collect()
    }

    /// Fold `magnitudes` into the running smoothed spectrum and write bytes.
    pub fn write_bytes(&mut self, magnitudes: &[f32], out: &mut [u8]) {
        let tau = self.settings.smoothing;
        let min = self.settings.min_decibels;
        let range = self.settings.max_decibels - min;

        for ((smoothed, &magnitude), byte) in self
            .smoothed
            .iter_mut()
            .zip(magnitudes.iter())
            .zip(out.iter_mut())
        {
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            let db = if *smoothed > 0.0 {
                20.0 * smoothed.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 / range * (db - min);
            *byte = scaled.floor().clamp(0.0, 255.0) as u8;
        }
    }

    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42f32, 0.5f32, 0.08f32);
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / n;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

/// Plays a decoded track through a `ByteFrequencyAnalyser` at a fixed frame
/// rate. FFT magnitudes for every frame are computed up front in parallel;
/// smoothing runs as frames are pulled since it depends on the previous one.
pub struct FileSignalSource {
    analyser: ByteFrequencyAnalyser,
    frames: Vec<Vec<f32>>,
    next: usize,
    fps: u32,
}

impl FileSignalSource {
    pub fn new(audio: &AudioData, settings: AnalyserSettings, fps: u32) -> Result<Self, SourceError> {
        if fps == 0 {
            return Err(SourceError::InvalidFrameRate);
        }
        let analyser = ByteFrequencyAnalyser::new(settings)?;

        let samples_per_frame = audio.sample_rate as f64 / fps as f64;
        let total_frames = match audio.sample_rate as u64 {
            0 => 0,
            rate => ((audio.samples.len() as u64 * fps as u64).div_ceil(rate)) as usize,
        };
        let fft_size = analyser.settings().fft_size;

        log::info!(
            "Computing {} spectrum frames (fft_size={}, {:.1} samples/frame)...",
            total_frames, fft_size, samples_per_frame
        );

        let frames: Vec<Vec<f32>> = (0..total_frames)
            .into_par_iter()
            .map_init(
                || (FftPlanner::<f32>::new(), vec![0.0f32; fft_size]),
                |(planner, block), frame_idx| {
                    let end = ((frame_idx + 1) as f64 * samples_per_frame) as usize;
                    audio.window_ending_at(end, block);
                    analyser.magnitudes(planner, block)
                },
            )
            .collect();

        Ok(Self {
            analyser,
            frames,
            next: 0,
            fps,
        })
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame the next `refresh` will produce.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn rewind(&mut self) {
        self.next = 0;
        self.analyser.reset();
    }
}

impl SignalSource for FileSignalSource {
    fn bin_count(&self) -> usize {
        self.analyser.settings().bin_count()
    }

    fn refresh(&mut self, snapshot: &mut [u8]) -> bool {
        let Some(magnitudes) = self.frames.get(self.next) else {
            return false;
        };
        self.analyser.write_bytes(magnitudes, snapshot);
        self.next += 1;
        true
    }
}
