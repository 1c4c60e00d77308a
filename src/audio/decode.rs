use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Mono PCM track, samples in -1.0..=1.0.
#[derive(Clone, Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioData {
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Copy the `out.len()` samples that end just before sample index `end`
    /// into `out`. Positions before the start of the track are zero.
    pub fn window_ending_at(&self, end: usize, out: &mut [f32]) {
        let len = out.len();
        let end = end.min(self.samples.len());
        let start = end.saturating_sub(len);
        let available = end - start;
        let pad = len - available;

        out[..pad].fill(0.0);
        out[pad..].copy_from_slice(&self.samples[start..end]);
    }
}

pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e).context("Failed to read audio packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(e).context("Failed to decode audio packet"),
        };

        let spec = *decoded.spec();
        let mut buffer = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        // The analyser sees a single channel, like a browser's mono mixdown
        samples.extend(
            buffer
                .samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    if skipped_packets > 0 {
        log::warn!("Skipped {} undecodable packets", skipped_packets);
    }

    let audio = AudioData { samples, sample_rate };
    log::info!(
        "Decoded audio: {} samples, {} channel(s) mixed to mono, {}Hz, {:.1}s",
        audio.samples.len(),
        channels,
        sample_rate,
        audio.duration()
    );

    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> AudioData {
        AudioData {
            samples: (1..=len).map(|i| i as f32).collect(),
            sample_rate: 10,
        }
    }

    #[test]
    fn duration_in_seconds() {
        assert_eq!(ramp(25).duration(), 2.5);
    }

    #[test]
    fn window_pads_before_start() {
        let audio = ramp(10);
        let mut out = [9.9f32; 4];
        audio.window_ending_at(2, &mut out);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn window_clamps_past_end() {
        let audio = ramp(10);
        let mut out = [0.0f32; 3];
        audio.window_ending_at(50, &mut out);
        assert_eq!(out, [8.0, 9.0, 10.0]);
    }
}
