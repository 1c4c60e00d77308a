use serde::Serialize;
use std::io::Write;

use crate::analysis::AnalysisFrame;

/// One line of the JSON-lines report.
#[derive(Serialize)]
pub struct FrameRecord<'a> {
    pub frame: usize,
    pub time: f32,
    #[serde(flatten)]
    pub data: AnalysisFrame<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<&'a [u8]>,
}

/// Totals over an analysis run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub frames: usize,
    pub beats: usize,
    pub onsets: usize,
    pub kicks: usize,
    pub snares: usize,
    pub hihats: usize,
    pub mean_energy: f32,
    pub mean_spectral_centroid: f32,
    pub bpm: f32,
    #[serde(skip)]
    energy_sum: f64,
    #[serde(skip)]
    centroid_sum: f64,
}

impl Summary {
    pub fn add(&mut self, frame: &AnalysisFrame<'_>) {
        self.frames += 1;
        self.beats += frame.beat.detected as usize;
        self.onsets += frame.onset.detected as usize;
        self.kicks += frame.beat.kick as usize;
        self.snares += frame.beat.snare as usize;
        self.hihats += frame.beat.hihat as usize;
        self.energy_sum += frame.metrics.energy as f64;
        self.centroid_sum += frame.metrics.spectral_centroid as f64;

        let n = self.frames as f64;
        self.mean_energy = (self.energy_sum / n) as f32;
        self.mean_spectral_centroid = (self.centroid_sum / n) as f32;
        self.bpm = frame.beat.bpm;
    }
}

/// Writes one JSON object per frame, newline separated.
pub struct ReportWriter<W: Write> {
    out: W,
    include_raw: bool,
    fps: f32,
    summary: Summary,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, fps: u32, include_raw: bool) -> Self {
        Self {
            out,
            include_raw,
            fps: fps.max(1) as f32,
            summary: Summary::default(),
        }
    }

    pub fn write_frame(&mut self, frame_idx: usize, frame: AnalysisFrame<'_>) -> serde_json::Result<()> {
        self.summary.add(&frame);
        let record = FrameRecord {
            frame: frame_idx,
            time: frame_idx as f32 / self.fps,
            raw: self.include_raw.then_some(frame.raw),
            data: frame,
        };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n").map_err(serde_json::Error::io)
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Flush and hand back the writer with the final summary.
    pub fn finish(mut self) -> std::io::Result<(W, Summary)> {
        self.out.flush()?;
        Ok((self.out, self.summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalyzerConfig, AudioAnalyzer};

    fn analyzer() -> AudioAnalyzer {
        AudioAnalyzer::new(AnalyzerConfig::default(), 512).unwrap()
    }

    #[test]
    fn writes_one_line_per_frame() {
        let mut analyzer = analyzer();
        let mut writer = ReportWriter::new(Vec::new(), 60, false);
        for level in [10u8, 20, 255] {
            analyzer.analyze_snapshot(&[level; 512]).unwrap();
            writer.write_frame(writer.summary().frames, analyzer.data()).unwrap();
        }
        let (bytes, summary) = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(summary.frames, 3);

        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["frame"], 2);
        assert!((last["metrics"]["energy"].as_f64().unwrap() - 1.0).abs() < 1e-5);
        assert_eq!(last["bands"]["subBass"]["end"], 10);
        assert!(last["metrics"]["spectralCentroid"].is_number());
        assert!(last["beat"]["detected"].as_bool().unwrap());
        assert!(last.get("raw").is_none());
    }

    #[test]
    fn raw_snapshot_is_optional() {
        let mut analyzer = analyzer();
        analyzer.analyze_snapshot(&[3u8; 512]).unwrap();
        let mut writer = ReportWriter::new(Vec::new(), 30, true);
        writer.write_frame(0, analyzer.data()).unwrap();
        let (bytes, _) = writer.finish().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["raw"].as_array().unwrap().len(), 512);
    }

    #[test]
    fn summary_counts_events() {
        let mut analyzer = analyzer();
        let mut summary = Summary::default();
        let mut kick = [0u8; 512];
        kick[..10].fill(255);
        for snapshot in [[0u8; 512], kick, [0u8; 512], kick] {
            analyzer.analyze_snapshot(&snapshot).unwrap();
            summary.add(&analyzer.data());
        }
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.kicks, 2);
        assert!(summary.mean_energy > 0.0);
    }
}
