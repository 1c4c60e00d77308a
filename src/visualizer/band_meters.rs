use super::{cells, Canvas, Visualizer};
use crate::analysis::{AnalysisFrame, BandName};

const LABEL_WIDTH: usize = 8;

/// One horizontal meter per band: `=` for the current value, `:` for the
/// running average and `>` at the peak.
pub struct BandMeters;

impl BandMeters {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BandMeters {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for BandMeters {
    fn name(&self) -> &'static str {
        "band-meters"
    }

    fn draw(&mut self, canvas: &mut Canvas, frame: &AnalysisFrame<'_>) {
        let meter_width = canvas.width().saturating_sub(LABEL_WIDTH);

        for (row, name) in BandName::ALL.into_iter().enumerate() {
            let band = frame.bands.get(name);
            canvas.text(0, row, name.as_str());

            let average = cells(band.average, meter_width);
            canvas.hline(LABEL_WIDTH, row, average, ':');
            canvas.hline(LABEL_WIDTH, row, cells(band.value, meter_width), '=');

            let peak = cells(band.peak, meter_width);
            if peak > 0 {
                canvas.plot(LABEL_WIDTH + peak - 1, row, '>');
            }
        }

        let status_row = BandName::ALL.len() + 1;
        let mut status = String::new();
        for (flag, label) in [
            (frame.beat.kick, "KICK"),
            (frame.beat.snare, "SNARE"),
            (frame.beat.hihat, "HIHAT"),
            (frame.onset.detected, "ONSET"),
        ] {
            if flag {
                status.push_str(label);
                status.push(' ');
            }
        }
        if status.is_empty() {
            status.push('.');
        }
        canvas.text(0, status_row, status.trim_end());
    }
}
