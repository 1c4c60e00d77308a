use super::{cells, Canvas, Visualizer};
use crate::analysis::AnalysisFrame;

/// Classic bar spectrum over the raw snapshot, with falling peak caps.
pub struct SpectrumBars {
    caps: Vec<f32>,
    /// Cap fall per frame, in levels (0.0-1.0)
    fall: f32,
}

impl SpectrumBars {
    pub fn new() -> Self {
        Self {
            caps: Vec::new(),
            fall: 0.02,
        }
    }
}

impl Default for SpectrumBars {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for SpectrumBars {
    fn name(&self) -> &'static str {
        "spectrum-bars"
    }

    fn init(&mut self, width: usize, _height: usize) {
        self.caps = vec![0.0; width];
    }

    fn draw(&mut self, canvas: &mut Canvas, frame: &AnalysisFrame<'_>) {
        let width = canvas.width();
        let height = canvas.height();
        if width == 0 || height == 0 || frame.raw.is_empty() {
            return;
        }
        if self.caps.len() != width {
            self.caps = vec![0.0; width];
        }

        // Upper bins are mostly empty; only show the lower half.
        let visible = (frame.raw.len() / 2).max(1);
        let per_column = (visible / width).max(1);

        for x in 0..width {
            let start = (x * per_column).min(visible - 1);
            let end = (start + per_column).min(visible);
            let bins = &frame.raw[start..end];
            let level = bins.iter().map(|&v| v as f32).sum::<f32>() / bins.len() as f32 / 255.0;

            canvas.column_from_bottom(x, cells(level, height), '|');

            self.caps[x] = (self.caps[x] - self.fall).max(level);
            let cap = cells(self.caps[x], height);
            if cap > 0 {
                canvas.plot(x, height - cap, '-');
            }
        }
    }
}
