use super::{Canvas, Visualizer};
use crate::analysis::AnalysisFrame;

/// Ring that swells with energy and jumps on beats, then relaxes.
pub struct BeatPulse {
    pulse: f32,
    decay: f32,
    aspect: f32,
}

impl BeatPulse {
    pub fn new() -> Self {
        Self {
            pulse: 0.0,
            decay: 0.85,
            // terminal cells are about twice as tall as wide
            aspect: 2.0,
        }
    }
}

impl Default for BeatPulse {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for BeatPulse {
    fn name(&self) -> &'static str {
        "beat-pulse"
    }

    fn init(&mut self, _width: usize, _height: usize) {
        self.pulse = 0.0;
    }

    fn draw(&mut self, canvas: &mut Canvas, frame: &AnalysisFrame<'_>) {
        let (width, height) = (canvas.width(), canvas.height());
        if width == 0 || height == 0 {
            return;
        }

        if frame.beat.detected {
            self.pulse = self.pulse.max(frame.beat.confidence);
        } else {
            self.pulse *= self.decay;
        }

        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let max_radius = cy.min(cx / self.aspect).max(1.0);
        let radius = max_radius * (0.2 + 0.5 * frame.metrics.energy + 0.3 * self.pulse).min(1.0);
        let glyph = if frame.beat.kick { '#' } else { '*' };

        let steps = ((radius * 8.0) as usize).max(16);
        for i in 0..steps {
            let angle = i as f32 / steps as f32 * std::f32::consts::TAU;
            let x = cx + angle.cos() * radius * self.aspect;
            let y = cy + angle.sin() * radius;
            if x >= 0.0 && y >= 0.0 {
                canvas.plot(x as usize, y as usize, glyph);
            }
        }

        if frame.beat.bpm > 0.0 {
            canvas.text_centered(height / 2, &format!("{:.0} BPM", frame.beat.bpm));
        }
    }
}
