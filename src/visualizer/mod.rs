pub mod band_meters;
pub mod beat_pulse;
pub mod canvas;
pub mod spectrum_bars;

use crate::analysis::AnalysisFrame;
use crate::error::RegistryError;

pub use band_meters::BandMeters;
pub use beat_pulse::BeatPulse;
pub use canvas::Canvas;
pub use spectrum_bars::SpectrumBars;

/// Trait that all visualizers must implement
pub trait Visualizer {
    /// Unique name used for selection
    fn name(&self) -> &'static str;

    /// Called whenever the drawing surface changes size
    fn init(&mut self, _width: usize, _height: usize) {}

    /// Draw the current analysis frame
    fn draw(&mut self, canvas: &mut Canvas, frame: &AnalysisFrame<'_>);
}

/// Ordered set of visualizers with one selected at a time.
pub struct VisualizerRegistry {
    visualizers: Vec<Box<dyn Visualizer>>,
    current: usize,
}

impl Default for VisualizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizerRegistry {
    pub fn new() -> Self {
        Self {
            visualizers: Vec::new(),
            current: 0,
        }
    }

    /// Registry holding every bundled visualizer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let bundled: Vec<Box<dyn Visualizer>> = vec![
            Box::new(SpectrumBars::new()),
            Box::new(BandMeters::new()),
            Box::new(BeatPulse::new()),
        ];
        for visualizer in bundled {
            if let Err(err) = registry.register(visualizer) {
                log::warn!("{}", err);
            }
        }
        registry
    }

    pub fn register(&mut self, visualizer: Box<dyn Visualizer>) -> Result<(), RegistryError> {
        let name = visualizer.name();
        if self.visualizers.iter().any(|v| v.name() == name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        log::debug!("Registered visualizer: {}", name);
        self.visualizers.push(visualizer);
        Ok(())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.visualizers.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.visualizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visualizers.is_empty()
    }

    pub fn init(&mut self, width: usize, height: usize) {
        for visualizer in &mut self.visualizers {
            visualizer.init(width, height);
        }
    }

    pub fn select(&mut self, name: &str) -> Result<(), RegistryError> {
        match self.visualizers.iter().position(|v| v.name() == name) {
            Some(idx) => {
                self.current = idx;
                Ok(())
            }
            None => Err(RegistryError::UnknownVisualizer {
                name: name.to_string(),
                available: self.names().into_iter().map(String::from).collect(),
            }),
        }
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.visualizers.get(self.current).map(|v| v.name())
    }

    /// Advance to the next visualizer, wrapping around.
    pub fn next_style(&mut self) -> Option<&'static str> {
        if self.visualizers.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.visualizers.len();
        self.current_name()
    }

    /// Clear `canvas` and draw the selected visualizer, or a placeholder when
    /// nothing is registered.
    pub fn draw(&mut self, canvas: &mut Canvas, frame: &AnalysisFrame<'_>) {
        canvas.clear();
        match self.visualizers.get_mut(self.current) {
            Some(visualizer) => visualizer.draw(canvas, frame),
            None => draw_fallback(canvas),
        }
    }
}

fn draw_fallback(canvas: &mut Canvas) {
    let y = canvas.height() / 2;
    canvas.text_centered(y, "No visualizers loaded");
}

/// Scale a 0.0-1.0 level to a cell count out of `max`.
pub(crate) fn cells(level: f32, max: usize) -> usize {
    ((level.clamp(0.0, 1.0) * max as f32).round() as usize).min(max)
}
