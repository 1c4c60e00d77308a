pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod report;
pub mod visualizer;

pub use analysis::{AnalysisFrame, AnalyzerConfig, AudioAnalyzer};
pub use audio::{AnalyserSettings, FileSignalSource, SignalSource};
pub use visualizer::{Canvas, Visualizer, VisualizerRegistry};
