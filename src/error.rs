use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnalyzerError {
    #[error("bin count {bins} is too small for the band table (needs at least {required})")]
    BinCountTooSmall { bins: usize, required: usize },

    #[error("snapshot has {actual} bins, analyzer expects {expected}")]
    SnapshotLength { expected: usize, actual: usize },

    #[error("unknown band '{0}'")]
    UnknownBand(String),

    #[error("band decay {0} must be within 0.0..=1.0")]
    InvalidBandDecay(f32),

    #[error("{name} window must be at least one frame")]
    EmptyWindow { name: &'static str },

    #[error("history capacity {capacity} cannot hold the {required}-frame onset window")]
    HistoryTooShort { capacity: usize, required: usize },

    #[error("frame rate {0} must be positive")]
    InvalidFrameRate(f32),
}

#[derive(Debug, Error, PartialEq)]
pub enum SourceError {
    #[error("fft size {0} must be a power of two between 32 and 32768")]
    InvalidFftSize(usize),

    #[error("smoothing {0} must be within 0.0..=1.0")]
    InvalidSmoothing(f32),

    #[error("min decibels ({min}) must be finite and lower than max decibels ({max})")]
    InvalidDecibelRange { min: f32, max: f32 },

    #[error("frame rate must be positive")]
    InvalidFrameRate,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("visualizer '{name}' not found. Available visualizers: {available:?}")]
    UnknownVisualizer { name: String, available: Vec<String> },

    #[error("visualizer '{0}' is already registered")]
    DuplicateName(String),
}
