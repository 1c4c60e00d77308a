use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rave-analyzer", about = "Frame-by-frame spectrum analysis for audio-reactive visuals")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output JSON-lines report
    #[arg(short, long, default_value = "analysis.jsonl")]
    pub output: PathBuf,

    /// Config file (defaults to rave-analyzer.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Analysis frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Analyser FFT size (power of two, 32-32768)
    #[arg(long, default_value_t = 2048)]
    pub fft_size: usize,

    /// Analyser time smoothing (0.0-1.0)
    #[arg(long, default_value_t = 0.8)]
    pub smoothing: f32,

    /// Level mapped to byte 0
    #[arg(long, default_value_t = -90.0, allow_negative_numbers = true)]
    pub min_decibels: f32,

    /// Level mapped to byte 255
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    pub max_decibels: f32,

    /// Visualizer used for previews
    #[arg(short, long, default_value = "spectrum-bars")]
    pub visualizer: String,

    /// Print a visualizer preview every N frames (0 disables)
    #[arg(long, default_value_t = 0)]
    pub preview_every: usize,

    /// Include the raw byte spectrum in every report line
    #[arg(long)]
    pub include_raw: bool,

    /// List available visualizers and exit
    #[arg(long)]
    pub list_visualizers: bool,
}
