use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::AnalyzerConfig;
use crate::audio::AnalyserSettings;

pub const CONFIG_FILE_NAME: &str = "rave-analyzer.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyser: AnalyserSettings,
    #[serde(default)]
    pub analysis: AnalyzerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_visualizer")]
    pub visualizer: String,
    #[serde(default = "default_preview_width")]
    pub preview_width: usize,
    #[serde(default = "default_preview_height")]
    pub preview_height: usize,
    #[serde(default)]
    pub include_raw: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            visualizer: default_visualizer(),
            preview_width: default_preview_width(),
            preview_height: default_preview_height(),
            include_raw: false,
        }
    }
}

fn default_fps() -> u32 { 60 }
fn default_visualizer() -> String { "spectrum-bars".into() }
fn default_preview_width() -> usize { 64 }
fn default_preview_height() -> usize { 16 }

pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

/// First existing config file: `./rave-analyzer.toml`, then
/// `~/.config/rave-analyzer/config.toml`, then the platform config dir.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("rave-analyzer").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("rave-analyzer").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("", Path::new("empty.toml")).unwrap();
        assert_eq!(config.analyser, AnalyserSettings::default());
        assert_eq!(config.analysis, AnalyzerConfig::default());
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [analyser]
            fft_size = 4096

            [analysis]
            onset_threshold = 2.0

            [output]
            visualizer = "beat-pulse"
            "#,
            Path::new("partial.toml"),
        )
        .unwrap();
        assert_eq!(config.analyser.fft_size, 4096);
        assert_eq!(config.analyser.smoothing, 0.8);
        assert_eq!(config.analysis.onset_threshold, 2.0);
        assert_eq!(config.analysis.history_capacity, 100);
        assert_eq!(config.output.visualizer, "beat-pulse");
        assert_eq!(config.output.fps, 60);
    }

    #[test]
    fn reports_parse_errors() {
        let err = parse_config("[analyser]\nfft_size = \"big\"", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn reports_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
