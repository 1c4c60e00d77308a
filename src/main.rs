mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;

use cli::Cli;
use rave_analyzer::audio::{self, FileSignalSource, SignalSource};
use rave_analyzer::config::{self, Config};
use rave_analyzer::report::ReportWriter;
use rave_analyzer::{AudioAnalyzer, Canvas, VisualizerRegistry};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Explicit --config path, or auto-detect rave-analyzer.toml / user config
    let config_path = cli.config.clone().or_else(config::discover_config);
    let mut cfg = Config::default();
    if let Some(ref path) = config_path {
        match config::load_config(path) {
            Ok(loaded) => {
                log::info!("Loaded config from {}", path.display());
                cfg = loaded;
                // Config values apply only when the CLI flag is at its default
                if cli.fps == 60 { cli.fps = cfg.output.fps; }
                if cli.fft_size == 2048 { cli.fft_size = cfg.analyser.fft_size; }
                if cli.smoothing == 0.8 { cli.smoothing = cfg.analyser.smoothing; }
                if cli.min_decibels == -90.0 { cli.min_decibels = cfg.analyser.min_decibels; }
                if cli.max_decibels == -10.0 { cli.max_decibels = cfg.analyser.max_decibels; }
                if cli.visualizer == "spectrum-bars" { cli.visualizer = cfg.output.visualizer.clone(); }
                if !cli.include_raw { cli.include_raw = cfg.output.include_raw; }
            }
            Err(err) => log::warn!("{}", err),
        }
    }

    let mut registry = VisualizerRegistry::with_defaults();

    if cli.list_visualizers {
        println!("Available visualizers:");
        for name in registry.names() {
            println!("  {}", name);
        }
        return Ok(());
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("rave-analyzer - spectrum analysis for audio-reactive visuals");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "Analyser: fft_size={}, smoothing={:.2}, {}..{} dB @ {}fps",
        cli.fft_size, cli.smoothing, cli.min_decibels, cli.max_decibels, cli.fps
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio_data = audio::decode_audio(input)?;

    // 2. Byte spectrum source
    let mut settings = cfg.analyser.clone();
    settings.fft_size = cli.fft_size;
    settings.smoothing = cli.smoothing;
    settings.min_decibels = cli.min_decibels;
    settings.max_decibels = cli.max_decibels;
    let mut source = FileSignalSource::new(&audio_data, settings, cli.fps)
        .context("Invalid analyser settings")?;

    // 3. Analyzer
    let mut analysis_config = cfg.analysis.clone();
    analysis_config.frame_rate = cli.fps as f32;
    let mut analyzer = AudioAnalyzer::new(analysis_config, source.bin_count())
        .context("Invalid analyzer settings")?;

    // 4. Preview visualizer
    let mut canvas = Canvas::new(cfg.output.preview_width, cfg.output.preview_height);
    if cli.preview_every > 0 {
        registry.select(&cli.visualizer)?;
        registry.init(canvas.width(), canvas.height());
        log::info!("Preview: {} every {} frames", cli.visualizer, cli.preview_every);
    }

    // 5. Report
    let file = File::create(&cli.output)
        .with_context(|| format!("Failed to create report: {}", cli.output.display()))?;
    let mut report = ReportWriter::new(BufWriter::new(file), cli.fps, cli.include_raw);

    // 6. Analysis loop
    let total_frames = source.total_frames();
    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let mut frame_idx = 0;
    while analyzer.analyze(&mut source)? {
        let frame = analyzer.data();
        report
            .write_frame(frame_idx, frame)
            .with_context(|| format!("Failed to write frame {}", frame_idx))?;

        if cli.preview_every > 0 && frame_idx % cli.preview_every == 0 {
            registry.draw(&mut canvas, &frame);
            let rendered = canvas.render();
            pb.suspend(|| {
                println!("frame {} ({:.2}s)", frame_idx, frame_idx as f32 / cli.fps as f32);
                print!("{}", rendered);
            });
        }

        frame_idx += 1;
        pb.set_position(frame_idx as u64);
    }

    pb.finish_with_message("Analysis complete");

    // 7. Summary
    let (_, summary) = report.finish().context("Failed to flush report")?;
    log::info!(
        "Frames: {}, beats: {}, onsets: {}, kicks: {}, snares: {}, hihats: {}",
        summary.frames, summary.beats, summary.onsets, summary.kicks, summary.snares, summary.hihats
    );
    log::info!(
        "Mean energy: {:.3}, mean centroid: {:.3}, tempo: {:.1} BPM",
        summary.mean_energy, summary.mean_spectral_centroid, summary.bpm
    );
    log::info!("Done! Report: {}", cli.output.display());
    Ok(())
}
