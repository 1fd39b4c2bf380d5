//! Blink monitor: blink-rate tracking with fatigue and stress advisories.

use anyhow::{Context, Result};
use blink_monitor::{
    app::{AppConfig, BlinkMonitorApp, ClockSource},
    config::{Config, EXAMPLE_CONFIG},
    replay::ReplayProvider,
};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Landmark recording to process (JSON Lines)
    #[arg(short, long, required_unless_present = "write_config")]
    landmarks: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Notification sink (log, notify-send, command:<program>)
    #[arg(short, long)]
    sink: Option<String>,

    /// Use recorded frame timestamps as session time instead of the wall clock
    #[arg(long)]
    frame_clock: bool,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Write the example configuration to this path and exit
    #[arg(long)]
    write_config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Blink Monitor");

    if let Some(path) = &args.write_config {
        std::fs::write(path, EXAMPLE_CONFIG).with_context(|| format!("Failed to write {path}"))?;
        info!("Example configuration written to: {}", path);
        return Ok(());
    }

    // Load configuration if provided
    let monitor = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    monitor.validate().context("Invalid configuration")?;

    let config = AppConfig {
        monitor,
        sink: args.sink,
        clock_source: if args.frame_clock {
            ClockSource::Frame
        } else {
            ClockSource::System
        },
        max_frames: args.max_frames,
    };

    let landmarks = args.landmarks.context("No landmark recording given")?;
    let provider = ReplayProvider::open(&landmarks).with_context(|| format!("Failed to open {landmarks}"))?;

    // Create and run application
    let app = BlinkMonitorApp::new(config, provider)?;
    let summary = app.run()?;
    info!(
        "Processed {} frames ({} with a face): {} blinks, {} BPM at exit",
        summary.frames, summary.face_frames, summary.total_blinks, summary.final_bpm
    );

    Ok(())
}
