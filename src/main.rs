// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use snap_hotkey::app::GestureApp;
use snap_hotkey::settings::AppSettings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Webcam snap and middle finger gestures as keyboard shortcuts", long_about = None)]
struct Args {
    /// Settings file (default: the platform config dir)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Drive the session from the scripted hand loop instead of the camera
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    if let Ok(p) = std::env::current_exe() {
        tracing::debug!("Running from: {}", p.display());
    }

    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(cameras) => {
            tracing::info!("Found {} camera(s)", cameras.len());
            for (i, camera) in cameras.iter().enumerate() {
                tracing::info!("  [{}] {}", i, camera.human_name());
            }
        }
        Err(e) => tracing::warn!("Failed to query cameras: {}", e),
    }

    let settings_path = match args.settings {
        Some(path) => path,
        None => AppSettings::default_path()?,
    };
    let mut settings = AppSettings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    if !settings_path.exists() {
        settings
            .save(&settings_path)
            .with_context(|| format!("Failed to write default settings to {}", settings_path.display()))?;
        tracing::info!("Wrote default settings to {}", settings_path.display());
    }
    if args.simulate {
        settings.simulate_hands = true;
    }

    GestureApp::new(settings_path, settings).run().await
}
