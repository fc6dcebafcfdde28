// Replays a recorded session CSV against the current gesture settings.
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use snap_hotkey::data::read_session;
use snap_hotkey::replay::replay_session;
use snap_hotkey::settings::AppSettings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Re-run a recorded session under different thresholds", long_about = None)]
struct Args {
    /// ticks.csv written by a recorded session
    session: PathBuf,

    /// Settings file to replay with (default: the platform config dir)
    #[arg(short, long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    let settings_path = match args.settings {
        Some(path) => path,
        None => AppSettings::default_path()?,
    };

    let settings = AppSettings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    for warning in settings.validate() {
        println!("warning: {}", warning);
    }

    let rows = read_session(&args.session)
        .with_context(|| format!("Failed to read session {}", args.session.display()))?;
    let events = replay_session(&rows, &settings.gestures);

    println!("{} ticks, {} events", rows.len(), events.len());
    for replayed in &events {
        println!(
            "{:>9.3}s  {:<20} {}",
            replayed.timestamp,
            replayed.event.as_str(),
            settings.bindings.combo_for(replayed.event)
        );
    }
    Ok(())
}
