// src/app.rs - Live session: capture thread, pipeline task, dispatcher task
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::actions::{ActionDispatcher, KeyBindings, LogDispatcher};
use crate::classifier::HeuristicClassifier;
use crate::landmarks::LandmarkProvider;
use crate::data::SessionRecorder;
use crate::pipeline::{ConfirmedEvent, GesturePipeline};
use crate::settings::AppSettings;
use crate::simulation::SimulatedHandProvider;
use crate::video::{self, CaptureSource, CapturedFrame, NoHandDetector, SessionClock};

const FRAME_QUEUE: usize = 4;
const SETTINGS_POLL: Duration = Duration::from_secs(2);

pub struct GestureApp {
    settings_path: PathBuf,
    settings: AppSettings,
}

impl GestureApp {
    pub fn new(settings_path: PathBuf, settings: AppSettings) -> Self {
        Self {
            settings_path,
            settings,
        }
    }

    /// Runs until Ctrl-C, then exports the session if recording is on.
    pub async fn run(self) -> Result<()> {
        let clock = SessionClock::start();
        let stop = Arc::new(AtomicBool::new(false));

        let (frame_tx, frame_rx) = mpsc::channel::<CapturedFrame>(FRAME_QUEUE);
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ConfirmedEvent>();
        let (settings_tx, settings_rx) = watch::channel(self.settings.clone());

        let source = if self.settings.simulate_hands {
            CaptureSource::Synthetic
        } else {
            CaptureSource::Camera(self.settings.camera_index)
        };
        let capture = video::spawn_capture(source, clock, frame_tx, stop.clone())?;

        let recorder = self
            .settings
            .record_session
            .then(|| SessionRecorder::new(&self.settings.output_directory, None));
        let classifier = HeuristicClassifier::from_config(&self.settings.gestures);
        let processing = if self.settings.simulate_hands {
            info!("Simulating hands: gestures come from the scripted loop, not the camera");
            let pipeline = GesturePipeline::new(SimulatedHandProvider::new(), classifier);
            tokio::spawn(process_frames(pipeline, frame_rx, event_tx, settings_rx.clone(), recorder))
        } else {
            let pipeline = GesturePipeline::new(NoHandDetector::default(), classifier);
            tokio::spawn(process_frames(pipeline, frame_rx, event_tx, settings_rx.clone(), recorder))
        };
        let dispatching = tokio::spawn(dispatch_events(event_rx, settings_rx));

        info!("Gesture session running, press Ctrl-C to stop");
        let mut poll = tokio::time::interval(SETTINGS_POLL);
        let mut last_modified = modified_time(&self.settings_path);
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.context("Failed to listen for Ctrl-C")?;
                    break;
                }
                _ = poll.tick() => {
                    let modified = modified_time(&self.settings_path);
                    if modified != last_modified {
                        last_modified = modified;
                        match AppSettings::load(&self.settings_path) {
                            Ok(settings) => {
                                info!("Settings changed, applying on next tick");
                                let _ = settings_tx.send(settings);
                            }
                            Err(e) => warn!("Ignoring unreadable settings: {}", e),
                        }
                    }
                }
            }
        }

        info!("Stopping session");
        stop.store(true, Ordering::Relaxed);
        let join = tokio::task::spawn_blocking(move || capture.join());
        if !matches!(join.await, Ok(Ok(()))) {
            error!("Capture thread panicked");
        }

        let recorder = processing.await.context("Pipeline task failed")?;
        dispatching.await.context("Dispatcher task failed")?;

        if let Some(recorder) = recorder {
            let path = recorder
                .export_csv()
                .context("Failed to export session")?;
            info!("Session saved to {}", path.display());
        }
        Ok(())
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Sole owner of tracker state. Reads the latest settings snapshot per frame.
async fn process_frames<P>(
    mut pipeline: GesturePipeline<P, HeuristicClassifier>,
    mut frames: mpsc::Receiver<CapturedFrame>,
    events: mpsc::UnboundedSender<ConfirmedEvent>,
    settings: watch::Receiver<AppSettings>,
    mut recorder: Option<SessionRecorder>,
) -> Option<SessionRecorder>
where
    P: LandmarkProvider<Frame = CapturedFrame> + Send + 'static,
{
    while let Some(frame) = frames.recv().await {
        let current = settings.borrow().clone();
        pipeline.set_enabled(current.enabled);

        let Some(record) = pipeline.process(&frame, frame.timestamp, &current.gestures) else {
            continue;
        };
        for event in &record.events {
            if events.send(*event).is_err() {
                warn!("Dispatcher gone, dropping {}", event.as_str());
            }
        }
        if let Some(recorder) = recorder.as_mut() {
            recorder.add_tick(&record);
        }
    }

    let snapshot = pipeline.snapshot();
    info!(
        "Pipeline finished: {} ticks, {} snaps, {} middle finger holds",
        snapshot.processed_ticks, snapshot.snaps, snapshot.middle_finger_holds
    );
    recorder
}

async fn dispatch_events(
    mut events: mpsc::UnboundedReceiver<ConfirmedEvent>,
    settings: watch::Receiver<AppSettings>,
) {
    let mut dispatcher = LogDispatcher::new();
    while let Some(event) = events.recv().await {
        let bindings: KeyBindings = settings.borrow().bindings.clone();
        if let Err(e) = dispatcher.dispatch(event, bindings.combo_for(event)) {
            warn!("Failed to dispatch {}: {}", event.as_str(), e);
        }
    }
    info!("Dispatched {} actions", dispatcher.dispatched());
}
