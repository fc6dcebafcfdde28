// src/video.rs - Camera capture on a dedicated thread, frames stamped on the session clock
use anyhow::{Context, Result};
use image::DynamicImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::landmarks::{HandPose, LandmarkProvider};

const SYNTHETIC_FPS: u32 = 30;

/// Monotonic clock shared by capture and processing.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Seconds since the session started.
    pub fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// `None` when frames come from the synthetic clock instead of a camera.
    pub image: Option<DynamicImage>,
    pub timestamp: f64,
}

impl CapturedFrame {
    pub fn synthetic(timestamp: f64) -> Self {
        Self {
            image: None,
            timestamp,
        }
    }
}

pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn open(index: u32) -> Result<Self> {
        debug!("Opening camera index {}", index);

        let format = CameraFormat::new(Resolution::new(640, 480), FrameFormat::MJPEG, 30);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Exact(format));

        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| anyhow::anyhow!("Failed to open camera {}: {}", index, e))?;
        camera
            .open_stream()
            .map_err(|e| anyhow::anyhow!("Failed to open camera stream: {}", e))?;

        info!(
            "Camera {} streaming at {} fps",
            index,
            camera.frame_rate()
        );
        Ok(Self { camera })
    }

    /// Grabs one frame, mirrored so the preview matches the user's hand.
    pub fn read_frame(&mut self) -> Result<DynamicImage> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| anyhow::anyhow!("Failed to capture frame: {}", e))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| anyhow::anyhow!("Failed to decode frame: {}", e))?;
        let flipped = image::imageops::flip_horizontal(&decoded);
        Ok(DynamicImage::ImageRgb8(flipped))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}

/// Where capture frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Camera(u32),
    /// Image-less frames on a fixed clock, for the scripted hand loop.
    Synthetic,
}

/// Runs capture on its own OS thread until `stop` is raised or the receiver
/// goes away. Frames that arrive while the pipeline is still busy are dropped.
/// A camera that fails to open ends the thread; nothing is faked in its place.
pub fn spawn_capture(
    source: CaptureSource,
    clock: SessionClock,
    frames: mpsc::Sender<CapturedFrame>,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("camera-capture".to_string())
        .spawn(move || {
            match source {
                // nokhwa cameras are not Send, so the camera lives on this thread.
                CaptureSource::Camera(index) => match CameraSource::open(index) {
                    Ok(mut camera) => {
                        while !stop.load(Ordering::Relaxed) {
                            match camera.read_frame() {
                                Ok(image) => {
                                    let frame = CapturedFrame {
                                        image: Some(image),
                                        timestamp: clock.now(),
                                    };
                                    if !deliver(&frames, frame) {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    warn!("Camera error: {}", e);
                                    std::thread::sleep(Duration::from_millis(100));
                                }
                            }
                        }
                    }
                    Err(e) => error!("{}", e),
                },
                CaptureSource::Synthetic => {
                    let period = Duration::from_secs_f64(1.0 / SYNTHETIC_FPS as f64);
                    while !stop.load(Ordering::Relaxed) {
                        if !deliver(&frames, CapturedFrame::synthetic(clock.now())) {
                            break;
                        }
                        std::thread::sleep(period);
                    }
                }
            }
            info!("Capture thread stopped");
        })
        .context("Failed to spawn capture thread")
}

/// Stands in for a camera hand detector this build does not have. Every
/// frame reports no hands, so nothing is ever confirmed from real video.
#[derive(Debug, Default)]
pub struct NoHandDetector {
    warned: bool,
}

impl LandmarkProvider for NoHandDetector {
    type Frame = CapturedFrame;

    fn detect(&mut self, frame: &CapturedFrame) -> Vec<HandPose> {
        if !self.warned && frame.image.is_some() {
            warn!("No hand detector in this build, camera frames cannot trigger gestures");
            self.warned = true;
        }
        Vec::new()
    }
}

/// Returns false once the receiving side has shut down.
fn deliver(frames: &mpsc::Sender<CapturedFrame>, frame: CapturedFrame) -> bool {
    match frames.try_send(frame) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!("pipeline busy, dropping frame");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}
