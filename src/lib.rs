//! Webcam hand-gesture shortcuts.
//!
//! Each processed frame runs through [`pipeline::GesturePipeline`]: a hand
//! pose from a [`landmarks::LandmarkProvider`], a label from a
//! [`classifier::GestureClassifier`], then two independent confirmers. The
//! [`signal::SignalTracker`] watches thumb-to-middle distance for a snap and
//! the [`hold::HoldConfirmer`] waits out a held middle finger. Confirmed
//! events go to an [`actions::ActionDispatcher`].

pub mod actions;
pub mod app;
pub mod classifier;
pub mod config;
pub mod cooldown;
pub mod data;
pub mod hold;
pub mod landmarks;
pub mod pipeline;
pub mod replay;
pub mod settings;
pub mod signal;
pub mod simulation;
pub mod video;
