// src/data.rs - Per-tick session recording and CSV export
use chrono::Local;
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pipeline::{ConfirmedEvent, TickRecord};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One processed tick, flattened for CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRow {
    pub timestamp: f64,
    pub state: String,
    pub label: Option<String>,
    pub raw_label: Option<String>,
    pub confidence: Option<f64>,
    pub distance: Option<f64>,

    pub thumb_x: Option<f64>,
    pub thumb_y: Option<f64>,
    pub thumb_confidence: Option<f32>,

    pub middle_x: Option<f64>,
    pub middle_y: Option<f64>,
    pub middle_confidence: Option<f32>,

    pub wrist_x: Option<f64>,
    pub wrist_y: Option<f64>,
    pub wrist_confidence: Option<f32>,

    /// Fired events joined with '|', empty when none fired.
    pub events: String,
}

impl TickRow {
    pub fn from_record(record: &TickRecord) -> Self {
        let mut row = TickRow {
            timestamp: record.timestamp,
            state: record.state.as_str().to_string(),
            label: None,
            raw_label: None,
            confidence: None,
            distance: record.distance,
            thumb_x: None,
            thumb_y: None,
            thumb_confidence: None,
            middle_x: None,
            middle_y: None,
            middle_confidence: None,
            wrist_x: None,
            wrist_y: None,
            wrist_confidence: None,
            events: record
                .events
                .iter()
                .map(|e| e.as_str())
                .collect::<Vec<_>>()
                .join("|"),
        };

        if let Some(classification) = &record.classification {
            row.label = Some(classification.label.as_str().to_string());
            row.raw_label = Some(classification.raw_label.as_str().to_string());
            row.confidence = Some(classification.confidence);
        }

        if let Some(hand) = &record.landmarks {
            row.thumb_x = Some(hand.thumb_tip.position.x);
            row.thumb_y = Some(hand.thumb_tip.position.y);
            row.thumb_confidence = Some(hand.thumb_tip.confidence);
            row.middle_x = Some(hand.middle_tip.position.x);
            row.middle_y = Some(hand.middle_tip.position.y);
            row.middle_confidence = Some(hand.middle_tip.confidence);
            row.wrist_x = Some(hand.wrist.position.x);
            row.wrist_y = Some(hand.wrist.position.y);
            row.wrist_confidence = Some(hand.wrist.confidence);
        }

        row
    }

    pub fn events(&self) -> Vec<ConfirmedEvent> {
        self.events
            .split('|')
            .filter_map(ConfirmedEvent::from_str_opt)
            .collect()
    }
}

pub struct SessionRecorder {
    output_dir: PathBuf,
    session_name: String,
    rows: Vec<TickRow>,
}

impl SessionRecorder {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            let id = uuid::Uuid::new_v4().simple().to_string();
            format!("session_{}_{}", Local::now().format("%Y%m%d_%H%M%S"), &id[..8])
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            rows: Vec::new(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn add_tick(&mut self, record: &TickRecord) {
        self.rows.push(TickRow::from_record(record));
    }

    pub fn rows(&self) -> &[TickRow] {
        &self.rows
    }

    pub fn export_csv(&self) -> Result<PathBuf, SessionError> {
        let csv_path = self
            .output_dir
            .join(&self.session_name)
            .join("ticks.csv");

        if let Some(parent) = csv_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(csv_path)
    }
}

/// Loads a session exported by `SessionRecorder::export_csv`.
pub fn read_session(path: impl AsRef<Path>) -> Result<Vec<TickRow>, SessionError> {
    let mut reader = Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
