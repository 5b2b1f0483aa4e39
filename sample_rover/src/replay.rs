//! # Telemetry replay
//!
//! Reads a recorded drive log and yields one tick of input per row. The log is the `;` delimited
//! CSV written by the simulator's recording mode, with columns
//!
//! ```text
//! Path;SteerAngle;Throttle;Brake;Speed;X_Position;Y_Position;Pitch;Yaw;Roll
//! ```
//!
//! and optionally `NearSample;PickingUp` as 0 or 1. Image paths are relative to the log file.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use csv::ReaderBuilder;
use image::RgbImage;
use log::info;
use nalgebra::Vector2;
use serde::Deserialize;
use thiserror::Error;

use crate::vehicle_state::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single row of the drive log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TelemetryRecord {
    #[serde(rename = "Path")]
    pub path: PathBuf,

    /// Recorded steering, kept for comparison only
    #[serde(rename = "SteerAngle")]
    pub steer_deg: f64,

    /// Recorded throttle, kept for comparison only
    #[serde(rename = "Throttle")]
    pub throttle: f64,

    /// Recorded brake, kept for comparison only
    #[serde(rename = "Brake")]
    pub brake: f64,

    #[serde(rename = "Speed")]
    pub speed_ms: f64,

    #[serde(rename = "X_Position")]
    pub x_m: f64,

    #[serde(rename = "Y_Position")]
    pub y_m: f64,

    #[serde(rename = "Pitch")]
    pub pitch_deg: f64,

    #[serde(rename = "Yaw")]
    pub yaw_deg: f64,

    #[serde(rename = "Roll")]
    pub roll_deg: f64,

    #[serde(rename = "NearSample", default)]
    pub near_sample: u8,

    #[serde(rename = "PickingUp", default)]
    pub picking_up: u8,
}

/// A loaded drive log.
///
/// Iterating the log loads the image of each row in turn.
pub struct TelemetryLog {
    base_dir: PathBuf,
    records: VecDeque<TelemetryRecord>,
}

/// One row of the log with its frame loaded.
#[derive(Debug, Clone)]
pub struct ReplayTick {
    pub record: TelemetryRecord,
    pub frame: RgbImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Could not find the log at {0:?}")]
    LogNotFound(PathBuf),

    #[error("Could not read the log: {0}")]
    LogReadError(csv::Error),

    #[error("The log contains no rows")]
    LogEmpty,

    #[error("Could not load the frame {0:?}: {1}")]
    FrameLoadError(PathBuf, image::ImageError),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl TelemetryLog {
    /// Load the log at the given path.
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self, ReplayError> {
        let log_path = log_path.as_ref();

        if !log_path.exists() {
            return Err(ReplayError::LogNotFound(log_path.to_path_buf()));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_path(log_path)
            .map_err(ReplayError::LogReadError)?;

        let records = reader
            .deserialize()
            .collect::<Result<VecDeque<TelemetryRecord>, _>>()
            .map_err(ReplayError::LogReadError)?;

        if records.is_empty() {
            return Err(ReplayError::LogEmpty);
        }

        info!("Loaded {} rows from {:?}", records.len(), log_path);

        Ok(Self {
            base_dir: log_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            records,
        })
    }

    /// Number of rows not yet replayed.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl Iterator for TelemetryLog {
    type Item = Result<ReplayTick, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.pop_front()?;

        // Absolute paths are kept as they are by `join`
        let frame_path = self.base_dir.join(&record.path);

        Some(
            image::open(&frame_path)
                .map(|img| ReplayTick {
                    frame: img.to_rgb8(),
                    record,
                })
                .map_err(|e| ReplayError::FrameLoadError(frame_path, e)),
        )
    }
}

impl TelemetryRecord {
    /// The recorded pose.
    pub fn pose(&self) -> Pose {
        Pose {
            position_m: Vector2::new(self.x_m, self.y_m),
            yaw_deg: self.yaw_deg,
            pitch_deg: self.pitch_deg,
            roll_deg: self.roll_deg,
            velocity_ms: self.speed_ms,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
