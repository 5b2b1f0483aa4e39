//! # Vehicle State
//!
//! [`VehicleState`] is the single record describing the rover during a run. It is created once at
//! start up, then every tick perception and decision each take it by exclusive reference and
//! update their part of it in place.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::{
    decision::{Command, CtrlState},
    per::{NavSummary, WorldMap},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The pose estimate supplied with each frame.
///
/// Angles are in degrees in the range [0, 360), as reported by the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in the world frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading, anticlockwise from the world X axis.
    ///
    /// Units: degrees
    pub yaw_deg: f64,

    /// Units: degrees
    pub pitch_deg: f64,

    /// Units: degrees
    pub roll_deg: f64,

    /// Forward speed of the vehicle.
    ///
    /// Units: meters/second
    pub velocity_ms: f64,
}

/// Complete state of the vehicle.
pub struct VehicleState {
    // ---- INPUTS ----
    /// The latest pose estimate
    pub pose: Pose,

    /// The latest raw camera frame
    pub frame: RgbImage,

    /// Set by the pickup mechanism when a sample is within reach
    pub near_sample: bool,

    /// Set by the pickup mechanism while a pickup is in progress
    pub picking_up: bool,

    // ---- PERCEPTION ----
    /// Classification of the rectified frame, red = obstacle, green = sample, blue = navigable.
    ///
    /// Recomputed every tick.
    pub vision_image: RgbImage,

    /// Persistent world map, accumulated over the whole run.
    pub world_map: WorldMap,

    /// Navigation summary of the current frame, `None` until perception has run once.
    pub nav: Option<NavSummary>,

    /// Mean distance to the visible sample in rover pixels, `None` if no sample is visible.
    pub sample_dist: Option<f64>,

    // ---- DECISION ----
    /// Controller mode and timers
    pub ctrl: CtrlState,

    /// Latest actuator command
    pub cmd: Command,

    /// Raised by decision to request a pickup. The pickup mechanism clears it once consumed.
    pub send_pickup: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehicleState {
    /// Create a new state for frames of the given size and an empty world map.
    pub fn new(frame_width: u32, frame_height: u32, world_size: usize) -> Self {
        Self {
            pose: Pose::default(),
            frame: RgbImage::new(frame_width, frame_height),
            near_sample: false,
            picking_up: false,
            vision_image: RgbImage::new(frame_width, frame_height),
            world_map: WorldMap::new(world_size),
            nav: None,
            sample_dist: None,
            ctrl: CtrlState::default(),
            cmd: Command::default(),
            send_pickup: false,
        }
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}
