//! # Decision telemetry
//!
//! One [`DecisionTm`] record is archived per tick.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Mode;
use crate::vehicle_state::VehicleState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTm {
    pub tick: u64,

    pub mode: Mode,

    pub throttle: f64,
    pub brake: f64,
    pub steer_deg: f64,

    pub velocity_ms: f64,

    /// Number of navigable points, empty before the first summary
    pub nav_count: Option<usize>,

    pub sample_dist: Option<f64>,

    pub stuck_epoch: u32,
    pub rock_picking_epoch: u32,
    pub recovery_epoch: u32,

    pub send_pickup: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DecisionTm {
    /// Snapshot the decision side of the vehicle state.
    pub fn from_state(tick: u64, vs: &VehicleState) -> Self {
        Self {
            tick,
            mode: vs.ctrl.mode,
            throttle: vs.cmd.throttle,
            brake: vs.cmd.brake,
            steer_deg: vs.cmd.steer_deg,
            velocity_ms: vs.pose.velocity_ms,
            nav_count: vs.nav.as_ref().map(|n| n.count()),
            sample_dist: vs.sample_dist,
            stuck_epoch: vs.ctrl.stuck_epoch,
            rock_picking_epoch: vs.ctrl.rock_picking_epoch,
            recovery_epoch: vs.ctrl.recovery_epoch,
            send_pickup: vs.send_pickup,
        }
    }
}
