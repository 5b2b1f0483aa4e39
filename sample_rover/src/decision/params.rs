//! # Decision Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the decision manager and each of its modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionParams {
    // ---- NAVIGABLE TERRAIN ----
    /// Below this many navigable points the rover stops driving forward.
    pub stop_forward: usize,

    /// A stopped rover sets off again once it sees at least this many navigable points.
    pub go_forward: usize,

    // ---- COMMAND LIMITS ----
    /// Speed above which the rover coasts rather than throttling.
    ///
    /// Units: meters/second
    pub max_vel: f64,

    /// Throttle used while driving forward.
    pub throttle_set: f64,

    /// Brake used whenever the rover brakes.
    pub brake_set: f64,

    /// Steering commands are clipped into `[-max_steer_deg, max_steer_deg]`.
    ///
    /// Units: degrees
    pub max_steer_deg: f64,

    // ---- MODES ----
    pub forward: ForwardParams,

    pub stop: StopParams,

    pub rock_picking: RockPickingParams,

    pub post_pickup: PostPickupParams,

    pub recovery: RecoveryParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardParams {
    /// Start approaching a sample once it is this close.
    ///
    /// Units: rover pixels
    pub sample_approach_dist: f64,

    /// A throttling rover at or below this speed is not making progress.
    ///
    /// Units: meters/second
    pub stuck_vel: f64,

    /// Number of ticks without progress after which the rover tries to recover.
    pub stuck_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopParams {
    /// Above this speed the rover keeps braking.
    ///
    /// Units: meters/second
    pub moving_vel: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RockPickingParams {
    /// Brake once the sample is closer than this.
    ///
    /// Units: rover pixels
    pub pickup_dist: f64,

    /// Pickup is only requested at or below this speed.
    ///
    /// Units: meters/second
    pub stationary_vel: f64,

    /// Number of ticks after which the approach is abandoned.
    pub timeout: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostPickupParams {
    /// Number of ticks to wait for the pickup to finish.
    pub timeout: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryParams {
    /// Throttle used to back away.
    pub reverse_throttle: f64,

    /// Recovery completes once it has run for more than this many ticks.
    pub duration: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            stop_forward: 50,
            go_forward: 500,
            max_vel: 2.0,
            throttle_set: 0.2,
            brake_set: 10.0,
            max_steer_deg: 15.0,
            forward: ForwardParams {
                sample_approach_dist: 30.0,
                stuck_vel: 0.01,
                stuck_limit: 10,
            },
            stop: StopParams { moving_vel: 0.2 },
            rock_picking: RockPickingParams {
                pickup_dist: 18.0,
                stationary_vel: 0.01,
                timeout: 100,
            },
            post_pickup: PostPickupParams { timeout: 1000 },
            recovery: RecoveryParams {
                reverse_throttle: -0.2,
                duration: 20,
            },
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
