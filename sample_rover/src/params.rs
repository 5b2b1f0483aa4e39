//! # Rover Executable Parameters
//!
//! This module provides parameters for the rover executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RovExecParams {
    /// Path to the perception parameters, relative to the params directory
    pub per_mgr_params: String,

    /// Path to the decision parameters, relative to the params directory
    pub decision_params: String,

    /// Number of ticks between world map snapshots. Zero disables periodic snapshots, the final
    /// map is always saved.
    pub map_snapshot_period_ticks: u64,

    /// Number of ticks between world map coverage reports in the log.
    pub coverage_log_period_ticks: u64,

    /// Number of ticks the emulated pickup mechanism stays busy after a pickup request, when the
    /// log does not record the pickup state itself.
    pub pickup_duration_ticks: u64,
}

impl Default for RovExecParams {
    fn default() -> Self {
        Self {
            per_mgr_params: String::from("per_mgr.toml"),
            decision_params: String::from("decision.toml"),
            map_snapshot_period_ticks: 500,
            coverage_log_period_ticks: 50,
            pickup_duration_ticks: 30,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
