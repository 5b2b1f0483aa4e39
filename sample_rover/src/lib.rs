//! # Rover library.
//!
//! This library holds the perception and decision core of the sample return rover, allowing the
//! executable, benchmarks, and other tools in the workspace to drive the same control loop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Vehicle state - the single record mutated by every stage of a tick
pub mod vehicle_state;

/// Perception module - converts camera frames into the world map and a navigation summary
pub mod per;

/// Decision module - mode state machine producing throttle, brake, and steer commands
pub mod decision;

/// Rover control module - runs perception then decision once per tick
pub mod rov_ctrl;

/// Telemetry replay - feeds recorded drive logs into the control loop
pub mod replay;

/// Emulated pickup mechanism for replays
pub mod pickup;

/// Executable parameters
pub mod params;
