//! # Decision module
//!
//! This module implements the [`DecisionMgr`] state machine, which turns the navigation summary
//! from perception into throttle, brake and steer commands. The state machine is broken down into
//! a number of modes:
//!
//! - `Forward` - Drive along the mean navigable heading, watching for samples and getting stuck.
//! - `Stop` - Brake to a halt, then turn on the spot until enough navigable terrain is visible.
//! - `RockPicking` - Approach a visible sample and request a pickup once alongside it.
//! - `PostPickup` - Wait for the pickup mechanism to finish.
//! - `Recovery` - Reverse away from whatever the rover is stuck on.
//!
//! Each mode is a transition function taking the controller state and the previous command and
//! returning the next ones. Command fields a mode does not set keep their previous values.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod forward;
mod params;
mod post_pickup;
mod recovery;
mod rock_picking;
mod stop;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use log::{info, trace};
use serde::{Deserialize, Serialize};

pub use self::{
    params::{
        DecisionParams, ForwardParams, PostPickupParams, RecoveryParams, RockPickingParams,
        StopParams,
    },
    tm::DecisionTm,
};
use crate::{per::NavSummary, vehicle_state::VehicleState};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Decision Manager
#[derive(Debug, Clone, Default)]
pub struct DecisionMgr {
    pub params: DecisionParams,
}

/// Actuator command produced by the decision module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Throttle demand, negative to reverse
    pub throttle: f64,

    pub brake: f64,

    /// Steering angle, positive to the left.
    ///
    /// Units: degrees
    pub steer_deg: f64,
}

/// Mode of the controller and the tick counters it keeps across ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CtrlState {
    pub mode: Mode,

    /// Consecutive forward ticks spent throttling without moving
    pub stuck_epoch: u32,

    /// Ticks spent approaching or picking up a sample
    pub rock_picking_epoch: u32,

    /// Ticks spent recovering
    pub recovery_epoch: u32,
}

/// Everything a mode reads from the vehicle state.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub nav: &'a NavSummary,

    /// Units: meters/second
    pub velocity_ms: f64,

    /// Mean distance to the visible sample, if any
    pub sample_dist: Option<f64>,

    pub near_sample: bool,

    pub picking_up: bool,
}

/// Output of a mode's step function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    /// Controller state after the tick, including the next mode
    pub ctrl: CtrlState,

    /// Command after the tick
    pub cmd: Command,

    /// Request a sample pickup
    pub send_pickup: bool,

    /// Forget the current sample distance
    pub clear_sample_dist: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Forward,
    Stop,
    RockPicking,
    PostPickup,
    Recovery,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DecisionMgr {
    pub fn new(params: DecisionParams) -> Self {
        Self { params }
    }

    /// Run one decision tick on the vehicle state.
    ///
    /// Does nothing and returns `None` if perception has not yet produced a navigation summary.
    pub fn step(&self, vs: &mut VehicleState) -> Option<StepOutput> {
        let out = {
            let nav = vs.nav.as_ref()?;

            let input = DecisionInput {
                nav,
                velocity_ms: vs.pose.velocity_ms,
                sample_dist: vs.sample_dist,
                near_sample: vs.near_sample,
                picking_up: vs.picking_up,
            };

            self.step_mode(vs.ctrl, &input, vs.cmd)
        };

        if out.ctrl.mode != vs.ctrl.mode {
            info!("Decision mode change: {} -> {}", vs.ctrl.mode, out.ctrl.mode);
        }
        trace!("Decision output: {:?}", out);

        vs.ctrl = out.ctrl;
        vs.cmd = out.cmd;
        if out.send_pickup {
            vs.send_pickup = true;
        }
        if out.clear_sample_dist {
            vs.sample_dist = None;
        }

        Some(out)
    }

    /// Dispatch to the transition function of the current mode.
    pub fn step_mode(&self, ctrl: CtrlState, input: &DecisionInput, cmd: Command) -> StepOutput {
        match ctrl.mode {
            Mode::Forward => forward::step(&self.params, ctrl, input, cmd),
            Mode::Stop => stop::step(&self.params, ctrl, input, cmd),
            Mode::RockPicking => rock_picking::step(&self.params, ctrl, input, cmd),
            Mode::PostPickup => post_pickup::step(&self.params, ctrl, input, cmd),
            Mode::Recovery => recovery::step(&self.params, ctrl, input, cmd),
        }
    }
}

impl CtrlState {
    /// Switch to the given mode, zeroing the counter the new mode runs on.
    pub fn enter(&mut self, mode: Mode) {
        self.mode = mode;

        match mode {
            Mode::Forward | Mode::Stop => (),
            Mode::RockPicking | Mode::PostPickup => self.rock_picking_epoch = 0,
            Mode::Recovery => {
                self.recovery_epoch = 0;
                self.stuck_epoch = 0;
            }
        }
    }
}

impl StepOutput {
    /// An output with no requests.
    pub fn new(ctrl: CtrlState, cmd: Command) -> Self {
        Self {
            ctrl,
            cmd,
            send_pickup: false,
            clear_sample_dist: false,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Forward
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Forward => write!(f, "forward"),
            Mode::Stop => write!(f, "stop"),
            Mode::RockPicking => write!(f, "rock_picking"),
            Mode::PostPickup => write!(f, "post_pickup"),
            Mode::Recovery => write!(f, "recovery"),
        }
    }
}

/// Mean steering angle of the summary clipped to the steering limits, 0 if there is nothing to
/// steer towards.
fn clipped_steer_deg(params: &DecisionParams, nav: &NavSummary) -> f64 {
    nav.mean_steer_deg().map_or(0.0, |a| {
        util::maths::clamp(a, -params.max_steer_deg, params.max_steer_deg)
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::per::Polar;

    /// A summary of `count` navigable points all at the given angle.
    pub fn nav_summary(count: usize, angle_deg: f64) -> NavSummary {
        NavSummary {
            terrain: vec![
                Polar {
                    dist: 40.0,
                    angle_rad: angle_deg.to_radians(),
                };
                count
            ],
            target: None,
        }
    }

    pub fn input(nav: &NavSummary) -> DecisionInput {
        DecisionInput {
            nav,
            velocity_ms: 0.0,
            sample_dist: None,
            near_sample: false,
            picking_up: false,
        }
    }

    pub fn ctrl(mode: Mode) -> CtrlState {
        CtrlState {
            mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_summary_is_noop() {
        let mgr = DecisionMgr::default();
        let mut vs = VehicleState::default();
        vs.cmd.throttle = 0.7;
        vs.ctrl.stuck_epoch = 3;

        assert!(mgr.step(&mut vs).is_none());
        assert_eq!(vs.cmd.throttle, 0.7);
        assert_eq!(vs.ctrl, CtrlState {
            stuck_epoch: 3,
            ..Default::default()
        });
    }

    #[test]
    fn test_forward_then_stop_semantics() {
        let mgr = DecisionMgr::default();
        let mut vs = VehicleState::default();
        vs.nav = Some(nav_summary(mgr.params.stop_forward - 1, 10.0));
        vs.pose.velocity_ms = 1.0;

        mgr.step(&mut vs).unwrap();

        assert_eq!(vs.cmd.brake, mgr.params.brake_set);
        assert_eq!(vs.cmd.steer_deg, 0.0);
        assert_eq!(vs.cmd.throttle, 0.0);
        assert_eq!(vs.ctrl.mode, Mode::Stop);

        // Still moving, so stop keeps braking
        mgr.step(&mut vs).unwrap();
        assert_eq!(vs.ctrl.mode, Mode::Stop);
        assert_eq!(vs.cmd.brake, mgr.params.brake_set);

        // Stationary, turns on the spot
        vs.pose.velocity_ms = 0.0;
        mgr.step(&mut vs).unwrap();
        assert_eq!(vs.cmd.brake, 0.0);
        assert_eq!(vs.cmd.steer_deg, -mgr.params.max_steer_deg);
    }

    #[test]
    fn test_stuck_forward_recovers() {
        let mgr = DecisionMgr::default();
        let mut vs = VehicleState::default();
        vs.nav = Some(nav_summary(1000, 0.0));

        for _ in 0..10 {
            mgr.step(&mut vs).unwrap();
            assert_eq!(vs.ctrl.mode, Mode::Forward);
            assert!(vs.cmd.throttle > 0.0);
        }

        mgr.step(&mut vs).unwrap();
        assert_eq!(vs.ctrl.mode, Mode::Recovery);
        assert_eq!(vs.ctrl.stuck_epoch, 0);
        assert_eq!(vs.ctrl.recovery_epoch, 0);

        // Run recovery to completion
        for _ in 0..21 {
            mgr.step(&mut vs).unwrap();
        }

        assert_eq!(vs.ctrl.mode, Mode::Forward);
        assert_eq!(vs.ctrl.stuck_epoch, 0);
        assert_eq!(vs.ctrl.recovery_epoch, 0);
    }

    #[test]
    fn test_pickup_sequence() {
        let mgr = DecisionMgr::default();
        let mut vs = VehicleState::default();
        vs.nav = Some(nav_summary(1000, 0.0));
        vs.sample_dist = Some(25.0);

        mgr.step(&mut vs).unwrap();
        assert_eq!(vs.ctrl.mode, Mode::RockPicking);

        vs.sample_dist = Some(17.0);
        vs.near_sample = true;
        let out = mgr.step(&mut vs).unwrap();

        assert!(out.send_pickup);
        assert!(vs.send_pickup);
        assert_eq!(vs.ctrl.mode, Mode::PostPickup);
        assert_eq!(vs.ctrl.rock_picking_epoch, 0);

        // The pickup is under way, no further requests
        vs.send_pickup = false;
        vs.picking_up = true;
        for _ in 0..5 {
            let out = mgr.step(&mut vs).unwrap();
            assert!(!out.send_pickup);
            assert_eq!(vs.ctrl.mode, Mode::PostPickup);
        }

        vs.picking_up = false;
        vs.sample_dist = Some(3.0);
        mgr.step(&mut vs).unwrap();

        assert_eq!(vs.ctrl.mode, Mode::Stop);
        assert_eq!(vs.sample_dist, None);
        assert!(!vs.send_pickup);
    }

    #[test]
    fn test_enter_zeroes_counters() {
        let mut c = CtrlState {
            mode: Mode::Forward,
            stuck_epoch: 11,
            rock_picking_epoch: 40,
            recovery_epoch: 7,
        };

        c.enter(Mode::Recovery);
        assert_eq!((c.stuck_epoch, c.recovery_epoch, c.rock_picking_epoch), (0, 0, 40));

        c.enter(Mode::RockPicking);
        assert_eq!(c.rock_picking_epoch, 0);
        assert_eq!(c.mode, Mode::RockPicking);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::default().to_string(), "forward");
        assert_eq!(Mode::RockPicking.to_string(), "rock_picking");
        assert_eq!(Mode::PostPickup.to_string(), "post_pickup");
    }
}
