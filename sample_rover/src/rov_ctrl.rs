//! # Rover control module
//!
//! [`RovCtrl`] owns the [`VehicleState`] and runs one control tick per camera frame: the new
//! frame and pose are written into the state, perception updates it, then decision produces the
//! command.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use log::{debug, info, warn};
use serde::Serialize;

use util::{
    archive::{ArchiveError, Archiver},
    module::State,
    params,
    session::Session,
};

use crate::{
    decision::{Command, DecisionMgr, DecisionParams, DecisionTm, Mode},
    per::{PerError, PerMgr, PerMgrParams, PerReport},
    vehicle_state::{Pose, VehicleState},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Rover control module state
#[derive(Default)]
pub struct RovCtrl {
    per_mgr: Option<PerMgr>,

    decision_mgr: DecisionMgr,

    vs: VehicleState,

    num_ticks: u64,

    arch_decision: Archiver,
}

/// Paths to the module's parameter files, relative to the params directory.
#[derive(Debug, Clone)]
pub struct InitData {
    pub per_mgr_params: String,
    pub decision_params: String,
}

/// Input data for a single tick.
#[derive(Debug, Clone)]
pub struct TickInput {
    pub frame: RgbImage,

    pub pose: Pose,

    pub near_sample: bool,

    pub picking_up: bool,

    /// Set when the pickup mechanism has consumed the last pickup request
    pub pickup_acknowledged: bool,
}

/// Command output of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickOutput {
    pub cmd: Command,

    pub mode: Mode,

    /// A sample pickup is being requested
    pub send_pickup: bool,
}

/// Status report for a single tick.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TickReport {
    pub tick: u64,

    pub per: PerReport,

    /// True if the decision mode changed this tick
    pub mode_changed: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RovCtrlError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Failed to initialise perception: {0}")]
    PerInit(PerError),

    #[error("Archive error: {0}")]
    Archive(ArchiveError),

    #[error("RovCtrl has not been initialised")]
    NotInitialised,

    #[error("Perception error: {0}")]
    Per(PerError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RovCtrl {
    /// Create a module from already loaded parameters, without archiving.
    pub fn with_params(
        per_params: PerMgrParams,
        decision_params: DecisionParams,
    ) -> Result<Self, RovCtrlError> {
        let per_mgr = PerMgr::new(per_params).map_err(RovCtrlError::PerInit)?;

        Ok(Self {
            vs: per_mgr.new_vehicle_state(),
            per_mgr: Some(per_mgr),
            decision_mgr: DecisionMgr::new(decision_params),
            num_ticks: 0,
            arch_decision: Archiver::default(),
        })
    }

    /// The vehicle state as of the end of the last tick.
    pub fn state(&self) -> &VehicleState {
        &self.vs
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }
}

impl State for RovCtrl {
    type InitData = InitData;
    type InitError = RovCtrlError;

    type InputData = TickInput;
    type OutputData = TickOutput;
    type StatusReport = TickReport;
    type ProcError = RovCtrlError;

    /// Initialise the module.
    ///
    /// Loads the perception and decision parameters and opens the decision archive.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session,
    ) -> Result<(), Self::InitError> {
        let per_params: PerMgrParams =
            params::load(&init_data.per_mgr_params).map_err(RovCtrlError::ParamLoadError)?;
        let decision_params: DecisionParams =
            params::load(&init_data.decision_params).map_err(RovCtrlError::ParamLoadError)?;

        info!(
            "Loaded parameters from {} and {}",
            init_data.per_mgr_params, init_data.decision_params
        );

        *self = Self::with_params(per_params, decision_params)?;

        self.arch_decision =
            Archiver::from_path(session, "decision/tm.csv").map_err(RovCtrlError::Archive)?;

        Ok(())
    }

    /// Run one tick.
    ///
    /// If the frame is rejected by perception the error is returned and the previous command
    /// remains in force.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let per_mgr = self.per_mgr.as_ref().ok_or(RovCtrlError::NotInitialised)?;

        // ---- INPUTS ----

        self.vs.frame = input_data.frame.clone();
        self.vs.pose = input_data.pose;
        self.vs.near_sample = input_data.near_sample;
        self.vs.picking_up = input_data.picking_up;
        if input_data.pickup_acknowledged {
            self.vs.send_pickup = false;
        }

        // ---- PERCEPTION ----

        let per_report = per_mgr.step(&mut self.vs).map_err(|e| {
            warn!("Frame rejected by perception: {}", e);
            RovCtrlError::Per(e)
        })?;

        // ---- DECISION ----

        let last_mode = self.vs.ctrl.mode;
        self.decision_mgr.step(&mut self.vs);

        self.num_ticks += 1;

        let output = TickOutput {
            cmd: self.vs.cmd,
            mode: self.vs.ctrl.mode,
            send_pickup: self.vs.send_pickup,
        };
        let report = TickReport {
            tick: self.num_ticks,
            per: per_report,
            mode_changed: last_mode != self.vs.ctrl.mode,
        };

        debug!(
            "Tick {}: {} thr {:.2} brk {:.2} str {:.2} deg",
            self.num_ticks, output.mode, output.cmd.throttle, output.cmd.brake, output.cmd.steer_deg
        );

        self.arch_decision
            .serialise(DecisionTm::from_state(self.num_ticks, &self.vs))
            .map_err(RovCtrlError::Archive)?;

        Ok((output, report))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
