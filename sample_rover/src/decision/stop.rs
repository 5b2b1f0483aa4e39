//! # Stop mode

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{
    clipped_steer_deg, Command, CtrlState, DecisionInput, DecisionParams, Mode, StepOutput,
};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Brake until stationary, then turn on the spot until there is enough terrain to go forward.
///
/// Possible transitions:
/// - `Forward` once stationary with enough navigable terrain in view
pub fn step(
    params: &DecisionParams,
    mut ctrl: CtrlState,
    input: &DecisionInput,
    mut cmd: Command,
) -> StepOutput {
    if input.velocity_ms > params.stop.moving_vel {
        cmd.throttle = 0.0;
        cmd.brake = params.brake_set;
        cmd.steer_deg = 0.0;
    } else if input.nav.count() < params.go_forward {
        // Releasing the brake while stopped with full lock turns the rover on the spot
        cmd.throttle = 0.0;
        cmd.brake = 0.0;
        cmd.steer_deg = -params.max_steer_deg;
    } else {
        cmd.throttle = params.throttle_set;
        cmd.brake = 0.0;
        cmd.steer_deg = clipped_steer_deg(params, input.nav);
        ctrl.enter(Mode::Forward);
    }

    StepOutput::new(ctrl, cmd)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
