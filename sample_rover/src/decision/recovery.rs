//! # Recovery mode

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{Command, CtrlState, DecisionInput, DecisionParams, Mode, StepOutput};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Reverse straight back for a fixed number of ticks.
///
/// Possible transitions:
/// - `Forward` once the rover has reversed for long enough
pub fn step(
    params: &DecisionParams,
    mut ctrl: CtrlState,
    _input: &DecisionInput,
    mut cmd: Command,
) -> StepOutput {
    cmd.brake = 0.0;
    cmd.steer_deg = 0.0;
    cmd.throttle = params.recovery.reverse_throttle;

    ctrl.recovery_epoch += 1;

    if ctrl.recovery_epoch > params.recovery.duration {
        cmd.throttle = 0.0;
        cmd.brake = params.brake_set;
        ctrl.stuck_epoch = 0;
        ctrl.recovery_epoch = 0;
        ctrl.enter(Mode::Forward);
    }

    StepOutput::new(ctrl, cmd)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::decision::test::{ctrl, input, nav_summary};

    #[test]
    fn test_recovery_duration() {
        let params = DecisionParams::default();
        let nav = nav_summary(0, 0.0);
        let inp = input(&nav);

        let mut c = ctrl(Mode::Recovery);
        c.stuck_epoch = 11;

        for _ in 0..20 {
            let out = step(&params, c, &inp, Command::default());
            assert_eq!(out.ctrl.mode, Mode::Recovery);
            assert_eq!(out.cmd.throttle, -0.2);
            assert_eq!(out.cmd.brake, 0.0);
            c = out.ctrl;
        }

        // 21st tick
        let out = step(&params, c, &inp, Command::default());
        assert_eq!(out.ctrl.mode, Mode::Forward);
        assert_eq!(out.ctrl.stuck_epoch, 0);
        assert_eq!(out.ctrl.recovery_epoch, 0);
        assert_eq!(out.cmd.throttle, 0.0);
        assert_eq!(out.cmd.brake, params.brake_set);
    }
}
