//! # Post pickup mode

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{Command, CtrlState, DecisionInput, DecisionParams, Mode, StepOutput};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Hold the command while the pickup mechanism works.
///
/// Possible transitions:
/// - `Stop` once the pickup finishes or takes too long
pub fn step(
    params: &DecisionParams,
    mut ctrl: CtrlState,
    input: &DecisionInput,
    cmd: Command,
) -> StepOutput {
    ctrl.rock_picking_epoch += 1;

    let done = if !input.picking_up {
        true
    } else if ctrl.rock_picking_epoch >= params.post_pickup.timeout {
        ctrl.rock_picking_epoch = 0;
        true
    } else {
        false
    };

    if done {
        ctrl.enter(Mode::Stop);
    }

    StepOutput {
        ctrl,
        cmd,
        send_pickup: false,
        clear_sample_dist: done,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::decision::test::{ctrl, input, nav_summary};

    #[test]
    fn test_wait_for_pickup() {
        let params = DecisionParams::default();
        let nav = nav_summary(0, 0.0);
        let mut inp = input(&nav);
        inp.picking_up = true;

        let mut c = ctrl(Mode::PostPickup);
        for i in 1..params.post_pickup.timeout {
            let out = step(&params, c, &inp, Command::default());
            assert_eq!(out.ctrl.mode, Mode::PostPickup);
            assert_eq!(out.ctrl.rock_picking_epoch, i);
            assert!(!out.clear_sample_dist);
            c = out.ctrl;
        }

        let out = step(&params, c, &inp, Command::default());
        assert_eq!(out.ctrl.mode, Mode::Stop);
        assert_eq!(out.ctrl.rock_picking_epoch, 0);
        assert!(out.clear_sample_dist);
    }

    #[test]
    fn test_pickup_finished() {
        let params = DecisionParams::default();
        let nav = nav_summary(0, 0.0);

        let out = step(&params, ctrl(Mode::PostPickup), &input(&nav), Command::default());

        assert_eq!(out.ctrl.mode, Mode::Stop);
        assert!(out.clear_sample_dist);
    }
}
