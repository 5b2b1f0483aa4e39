//! # Rock picking mode

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{Command, CtrlState, DecisionInput, DecisionParams, Mode, StepOutput};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Close in on the sample and request a pickup once stationary next to it.
///
/// Steering and throttle are left as the forward mode set them until the sample is close.
///
/// Possible transitions:
/// - `PostPickup` once the pickup has been requested
/// - `Recovery` if the approach takes too long
pub fn step(
    params: &DecisionParams,
    mut ctrl: CtrlState,
    input: &DecisionInput,
    mut cmd: Command,
) -> StepOutput {
    let p = &params.rock_picking;
    let mut send_pickup = false;
    let mut clear_sample_dist = false;

    ctrl.rock_picking_epoch += 1;

    if input.sample_dist.map_or(false, |d| d < p.pickup_dist) {
        cmd.brake = params.brake_set;
        cmd.throttle = 0.0;

        let stationary = input.velocity_ms >= 0.0 && input.velocity_ms <= p.stationary_vel;

        if input.near_sample && stationary && !input.picking_up {
            send_pickup = true;
            ctrl.enter(Mode::PostPickup);
        }
    }

    if ctrl.rock_picking_epoch >= p.timeout {
        ctrl.rock_picking_epoch = 0;
        clear_sample_dist = true;
        ctrl.enter(Mode::Recovery);
    }

    StepOutput {
        ctrl,
        cmd,
        send_pickup,
        clear_sample_dist,
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
    fn test_request_pickup() {
        let params = DecisionParams::default();
        let nav = nav_summary(0, 0.0);
        let mut inp = input(&nav);
        inp.sample_dist = Some(17.0);
        inp.near_sample = true;

        let mut c = ctrl(Mode::RockPicking);
        c.rock_picking_epoch = 30;

        let out = step(&params, c, &inp, Command::default());

        assert_eq!(out.ctrl.mode, Mode::PostPickup);
        assert_eq!(out.ctrl.rock_picking_epoch, 0);
        assert!(out.send_pickup);
        assert!(!out.clear_sample_dist);
        assert_eq!(out.cmd.brake, params.brake_set);
    }

    #[test]
    fn test_no_pickup_conditions() {
        let params = DecisionParams::default();
        let nav = nav_summary(0, 0.0);

        let cases: [(Option<f64>, bool, f64, bool); 5] = [
            (Some(18.0), true, 0.0, false),
            (None, true, 0.0, false),
            (Some(10.0), false, 0.0, false),
            (Some(10.0), true, 0.02, false),
            (Some(10.0), true, 0.0, true),
        ];

        for &(dist, near, vel, picking) in cases.iter() {
            let mut inp = input(&nav);
            inp.sample_dist = dist;
            inp.near_sample = near;
            inp.velocity_ms = vel;
            inp.picking_up = picking;

            let out = step(&params, ctrl(Mode::RockPicking), &inp, Command::default());

            assert_eq!(out.ctrl.mode, Mode::RockPicking);
            assert!(!out.send_pickup);
            assert_eq!(out.ctrl.rock_picking_epoch, 1);
        }
    }

    #[test]
    fn test_approach_keeps_forward_command() {
        let params = DecisionParams::default();
        let nav = nav_summary(0, 0.0);
        let mut inp = input(&nav);
        inp.sample_dist = Some(25.0);
        let prev = Command {
            throttle: 0.2,
            brake: 0.0,
            steer_deg: -6.0,
        };

        let out = step(&params, ctrl(Mode::RockPicking), &inp, prev);

        assert_eq!(out.cmd, prev);
    }

    #[test]
    fn test_timeout() {
        let params = DecisionParams::default();
        let nav = nav_summary(0, 0.0);
        let mut inp = input(&nav);
        inp.sample_dist = Some(25.0);

        let mut c = ctrl(Mode::RockPicking);
        c.rock_picking_epoch = params.rock_picking.timeout - 1;

        let out = step(&params, c, &inp, Command::default());

        assert_eq!(out.ctrl.mode, Mode::Recovery);
        assert_eq!(out.ctrl.rock_picking_epoch, 0);
        assert!(out.clear_sample_dist);
    }
}
