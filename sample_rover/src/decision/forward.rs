//! # Forward mode

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{
    clipped_steer_deg, Command, CtrlState, DecisionInput, DecisionParams, Mode, StepOutput,
};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Drive towards the mean navigable heading.
///
/// Possible transitions, later ones taking precedence within a tick:
/// - `Stop` if too little navigable terrain is visible
/// - `RockPicking` if a sample is close enough
/// - `Recovery` if the rover has been throttling without moving for too long
pub fn step(
    params: &DecisionParams,
    mut ctrl: CtrlState,
    input: &DecisionInput,
    mut cmd: Command,
) -> StepOutput {
    if input.nav.count() >= params.stop_forward {
        cmd.throttle = if input.velocity_ms < params.max_vel {
            params.throttle_set
        } else {
            0.0
        };
        cmd.brake = 0.0;
        cmd.steer_deg = clipped_steer_deg(params, input.nav);
    } else {
        cmd.throttle = 0.0;
        cmd.brake = params.brake_set;
        cmd.steer_deg = 0.0;
        ctrl.enter(Mode::Stop);
    }

    if let Some(d) = input.sample_dist {
        if d <= params.forward.sample_approach_dist {
            ctrl.enter(Mode::RockPicking);
        }
    }

    if cmd.throttle > 0.0 && input.velocity_ms <= params.forward.stuck_vel {
        ctrl.stuck_epoch += 1;
    } else {
        ctrl.stuck_epoch = 0;
    }

    if ctrl.stuck_epoch > params.forward.stuck_limit {
        ctrl.enter(Mode::Recovery);
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
    fn test_drive() {
        let params = DecisionParams::default();
        let nav = nav_summary(params.stop_forward, 40.0);
        let mut inp = input(&nav);
        inp.velocity_ms = 1.0;

        let out = step(&params, ctrl(Mode::Forward), &inp, Command::default());

        assert_eq!(out.ctrl.mode, Mode::Forward);
        assert_eq!(out.cmd.throttle, params.throttle_set);
        assert_eq!(out.cmd.brake, 0.0);
        // 40 deg is clipped
        assert_eq!(out.cmd.steer_deg, params.max_steer_deg);
        assert_eq!(out.ctrl.stuck_epoch, 0);
    }

    #[test]
    fn test_coast_at_max_vel() {
        let params = DecisionParams::default();
        let nav = nav_summary(100, -4.0);
        let mut inp = input(&nav);
        inp.velocity_ms = params.max_vel;

        let out = step(&params, ctrl(Mode::Forward), &inp, Command::default());

        assert_eq!(out.cmd.throttle, 0.0);
        assert!((out.cmd.steer_deg + 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_on_too_little_terrain() {
        let params = DecisionParams::default();
        let nav = nav_summary(params.stop_forward - 1, 5.0);
        let prev = Command {
            throttle: 0.2,
            brake: 0.0,
            steer_deg: 8.0,
        };

        let out = step(&params, ctrl(Mode::Forward), &input(&nav), prev);

        assert_eq!(out.ctrl.mode, Mode::Stop);
        assert_eq!(
            out.cmd,
            Command {
                throttle: 0.0,
                brake: params.brake_set,
                steer_deg: 0.0
            }
        );
    }

    #[test]
    fn test_approach_sample() {
        let params = DecisionParams::default();
        let nav = nav_summary(10, 0.0);

        for &(dist, mode) in [(30.0, Mode::RockPicking), (30.5, Mode::Stop)].iter() {
            let mut inp = input(&nav);
            inp.sample_dist = Some(dist);

            let out = step(&params, ctrl(Mode::Forward), &inp, Command::default());
            assert_eq!(out.ctrl.mode, mode);
        }
    }

    #[test]
    fn test_progress_resets_stuck() {
        let params = DecisionParams::default();
        let nav = nav_summary(100, 0.0);
        let mut inp = input(&nav);
        inp.velocity_ms = 0.5;

        let mut c = ctrl(Mode::Forward);
        c.stuck_epoch = 9;

        let out = step(&params, c, &inp, Command::default());
        assert_eq!(out.ctrl.stuck_epoch, 0);
    }
}
