//! Sample rover executable entry point.
//!
//! # Architecture
//!
//! The executable replays a recorded drive log through the rover control loop:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the rover control module
//!     - Main loop, once per log row:
//!         - Frame and pose acquisition from the log
//!         - Pickup mechanism status
//!         - Rover control processing (perception then decision)
//!         - Periodic world map coverage reports and snapshots
//!     - Save the final world map and exit the session
//!
//! # Usage
//!
//! ```text
//! sample_rover <log.csv>
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::Utc;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use image::RgbImage;
use log::{debug, info, warn};
use std::{env, fs, path::Path};

// Internal
use rov_lib::{
    params::RovExecParams,
    pickup::PickupSim,
    replay::TelemetryLog,
    rov_ctrl::{InitData, RovCtrl, TickInput},
    vehicle_state::VehicleState,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
    time,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("sample_rover", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Sample Rover Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- ARGUMENTS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected exactly one argument, the path to the drive log, found {}",
            args.len() - 1
        ));
    }

    // ---- LOAD PARAMETERS ----

    let exec_params: RovExecParams =
        util::params::load("rov_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut rov_ctrl = RovCtrl::default();
    rov_ctrl
        .init(
            InitData {
                per_mgr_params: exec_params.per_mgr_params.clone(),
                decision_params: exec_params.decision_params.clone(),
            },
            &session,
        )
        .wrap_err("Failed to initialise RovCtrl")?;
    info!("RovCtrl init complete");

    let mut pickup = PickupSim::new(exec_params.pickup_duration_ticks);

    let log = TelemetryLog::new(&args[1]).wrap_err("Failed to load the drive log")?;
    info!("Replaying {} rows from \"{}\"\n", log.remaining(), &args[1]);

    // ---- MAIN LOOP ----

    let start_time = Utc::now();
    let mut num_rejected = 0u64;

    for tick in log {
        let tick = match tick {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping log row: {}", e);
                num_rejected += 1;
                continue;
            }
        };

        let status = pickup.next_status();

        let input = TickInput {
            pose: tick.record.pose(),
            near_sample: tick.record.near_sample != 0,
            picking_up: tick.record.picking_up != 0 || status.picking_up,
            pickup_acknowledged: status.acknowledged,
            frame: tick.frame,
        };

        let (output, report) = match rov_ctrl.proc(&input) {
            Ok(o) => o,
            Err(e) => {
                warn!("Tick skipped: {}", e);
                num_rejected += 1;
                continue;
            }
        };

        pickup.request(output.send_pickup);

        debug!(
            "Recorded command: thr {:.2} brk {:.2} str {:.2} deg",
            tick.record.throttle, tick.record.brake, tick.record.steer_deg
        );

        if exec_params.coverage_log_period_ticks > 0
            && report.tick % exec_params.coverage_log_period_ticks == 0
        {
            info!(
                "Tick {}: mode {}, coverage {:?}",
                report.tick,
                output.mode,
                rov_ctrl.state().world_map.coverage()
            );
        }

        if exec_params.map_snapshot_period_ticks > 0
            && report.tick % exec_params.map_snapshot_period_ticks == 0
        {
            save_snapshot(&session, rov_ctrl.state(), &format!("{:06}", report.tick));
        }
    }

    // ---- SHUTDOWN ----

    let elapsed_s = time::duration_to_seconds(Utc::now() - start_time).unwrap_or(f64::NAN);

    info!(
        "Replay complete: {} ticks in {:.2} s, {} rows rejected, {} pickups",
        rov_ctrl.num_ticks(),
        elapsed_s,
        num_rejected,
        pickup.num_pickups()
    );
    info!("Final coverage: {:?}", rov_ctrl.state().world_map.coverage());

    save_snapshot(&session, rov_ctrl.state(), "final");

    session.exit();

    Ok(())
}

/// Save the world map through the session and the current vision image alongside it.
fn save_snapshot(session: &Session, vs: &VehicleState, label: &str) {
    session.save(
        format!("world_map/world_map_{}.json", label),
        vs.world_map.clone(),
    );

    let vision_path = session
        .session_root
        .join("vision")
        .join(format!("vision_{}.png", label));

    match save_vision_image(&vision_path, &vs.vision_image) {
        Ok(()) => debug!("Snapshot {} saved", label),
        Err(e) => warn!("Could not save the vision image: {:?}", e),
    }
}

/// Write the vision image to the given path, creating any missing parent directories.
fn save_vision_image(path: &Path, img: &RgbImage) -> Result<(), Report> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Cannot create the directory {:?}", parent))?;
    }

    img.save(path)
        .wrap_err_with(|| format!("Cannot write the image {:?}", path))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
