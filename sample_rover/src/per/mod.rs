//! # Perception module
//!
//! Converts each camera frame into classified pixels, accumulates them into the world map, and
//! produces the navigation summary used by the decision module.
//!
//! Per frame the [`PerMgr`]:
//!  - Rectifies the frame into a top-down view of the ground
//!  - Classifies the rectified pixels into navigable terrain, obstacles and samples
//!  - Converts each class into rover-centric coordinates
//!  - Projects those into the world map, if the rover is level enough for the projection to hold
//!  - Reduces the navigable and sample pixels into a navigation summary

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod classify;
pub mod coords;
pub mod nav;
mod params;
mod warp;
mod world_map;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::Serialize;
use util::maths;

pub use self::{
    classify::Mask,
    coords::{Polar, RoverCoords, WorldCell},
    nav::NavSummary,
    params::PerMgrParams,
    warp::PerspectiveWarp,
    world_map::{MapCoverage, MapLayer, WorldMap},
};
use crate::vehicle_state::{Pose, VehicleState};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Manages the perception pipeline.
#[derive(Debug, Clone)]
pub struct PerMgr {
    pub params: PerMgrParams,

    warp: PerspectiveWarp,
}

/// Status report of a single perception step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerReport {
    /// Number of navigable pixels in the rectified frame
    pub num_navigable: usize,

    /// Number of obstacle pixels in the rectified frame
    pub num_obstacle: usize,

    /// Number of sample pixels in the rectified frame
    pub num_sample: usize,

    /// Number of navigable points in the navigation summary
    pub num_nav_points: usize,

    /// True if the world map was updated
    pub map_updated: bool,

    /// True if a sample was detected
    pub sample_detected: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum PerError {
    #[error("The calibration points do not define a perspective transform")]
    DegenerateCalibration,

    #[error("Expected a {expected:?} frame but found a {found:?} one")]
    FrameSizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerMgr {
    /// Create a new manager, solving the calibration warp once.
    pub fn new(params: PerMgrParams) -> Result<Self, PerError> {
        let [width, height] = params.frame_size_pixels;
        let warp = PerspectiveWarp::new(params.calib_src(), params.calib_dst(), width, height)?;

        Ok(Self { params, warp })
    }

    /// Create a vehicle state sized for this manager's frames and world map.
    pub fn new_vehicle_state(&self) -> VehicleState {
        let [width, height] = self.params.frame_size_pixels;
        VehicleState::new(width, height, self.params.world_size_cells)
    }

    /// Run perception on the state's current frame and pose.
    ///
    /// Updates the vision image, world map, navigation summary and sample distance. On error the
    /// state is left untouched.
    pub fn step(&self, vs: &mut VehicleState) -> Result<PerReport, PerError> {
        let warped = self.warp.warp(&vs.frame)?;

        // ---- CLASSIFICATION ----

        let terrain = classify::terrain_filter(&warped, self.params.terrain_rgb_thresh);
        let sample = classify::sample_filter(
            &warped,
            self.params.sample_hsv_low,
            self.params.sample_hsv_high,
        );

        if vs.vision_image.dimensions() != warped.dimensions() {
            vs.vision_image = image::RgbImage::new(warped.width(), warped.height());
        }
        classify::paint_channel(
            &mut vs.vision_image,
            MapLayer::Obstacle as usize,
            &terrain.obstacle,
        );
        classify::paint_channel(&mut vs.vision_image, MapLayer::Sample as usize, &sample);
        classify::paint_channel(
            &mut vs.vision_image,
            MapLayer::Navigable as usize,
            &terrain.navigable,
        );

        // ---- ROVER FRAME ----

        let navigable_rov = coords::rover_coords(&terrain.navigable);
        let obstacle_rov = coords::rover_coords(&terrain.obstacle);
        let sample_rov = coords::rover_coords(&sample);

        // ---- WORLD MAP ----

        let map_updated = self.pose_is_level(&vs.pose);

        if map_updated {
            let world_size = vs.world_map.size();
            let pose = &vs.pose;

            let layers = [
                (MapLayer::Obstacle, &obstacle_rov, self.params.obstacle_scale),
                (MapLayer::Sample, &sample_rov, self.params.sample_scale),
                (MapLayer::Navigable, &navigable_rov, self.params.navigable_scale),
            ];

            for &(layer, rov, scale) in layers.iter() {
                let cells = rov.to_world(&pose.position_m, pose.yaw_deg, world_size, scale);
                vs.world_map.accumulate(layer, &cells);
            }
        } else {
            debug!(
                "World map update skipped, pitch {:.2} deg, roll {:.2} deg",
                vs.pose.pitch_deg, vs.pose.roll_deg
            );
        }

        // ---- NAVIGATION ----

        let reduction = nav::reduce(
            &navigable_rov,
            &sample_rov,
            self.params.nav_window_deg,
            self.params.sample_min_pixels,
        );

        let report = PerReport {
            num_navigable: navigable_rov.len(),
            num_obstacle: obstacle_rov.len(),
            num_sample: sample_rov.len(),
            num_nav_points: reduction.summary.count(),
            map_updated,
            sample_detected: reduction.sample_dist.is_some(),
        };

        trace!("Perception report: {:?}", report);
        if let Some(d) = reduction.sample_dist {
            debug!("Sample visible at mean distance {:.1} px", d);
        }

        vs.nav = Some(reduction.summary);
        vs.sample_dist = reduction.sample_dist;

        Ok(report)
    }

    /// Returns true if neither pitch nor roll lies in the rejection range, i.e. the rover is level
    /// enough for the ground projection to be trusted.
    pub fn pose_is_level(&self, pose: &Pose) -> bool {
        let [lower, upper] = self.params.tilt_reject_range_deg;

        !maths::in_half_open_range(pose.pitch_deg, lower, upper)
            && !maths::in_half_open_range(pose.roll_deg, lower, upper)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::{Rgb, RgbImage};
    use nalgebra::Vector2;

    /// Bright ground across the bottom half of the frame, dark sky above, and a yellow rock
    /// standing on the ground ahead of the rover.
    fn scene() -> RgbImage {
        RgbImage::from_fn(320, 160, |x, y| {
            if (80..240).contains(&x) && (108..136).contains(&y) {
                Rgb([200, 170, 0])
            } else if y >= 90 {
                Rgb([210, 190, 180])
            } else {
                Rgb([40, 30, 20])
            }
        })
    }

    fn level_state(per_mgr: &PerMgr) -> VehicleState {
        let mut vs = per_mgr.new_vehicle_state();
        vs.frame = scene();
        vs.pose.position_m = Vector2::new(100.0, 100.0);
        vs.pose.yaw_deg = 30.0;
        vs
    }

    #[test]
    fn test_step_produces_summary_and_map() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();
        let mut vs = level_state(&per_mgr);

        assert!(vs.nav.is_none());

        let report = per_mgr.step(&mut vs).unwrap();

        assert!(report.map_updated);
        assert!(report.num_navigable > 0);
        assert_eq!(report.num_navigable + report.num_obstacle, 320 * 160);
        assert!(vs.nav.is_some());

        let cov = vs.world_map.coverage();
        assert!(cov.observed_cells > 0);
        assert!(cov.navigable_cells > 0);
    }

    #[test]
    fn test_rock_is_detected() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();
        let mut vs = level_state(&per_mgr);

        let report = per_mgr.step(&mut vs).unwrap();

        assert!(report.num_sample > 10);
        assert!(report.sample_detected);

        let dist = vs.sample_dist.unwrap();
        assert!(dist > 0.0 && dist < 30.0);

        // Steering follows the rock rather than the terrain
        let nav = vs.nav.as_ref().unwrap();
        assert_eq!(nav.target.as_ref().map(Vec::len), Some(report.num_sample));
        assert!(vs.vision_image.pixels().any(|px| px[1] == 255));
        assert!(vs.world_map.coverage().sample_cells > 0);
    }

    #[test]
    fn test_vision_image_channels() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();
        let mut vs = level_state(&per_mgr);

        per_mgr.step(&mut vs).unwrap();

        for px in vs.vision_image.pixels() {
            // Obstacle and navigable are exclusive and always one of the two
            assert!(px[0] == 255 || px[0] == 0);
            assert_eq!(px[0] as u16 + px[2] as u16, 255);
        }
    }

    #[test]
    fn test_tilted_pose_skips_map() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();

        for &(pitch, roll) in [(0.5, 0.0), (0.0, 358.99), (180.0, 180.0)].iter() {
            let mut vs = level_state(&per_mgr);
            vs.pose.pitch_deg = pitch;
            vs.pose.roll_deg = roll;

            let report = per_mgr.step(&mut vs).unwrap();

            assert!(!report.map_updated);
            assert_eq!(vs.world_map, WorldMap::new(200));
            // Vision is updated regardless
            assert!(vs.vision_image.pixels().any(|px| px[2] == 255));
        }
    }

    #[test]
    fn test_near_level_pose_updates_map() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();

        for &(pitch, roll) in [(0.49, 0.0), (359.0, 359.5), (0.0, 0.2)].iter() {
            let mut vs = level_state(&per_mgr);
            vs.pose.pitch_deg = pitch;
            vs.pose.roll_deg = roll;

            assert!(per_mgr.step(&mut vs).unwrap().map_updated);
        }
    }

    #[test]
    fn test_map_is_monotonic_over_ticks() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();
        let mut vs = level_state(&per_mgr);

        let mut last = vs.world_map.clone();

        for tick in 0..4 {
            vs.pose.yaw_deg = 90.0 * tick as f64;
            // Every other tick is tilted
            vs.pose.pitch_deg = if tick % 2 == 1 { 5.0 } else { 0.0 };

            per_mgr.step(&mut vs).unwrap();

            for layer in [MapLayer::Obstacle, MapLayer::Sample, MapLayer::Navigable].iter() {
                let now = vs.world_map.layer(*layer);
                let before = last.layer(*layer);
                assert!(now.iter().zip(before.iter()).all(|(n, b)| n >= b));
            }

            if tick % 2 == 1 {
                assert_eq!(vs.world_map, last);
            }

            last = vs.world_map.clone();
        }
    }

    #[test]
    fn test_wrong_frame_size_leaves_state() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();
        let mut vs = per_mgr.new_vehicle_state();
        vs.frame = RgbImage::new(100, 100);

        assert!(matches!(
            per_mgr.step(&mut vs),
            Err(PerError::FrameSizeMismatch { .. })
        ));
        assert!(vs.nav.is_none());
    }
}
