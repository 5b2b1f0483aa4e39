//! # Perception Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the perception manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerMgrParams {
    // ---- CAMERA ----
    /// Width and height of the camera frames.
    ///
    /// Units: pixels
    pub frame_size_pixels: [u32; 2],

    /// Image points of a one meter ground square, ordered bottom left, bottom right, top right,
    /// top left, as `[x, y]`.
    ///
    /// Units: pixels
    pub calib_src_pixels: [[f64; 2]; 4],

    /// Half the side of the rectified ground square. A square of `2 * dst_size_pixels` pixels
    /// covers one square meter.
    ///
    /// Units: pixels
    pub dst_size_pixels: f64,

    /// Distance from the bottom of the rectified frame to the near edge of the ground square,
    /// since the rover body hides the ground directly in front of the camera.
    ///
    /// Units: pixels
    pub bottom_offset_pixels: f64,

    // ---- CLASSIFICATION ----
    /// A pixel is navigable if every channel is strictly above this threshold.
    pub terrain_rgb_thresh: [u8; 3],

    /// Inclusive lower bound of sample colours as `[hue, saturation, value]`, hue in [0, 180).
    pub sample_hsv_low: [u8; 3],

    /// Inclusive upper bound of sample colours as `[hue, saturation, value]`, hue in [0, 180).
    pub sample_hsv_high: [u8; 3],

    // ---- WORLD MAP ----
    /// Number of cells along each side of the world map.
    pub world_size_cells: usize,

    /// Rover pixels per world cell for navigable terrain.
    pub navigable_scale: f64,

    /// Rover pixels per world cell for obstacles.
    pub obstacle_scale: f64,

    /// Rover pixels per world cell for samples.
    pub sample_scale: f64,

    /// Half-open range `[lower, upper)` of pitch or roll which blocks world map updates.
    ///
    /// Units: degrees
    pub tilt_reject_range_deg: [f64; 2],

    // ---- NAVIGATION ----
    /// Inclusive window of navigable pixel angles kept in the navigation summary.
    ///
    /// Units: degrees
    pub nav_window_deg: [f64; 2],

    /// A sample is considered detected when the number of nonzero sample coordinates is greater
    /// than this.
    pub sample_min_pixels: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerMgrParams {
    /// Source points of the calibration as `(x, y)` pairs.
    pub fn calib_src(&self) -> [(f64, f64); 4] {
        let p = &self.calib_src_pixels;
        [(p[0][0], p[0][1]), (p[1][0], p[1][1]), (p[2][0], p[2][1]), (p[3][0], p[3][1])]
    }

    /// Destination points of the calibration as `(x, y)` pairs, in the same order as
    /// [`PerMgrParams::calib_src`].
    pub fn calib_dst(&self) -> [(f64, f64); 4] {
        let half_width = self.frame_size_pixels[0] as f64 / 2.0;
        let bottom = self.frame_size_pixels[1] as f64 - self.bottom_offset_pixels;
        let top = bottom - 2.0 * self.dst_size_pixels;

        [
            (half_width - self.dst_size_pixels, bottom),
            (half_width + self.dst_size_pixels, bottom),
            (half_width + self.dst_size_pixels, top),
            (half_width - self.dst_size_pixels, top),
        ]
    }
}

impl Default for PerMgrParams {
    fn default() -> Self {
        Self {
            frame_size_pixels: [320, 160],
            calib_src_pixels: [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]],
            dst_size_pixels: 5.0,
            bottom_offset_pixels: 6.0,
            terrain_rgb_thresh: [160, 160, 160],
            sample_hsv_low: [20, 100, 100],
            sample_hsv_high: [30, 255, 255],
            world_size_cells: 200,
            navigable_scale: 10.0,
            obstacle_scale: 10.0,
            sample_scale: 10.0,
            tilt_reject_range_deg: [0.5, 359.0],
            nav_window_deg: [-5.0, 30.0],
            sample_min_pixels: 20,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_matches_default() {
        let params: PerMgrParams =
            util::params::from_str(include_str!("../../../params/per_mgr.toml")).unwrap();

        assert_eq!(params, PerMgrParams::default());
    }

    #[test]
    fn test_calib_dst() {
        let dst = PerMgrParams::default().calib_dst();

        assert_eq!(dst[0], (155.0, 154.0));
        assert_eq!(dst[2], (165.0, 144.0));
    }
}
