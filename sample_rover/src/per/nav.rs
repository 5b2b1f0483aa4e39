//! # Navigation Reduction
//!
//! Reduces the rover-centric pixels of a frame to the summary used for steering.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use util::maths;

use super::coords::{Polar, RoverCoords};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Navigation summary of a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavSummary {
    /// Navigable terrain inside the navigation window.
    pub terrain: Vec<Polar>,

    /// The visible sample, if one was detected. When present its angles replace the terrain's
    /// for steering.
    pub target: Option<Vec<Polar>>,
}

/// Output of [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub struct NavReduction {
    pub summary: NavSummary,

    /// Mean distance to the sample pixels, `None` if no sample was detected.
    pub sample_dist: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavSummary {
    /// Number of navigable terrain points.
    pub fn count(&self) -> usize {
        self.terrain.len()
    }

    /// Angles to steer towards, the sample's if one is visible or the terrain's otherwise.
    pub fn steer_angles(&self) -> impl Iterator<Item = f64> + '_ {
        self.target
            .as_ref()
            .unwrap_or(&self.terrain)
            .iter()
            .map(|p| p.angle_rad)
    }

    /// Mean steering angle in degrees, `None` if there are no angles.
    pub fn mean_steer_deg(&self) -> Option<f64> {
        maths::mean(self.steer_angles()).map(f64::to_degrees)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Reduce the navigable and sample pixels of a frame into a navigation summary.
///
/// Navigable pixels are kept if their angle lies in the inclusive `window_deg`. A sample is
/// detected when it has more than `sample_min_pixels` nonzero coordinate components.
pub fn reduce(
    navigable: &RoverCoords,
    sample: &RoverCoords,
    window_deg: [f64; 2],
    sample_min_pixels: usize,
) -> NavReduction {
    let lower = window_deg[0].to_radians();
    let upper = window_deg[1].to_radians();

    let terrain = navigable
        .to_polar()
        .into_iter()
        .filter(|p| p.angle_rad >= lower && p.angle_rad <= upper)
        .collect();

    let (target, sample_dist) = if sample.count_nonzero() > sample_min_pixels {
        let polar = sample.to_polar();
        let dist = maths::mean(polar.iter().map(|p| p.dist));
        (Some(polar), dist)
    } else {
        (None, None)
    };

    NavReduction {
        summary: NavSummary { terrain, target },
        sample_dist,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn coords(points: &[(f64, f64)]) -> RoverCoords {
        RoverCoords {
            x: points.iter().map(|p| p.0).collect(),
            y: points.iter().map(|p| p.1).collect(),
        }
    }

    #[test]
    fn test_window() {
        // 0 deg, 20 deg, 45 deg, -10 deg
        let nav = coords(&[
            (10.0, 0.0),
            (10.0, 10.0 * 20f64.to_radians().tan()),
            (10.0, 10.0),
            (10.0, -10.0 * 10f64.to_radians().tan()),
        ]);

        let red = reduce(&nav, &RoverCoords::default(), [-5.0, 30.0], 20);

        assert_eq!(red.summary.count(), 2);
        assert_eq!(red.sample_dist, None);
        assert!((red.summary.mean_steer_deg().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_overrides_steering() {
        let nav = coords(&vec![(50.0, 0.0); 100]);

        // 11 points at distance 25 to the right, 22 nonzero components
        let (dy, dx) = (-30f64).to_radians().sin_cos();
        let sample = coords(&vec![(25.0 * dx, 25.0 * dy); 11]);

        let red = reduce(&nav, &sample, [-5.0, 30.0], 20);

        assert!((red.sample_dist.unwrap() - 25.0).abs() < 1e-9);
        assert_eq!(red.summary.count(), 100);
        let angles: Vec<f64> = red.summary.steer_angles().collect();
        assert_eq!(angles.len(), 11);
        for a in angles {
            assert!((a.to_degrees() + 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_too_few_sample_pixels() {
        let nav = coords(&vec![(50.0, 0.0); 10]);
        // 10 points with both components nonzero is exactly 20, not enough
        let sample = coords(&vec![(20.0, 15.0); 10]);

        let red = reduce(&nav, &sample, [-5.0, 30.0], 20);

        assert_eq!(red.sample_dist, None);
        assert_eq!(red.summary.target, None);
        assert!(red.summary.steer_angles().all(|a| a == 0.0));
    }

    #[test]
    fn test_empty_summary_has_no_mean() {
        let red = reduce(&RoverCoords::default(), &RoverCoords::default(), [-5.0, 30.0], 20);
        assert_eq!(red.summary.mean_steer_deg(), None);
    }
}
