//! # Coordinate Mapping
//!
//! Conversions of classified pixels between the rectified image, rover-centric, polar, and world
//! map frames.
//!
//! The rover frame has its origin at the bottom centre of the rectified image, with X forward
//! and Y to the left. Distances are in rectified pixels.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use super::classify::Mask;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Rover frame positions of all set pixels in a mask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoverCoords {
    /// Forward distance of each pixel
    pub x: Vec<f64>,

    /// Leftward distance of each pixel
    pub y: Vec<f64>,
}

/// A point in rover polar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polar {
    /// Distance from the rover origin.
    ///
    /// Units: rectified pixels
    pub dist: f64,

    /// Angle from the forward axis, positive to the left.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// A world map cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldCell {
    pub x: usize,
    pub y: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoverCoords {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of nonzero components, counting forward and lateral components separately.
    pub fn count_nonzero(&self) -> usize {
        self.x.iter().chain(self.y.iter()).filter(|&&c| c != 0.0).count()
    }

    /// Polar form of every point, in the same order.
    pub fn to_polar(&self) -> Vec<Polar> {
        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| to_polar(x, y))
            .collect()
    }

    /// Project every point into the world map.
    ///
    /// `scale` is the number of rover pixels per world cell. Indices are clipped into the map.
    pub fn to_world(
        &self,
        position_m: &Vector2<f64>,
        yaw_deg: f64,
        world_size: usize,
        scale: f64,
    ) -> Vec<WorldCell> {
        let rot = Rotation2::new(yaw_deg.to_radians());

        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| {
                let world = translate(&(rot * Vector2::new(x, y)), position_m, scale);
                WorldCell {
                    x: clip_index(world.x, world_size),
                    y: clip_index(world.y, world_size),
                }
            })
            .collect()
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Rover frame coordinates of the set pixels of the mask, in row major order.
///
/// Image rows count up from the bottom into forward distance, and the column offset from the
/// image centre is negated into leftward distance.
pub fn rover_coords(mask: &Mask) -> RoverCoords {
    let (rows, cols) = mask.dim();
    let half_cols = cols as f64 / 2.0;

    let mut coords = RoverCoords::default();

    for ((row, col), _) in mask.indexed_iter().filter(|(_, &m)| m != 0) {
        coords.x.push(rows as f64 - row as f64);
        coords.y.push(-(col as f64 - half_cols));
    }

    coords
}

/// Convert a rover frame position into polar form.
pub fn to_polar(x: f64, y: f64) -> Polar {
    Polar {
        dist: x.hypot(y),
        angle_rad: y.atan2(x),
    }
}

/// Rotate a rover frame position by the rover's yaw, aligning it with the world axes.
pub fn rotate(x: f64, y: f64, yaw_deg: f64) -> (f64, f64) {
    let rotated = Rotation2::new(yaw_deg.to_radians()) * Vector2::new(x, y);
    (rotated.x, rotated.y)
}

/// Scale a rotated rover position down into world cells and offset it by the rover's position.
pub fn translate(rotated: &Vector2<f64>, position_m: &Vector2<f64>, scale: f64) -> Vector2<f64> {
    rotated / scale + position_m
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Floor a world coordinate and clip it into `[0, world_size - 1]`.
fn clip_index(value: f64, world_size: usize) -> usize {
    let max = world_size.saturating_sub(1) as f64;
    let floored = value.floor();

    // NaN falls through both comparisons and ends up at 0
    if floored >= max {
        max as usize
    } else if floored > 0.0 {
        floored as usize
    } else {
        0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
