//! # Perspective Warp
//!
//! Rectifies the camera frame into a top-down view of the ground using a homography solved from
//! four calibration point pairs.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use super::PerError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Homogeneous scale below which a point is considered to be at infinity.
const MIN_HOMOGENEOUS_SCALE: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A fixed perspective warp between camera and ground images of the same size.
#[derive(Debug, Clone)]
pub struct PerspectiveWarp {
    /// Camera image to rectified image
    homography: Matrix3<f64>,

    /// Source coordinates for each rectified pixel, row major.
    ///
    /// `None` where the pixel maps to infinity.
    lut: Vec<Option<(f64, f64)>>,

    width: u32,
    height: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerspectiveWarp {
    /// Build the warp mapping each `src` point onto the matching `dst` point, for images of
    /// `width` by `height` pixels.
    pub fn new(
        src: [(f64, f64); 4],
        dst: [(f64, f64); 4],
        width: u32,
        height: u32,
    ) -> Result<Self, PerError> {
        let homography = solve_homography(&src, &dst)?;
        let inverse = homography
            .try_inverse()
            .ok_or(PerError::DegenerateCalibration)?;

        // The sampling positions never change, so compute them once
        let mut lut = Vec::with_capacity((width * height) as usize);
        for v in 0..height {
            for u in 0..width {
                lut.push(apply(&inverse, u as f64, v as f64));
            }
        }

        Ok(Self {
            homography,
            lut,
            width,
            height,
        })
    }

    /// Map a camera image point into the rectified image.
    pub fn transform_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        apply(&self.homography, x, y)
    }

    /// Rectify the frame, which must have the calibrated dimensions.
    ///
    /// Uses bilinear sampling. Rectified pixels which fall outside the camera frame are black.
    pub fn warp(&self, frame: &RgbImage) -> Result<RgbImage, PerError> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(PerError::FrameSizeMismatch {
                expected: (self.width, self.height),
                found: frame.dimensions(),
            });
        }

        let mut out = RgbImage::new(self.width, self.height);

        for (i, src) in self.lut.iter().enumerate() {
            let u = i as u32 % self.width;
            let v = i as u32 / self.width;

            if let Some((x, y)) = *src {
                out.put_pixel(u, v, bilinear_sample(frame, x, y));
            }
        }

        Ok(out)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Solve for the homography H (with H[2][2] = 1) such that `dst ~ H * src`.
///
/// Each correspondence gives two rows of an 8x8 linear system in the remaining coefficients.
fn solve_homography(
    src: &[(f64, f64); 4],
    dst: &[(f64, f64); 4],
) -> Result<Matrix3<f64>, PerError> {
    let mut a = DMatrix::<f64>::zeros(8, 8);
    let mut b = DVector::<f64>::zeros(8);

    for (i, (&(x, y), &(u, v))) in src.iter().zip(dst.iter()).enumerate() {
        let r = 2 * i;

        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -u * x;
        a[(r, 7)] = -u * y;
        b[r] = u;

        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -v * x;
        a[(r + 1, 7)] = -v * y;
        b[r + 1] = v;
    }

    let h = a.lu().solve(&b).ok_or(PerError::DegenerateCalibration)?;

    if h.iter().any(|c| !c.is_finite()) {
        return Err(PerError::DegenerateCalibration);
    }

    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}

fn apply(m: &Matrix3<f64>, x: f64, y: f64) -> Option<(f64, f64)> {
    let p = m * Vector3::new(x, y, 1.0);

    if p.z.abs() < MIN_HOMOGENEOUS_SCALE {
        None
    } else {
        Some((p.x / p.z, p.y / p.z))
    }
}

/// Sample the image at a fractional position, treating everything outside it as black.
fn bilinear_sample(img: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let corners = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1.0, y0, fx * (1.0 - fy)),
        (x0, y0 + 1.0, (1.0 - fx) * fy),
        (x0 + 1.0, y0 + 1.0, fx * fy),
    ];

    let mut acc = [0f64; 3];

    for &(cx, cy, w) in corners.iter() {
        if w == 0.0
            || cx < 0.0
            || cy < 0.0
            || cx >= img.width() as f64
            || cy >= img.height() as f64
        {
            continue;
        }

        let px = img.get_pixel(cx as u32, cy as u32);
        for c in 0..3 {
            acc[c] += w * px[c] as f64;
        }
    }

    Rgb([
        acc[0].round().min(255.0) as u8,
        acc[1].round().min(255.0) as u8,
        acc[2].round().min(255.0) as u8,
    ])
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
