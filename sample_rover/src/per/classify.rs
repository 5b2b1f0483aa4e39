//! # Pixel Classification
//!
//! Colour threshold classifiers turning a rectified frame into binary masks.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use ndarray::{Array2, Zip};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A binary image, indexed `[row, col]`, holding 1 for pixels of the class and 0 otherwise.
pub type Mask = Array2<u8>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Complementary masks of navigable terrain and obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMasks {
    pub navigable: Mask,
    pub obstacle: Mask,
}

/// A colour in the 8-bit HSV convention: hue halved into [0, 180), saturation and value in
/// [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Split the image into navigable terrain, where all channels are strictly above the threshold,
/// and obstacles, everything else.
pub fn terrain_filter(img: &RgbImage, rgb_thresh: [u8; 3]) -> TerrainMasks {
    let navigable = mask_from_fn(img, |px| {
        px[0] > rgb_thresh[0] && px[1] > rgb_thresh[1] && px[2] > rgb_thresh[2]
    });

    let mut obstacle = Mask::zeros(navigable.raw_dim());
    Zip::from(&mut obstacle)
        .and(&navigable)
        .for_each(|o, &n| *o = 1 - n);

    TerrainMasks {
        navigable,
        obstacle,
    }
}

/// Mask of pixels whose HSV colour lies inside the inclusive box `[low, high]`.
pub fn sample_filter(img: &RgbImage, low: [u8; 3], high: [u8; 3]) -> Mask {
    mask_from_fn(img, |px| {
        let hsv = rgb_to_hsv(px);

        (low[0]..=high[0]).contains(&hsv.h)
            && (low[1]..=high[1]).contains(&hsv.s)
            && (low[2]..=high[2]).contains(&hsv.v)
    })
}

/// Convert an RGB pixel into 8-bit HSV.
pub fn rgb_to_hsv(px: &Rgb<u8>) -> Hsv {
    let r = px[0] as f64;
    let g = px[1] as f64;
    let b = px[2] as f64;

    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };

    if h < 0.0 {
        h += 360.0;
    }

    Hsv {
        h: (h / 2.0).round() as u8,
        s: s.round() as u8,
        v: v as u8,
    }
}

/// Scale a binary mask into a displayable 0/255 channel of the image.
pub fn paint_channel(img: &mut RgbImage, channel: usize, mask: &Mask) {
    for ((row, col), &m) in mask.indexed_iter() {
        img.get_pixel_mut(col as u32, row as u32)[channel] = m * 255;
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn mask_from_fn<F>(img: &RgbImage, pred: F) -> Mask
where
    F: Fn(&Rgb<u8>) -> bool,
{
    let (width, height) = img.dimensions();

    Mask::from_shape_fn((height as usize, width as usize), |(row, col)| {
        pred(img.get_pixel(col as u32, row as u32)) as u8
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_terrain_masks_are_complementary() {
        // Every combination of channels either side of the threshold
        let img = RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        });

        let masks = terrain_filter(&img, [160, 160, 160]);

        for (n, o) in masks.navigable.iter().zip(masks.obstacle.iter()) {
            assert_eq!(n + o, 1);
        }
    }

    #[test]
    fn test_terrain_threshold_is_strict() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([161, 161, 161]));
        img.put_pixel(1, 0, Rgb([160, 255, 255]));

        let masks = terrain_filter(&img, [160, 160, 160]);

        assert_eq!(masks.navigable[[0, 0]], 1);
        assert_eq!(masks.navigable[[0, 1]], 0);
        assert_eq!(masks.obstacle[[0, 1]], 1);
    }

    #[test]
    fn test_rgb_to_hsv() {
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), Hsv { h: 0, s: 0, v: 0 });
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), Hsv { h: 120, s: 255, v: 255 });
        // Sample yellow
        assert_eq!(rgb_to_hsv(&Rgb([200, 170, 0])), Hsv { h: 26, s: 255, v: 200 });
    }

    #[test]
    fn test_sample_filter() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([200, 170, 0]));
        // Too dark
        img.put_pixel(1, 0, Rgb([90, 76, 0]));
        // Bright terrain, not saturated
        img.put_pixel(2, 0, Rgb([200, 190, 170]));

        let mask = sample_filter(&img, [20, 100, 100], [30, 255, 255]);

        assert_eq!(mask.row(0).to_vec(), vec![1, 0, 0]);
    }

    #[test]
    fn test_paint_channel() {
        let mut img = RgbImage::new(2, 1);
        let mut mask = Mask::zeros((1, 2));
        mask[[0, 1]] = 1;

        paint_channel(&mut img, 2, &mask);

        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(1, 0), Rgb([0, 0, 255]));
    }
}
