//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;

use crate::error::*;
use crate::frame::StereoFrame;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A generic floating point disparity map.
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityMap {
    width: usize,
    height: usize,
    data: Vec<f32>,
    pub max_disp: Option<f32>,
    pub min_disp: Option<f32>
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    pub fn new(width: usize, height: usize) -> Self {
        let mut map = DisparityMap {
            width,
            height,
            data: vec![0.0; width * height],
            min_disp: None,
            max_disp: None
        };
        map.update_stats();
        map
    }

    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);

        let mut map = DisparityMap {
            width,
            height,
            data,
            min_disp: None,
            max_disp: None
        };
        map.update_stats();
        map
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Set the disparity at `(x, y)`, widening `min_disp`/`max_disp` to include it.
    ///
    /// Overwriting the current extreme value does not shrink the range, call `update_stats()`
    /// for exact bounds after such edits.
    pub fn put(&mut self, x: usize, y: usize, val: f32) {
        self.data[y * self.width + x] = val;

        self.min_disp = Some(self.min_disp.map_or(val, |m| m.min(val)));
        self.max_disp = Some(self.max_disp.map_or(val, |m| m.max(val)));
    }

    /// Row-major view of the map.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Recompute the observed minimum and maximum disparity.
    pub fn update_stats(&mut self) {
        let (min, max) = self.data.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v))
        );

        if self.data.is_empty() {
            self.min_disp = None;
            self.max_disp = None;
        }
        else {
            self.min_disp = Some(min);
            self.max_disp = Some(max);
        }
    }

    /// Converts the image into a dynamic Luma8 image.
    pub fn to_luma(&self) -> GrayImage {
        self.to_luma_scaled(1.0)
    }

    /// Converts the map into a Luma8 image, multiplying every disparity by `scale`.
    ///
    /// Small disparity ranges are usually scaled so that the full 8 bit range is used, e.g. a
    /// scale of 16 for a 16 level search.
    pub fn to_luma_scaled(&self, scale: f32) -> GrayImage {

        let mut new = image::GrayImage::new(
            self.width as u32,
            self.height as u32
        );

        for y in 0..new.height() {
            for x in 0..new.width() {
                let mut val = self.get(x as usize, y as usize) * scale;

                if val < 0.0 {
                    val = 0.0;
                }
                else if val > 255.0 {
                    val = 255.0;
                }

                *new.get_pixel_mut(x, y) = image::Luma([val as u8]);
            }
        }

        new
    }

    /// Converts the image to a normalised GrayImage.
    ///
    /// Normalises by the maximum observed disparity in the map. If the maximum disparity is not
    /// set, or is zero, then the function is equivalent to `.to_luma()`.
    pub fn to_luma_normalised(&self) -> GrayImage {
        let mult = match self.max_disp {
            Some(d) if d > 0.0 => 255.0 / d,
            _ => 1.0
        };

        self.to_luma_scaled(mult)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
