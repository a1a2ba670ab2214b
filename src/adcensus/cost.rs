//! # Matching cost computation
//!
//! Builds the absolute difference (AD) and census cost volumes and fuses them into a single
//! robustly normalised total cost.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use rayon::prelude::*;

use super::census::{hamming, CensusImage};
use crate::frame::{ColorImage, CHANNELS};
use crate::volume::CostVolume;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Mean over channels of `|left(x, y) - right(x - d, y)|`, infinite where `x < d`.
pub fn ad_volume(left: &ColorImage, right: &ColorImage, max_disp: usize) -> CostVolume {
    let (width, height) = (left.width(), left.height());

    build_planes(max_disp, width, height, |d, x, y| {
        let sum: f64 = left.pixel(x, y)
            .iter()
            .zip(right.pixel(x - d, y))
            .map(|(l, r)| (l - r).abs())
            .sum();

        sum / CHANNELS as f64
    })
}

/// Hamming distance between `left(x, y)` and `right(x - d, y)` signatures, infinite where
/// `x < d`.
pub fn census_volume(left: &CensusImage, right: &CensusImage, max_disp: usize) -> CostVolume {
    build_planes(max_disp, left.width(), left.height(), |d, x, y| {
        hamming(left, (x, y), right, (x - d, y)) as f64
    })
}

/// `1 - exp(-cost / lambda)`, mapping `[0, inf]` onto `[0, 1]`.
#[inline]
pub fn robust(cost: f64, lambda: f64) -> f64 {
    1.0 - (-cost / lambda).exp()
}

/// Sum of the robustly normalised census and AD costs.
///
/// Cells that are invalid in the raw volumes saturate to `1.0` per term, so the total is
/// `2.0` there, above every valid cell.
pub fn fuse(ad: &CostVolume, census: &CostVolume, lambda_ad: f64, lambda_census: f64)
    -> CostVolume
{
    let mut total = ad.clone();

    total.as_mut_slice()
        .par_iter_mut()
        .zip(census.as_slice().par_iter())
        .for_each(|(cell, &c)| {
            *cell = robust(c, lambda_census) + robust(*cell, lambda_ad);
        });

    total
}

/// Fill every valid `(d, x, y)` with `cost(d, x, y)` and every `x < d` cell with infinity,
/// one disparity plane per task.
fn build_planes<F>(max_disp: usize, width: usize, height: usize, cost: F) -> CostVolume
where
    F: Fn(usize, usize, usize) -> f64 + Sync
{
    let mut vol = CostVolume::filled(max_disp, width, height, f64::INFINITY);
    let plane_len = vol.plane_len();

    if plane_len == 0 {
        return vol;
    }

    vol.as_mut_slice()
        .par_chunks_mut(plane_len)
        .enumerate()
        .for_each(|(d, plane)| {
            for y in 0..height {
                for x in d..width {
                    plane[y * width + x] = cost(d, x, y);
                }
            }
        });

    vol
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
