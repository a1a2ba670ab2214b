//! # Cross-based support windows
//!
//! Each pixel grows four arms (up, down, left, right) while the colour along the arm stays
//! close to the anchor pixel. The arms bound the region its cost is averaged over.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use rayon::prelude::*;

use crate::frame::ColorImage;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Colour and length limits on arm growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmLimits {
    /// Colour threshold for every arm pixel.
    pub tau1: f64,
    /// Tighter colour threshold once an arm is `l2` long.
    pub tau2: f64,
    /// Hard cap on arm length (exclusive).
    pub l1: usize,
    /// Length from which `tau2` applies.
    pub l2: usize
}

/// Extents of a pixel's support window.
///
/// All four bounds are exclusive: they hold the first row or column that was not admitted, so
/// the window covers rows `top + 1 .. bottom` and columns `left + 1 .. right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportWindow {
    pub top: isize,
    pub bottom: isize,
    pub left: isize,
    pub right: isize
}

/// Support windows for every pixel of one image.
#[derive(Debug, Clone)]
pub struct WindowMap {
    width: usize,
    height: usize,
    windows: Vec<SupportWindow>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl SupportWindow {
    /// Number of pixels in the full rectangle spanned by the arms.
    pub fn area(&self) -> usize {
        ((self.bottom - self.top - 1) * (self.right - self.left - 1)) as usize
    }
}

impl WindowMap {
    /// Grow the support window of every pixel of `image`.
    pub fn build(image: &ColorImage, limits: &ArmLimits) -> Self {
        let (width, height) = (image.width(), image.height());
        let mut windows = vec![
            SupportWindow { top: 0, bottom: 0, left: 0, right: 0 };
            width * height
        ];

        if width > 0 {
            windows
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, win) in row.iter_mut().enumerate() {
                        let (xi, yi) = (x as isize, y as isize);

                        *win = SupportWindow {
                            top: yi - arm_length(image, limits, x, y, (0, -1)),
                            bottom: yi + arm_length(image, limits, x, y, (0, 1)),
                            left: xi - arm_length(image, limits, x, y, (-1, 0)),
                            right: xi + arm_length(image, limits, x, y, (1, 0))
                        };
                    }
                });
        }

        Self { width, height, windows }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &SupportWindow {
        &self.windows[y * self.width + x]
    }

    #[cfg(test)]
    pub(crate) fn windows_mut(&mut self) -> &mut [SupportWindow] {
        &mut self.windows
    }
}

/// Walk away from `(x, y)` in direction `step` and return the distance of the first pixel that
/// is not admitted.
fn arm_length(
    image: &ColorImage,
    limits: &ArmLimits,
    x: usize,
    y: usize,
    step: (isize, isize)
) -> isize {
    let mut k = 1;
    while admits(image, limits, (x, y), step, k) {
        k += 1;
    }
    k
}

/// Whether the pixel `k` steps from `p` along `step` may join the arm.
///
/// The adjacent pixel is always admitted when inside the image. Further pixels must be close
/// in colour to both `p` and the previous arm pixel, and respect the length limits.
fn admits(
    image: &ColorImage,
    limits: &ArmLimits,
    p: (usize, usize),
    step: (isize, isize),
    k: isize
) -> bool {
    let qx = p.0 as isize + step.0 * k;
    let qy = p.1 as isize + step.1 * k;

    if qx < 0 || qy < 0 || qx >= image.width() as isize || qy >= image.height() as isize {
        return false;
    }
    if k == 1 {
        return true;
    }

    let q = (qx as usize, qy as usize);
    let inner = ((qx - step.0) as usize, (qy - step.1) as usize);
    let dist = k as usize;

    let diff_pq = image.color_diff(p, q);
    if diff_pq >= limits.tau1 || image.color_diff(q, inner) >= limits.tau1 {
        return false;
    }
    if dist >= limits.l1 {
        return false;
    }
    if dist >= limits.l2 && diff_pq >= limits.tau2 {
        return false;
    }

    true
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
