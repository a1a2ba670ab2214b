//! # Cross-based cost aggregation
//!
//! Every valid cost is replaced by the mean of the costs inside the intersection of the left
//! pixel's support window and the matching right pixel's window. Passes are repeated according
//! to a [`Schedule`], each pass reading the previous volume and producing a new one.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fmt;

use rayon::prelude::*;

use super::window::WindowMap;
use crate::error::*;
use crate::volume::CostVolume;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Summation order of one aggregation pass.
///
/// Both orders cover the same cells, but floating point sums depend on the order they are
/// accumulated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Rows outer, columns inner.
    Horizontal,

    /// Columns outer, rows inner.
    Vertical
}

/// Progress of the cost volume through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    CostBuilt,
    Aggregated(Pass)
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// One aggregation pass, `round` counting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    pub round: usize,
    pub direction: Direction
}

/// Yields a horizontal then a vertical pass for each of `rounds` rounds.
#[derive(Debug, Clone)]
pub struct Schedule {
    rounds: usize,
    next: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Schedule {
    pub fn new(rounds: usize) -> Self {
        Self { rounds, next: 0 }
    }
}

impl Iterator for Schedule {
    type Item = Pass;

    fn next(&mut self) -> Option<Pass> {
        if self.next >= self.rounds * 2 {
            return None;
        }

        let pass = Pass {
            round: self.next / 2 + 1,
            direction: if self.next % 2 == 0 {
                Direction::Horizontal
            }
            else {
                Direction::Vertical
            }
        };
        self.next += 1;

        Some(pass)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.rounds * 2 - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Schedule {}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Horizontal => write!(f, "horizontal"),
            Direction::Vertical => write!(f, "vertical")
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Init => write!(f, "init"),
            Stage::CostBuilt => write!(f, "cost"),
            Stage::Aggregated(pass) => write!(f, "{} pass {}", pass.direction, pass.round)
        }
    }
}

impl Stage {
    /// The stage reached once the fused cost volume exists.
    pub fn cost_built(self) -> Stage {
        debug_assert_eq!(self, Stage::Init, "cost volume built twice");
        Stage::CostBuilt
    }

    /// The stage reached after running `pass` from this stage.
    pub fn after(self, pass: Pass) -> Stage {
        debug_assert!(self != Stage::Init, "aggregating before the cost volume is built");
        Stage::Aggregated(pass)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Run one aggregation pass over `prev`, returning the aggregated volume.
///
/// Cells with `x < d` are copied through. Fails with `EmptyAggregationWindow` if a valid cell
/// has no cells to average over, which indicates broken windows.
pub fn aggregate(
    left: &WindowMap,
    right: &WindowMap,
    prev: &CostVolume,
    direction: Direction
) -> Result<CostVolume> {
    let width = prev.width();
    let height = prev.height();
    let plane_len = prev.plane_len();

    let mut next = CostVolume::filled(prev.max_disp(), width, height, 0.0);
    if plane_len == 0 {
        return Ok(next);
    }

    next.as_mut_slice()
        .par_chunks_mut(plane_len)
        .enumerate()
        .try_for_each(|(d, plane)| -> Result<()> {
            let src = prev.plane(d);
            let di = d as isize;

            for y in 0..height {
                for x in 0..width {
                    let idx = y * width + x;
                    if x < d {
                        plane[idx] = src[idx];
                        continue;
                    }

                    let wl = left.get(x, y);
                    let wr = right.get(x - d, y);

                    let x0 = (wl.left.max(wr.left + di) + 1).max(0) as usize;
                    let x1 = wl.right.min(wr.right + di).min(width as isize).max(0) as usize;
                    let y0 = (wl.top.max(wr.top) + 1).max(0) as usize;
                    let y1 = wl.bottom.min(wr.bottom).min(height as isize).max(0) as usize;

                    let (sum, count) = window_sum(src, width, (x0, x1), (y0, y1), direction);
                    if count == 0 {
                        return Err(Error::EmptyAggregationWindow { d, y, x });
                    }

                    plane[idx] = sum / count as f64;
                }
            }

            Ok(())
        })?;

    Ok(next)
}

/// Sum and count of the plane cells in the given column and row ranges.
fn window_sum(
    plane: &[f64],
    width: usize,
    cols: (usize, usize),
    rows: (usize, usize),
    direction: Direction
) -> (f64, usize) {
    let mut sum = 0.0;
    let mut count = 0;

    match direction {
        Direction::Horizontal => {
            for y in rows.0..rows.1 {
                for x in cols.0..cols.1 {
                    sum += plane[y * width + x];
                    count += 1;
                }
            }
        }
        Direction::Vertical => {
            for x in cols.0..cols.1 {
                for y in rows.0..rows.1 {
                    sum += plane[y * width + x];
                    count += 1;
                }
            }
        }
    }

    (sum, count)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::adcensus::window::ArmLimits;
    use crate::frame::ColorImage;

    const LIMITS: ArmLimits = ArmLimits {
        tau1: 20.0,
        tau2: 6.0,
        l1: 34,
        l2: 17
    };

    fn textured(width: usize, height: usize) -> ColorImage {
        ColorImage::from_fn(width, height, |x, y| {
            let v = ((x * 47 + y * 83) % 200) as f64;
            [v, v, v]
        })
    }

    #[test]
    fn schedule_alternates_directions() {
        let passes: Vec<Pass> = Schedule::new(2).collect();

        assert_eq!(passes, vec![
            Pass { round: 1, direction: Direction::Horizontal },
            Pass { round: 1, direction: Direction::Vertical },
            Pass { round: 2, direction: Direction::Horizontal },
            Pass { round: 2, direction: Direction::Vertical },
        ]);
        assert_eq!(Schedule::new(0).len(), 0);
    }

    #[test]
    fn stage_transitions() {
        let pass = Pass { round: 1, direction: Direction::Vertical };
        assert_eq!(Stage::Init.cost_built(), Stage::CostBuilt);
        assert_eq!(Stage::CostBuilt.after(pass), Stage::Aggregated(pass));
        assert_eq!(Stage::Aggregated(pass).to_string(), "vertical pass 1");
    }

    #[test]
    fn constant_volume_is_unchanged() {
        let img = textured(9, 6);
        let windows = WindowMap::build(&img, &LIMITS);
        let vol = CostVolume::filled(3, 9, 6, 0.75);

        for &direction in &[Direction::Horizontal, Direction::Vertical] {
            let out = aggregate(&windows, &windows, &vol, direction).unwrap();
            for &c in out.as_slice() {
                assert_relative_eq!(c, 0.75);
            }
        }
    }

    #[test]
    fn invalid_cells_pass_through() {
        let img = textured(6, 4);
        let windows = WindowMap::build(&img, &LIMITS);
        let vol = CostVolume::from_fn(3, 6, 4, |d, x, y| {
            if x < d { 2.0 } else { (x + y) as f64 * 0.1 }
        });

        let out = aggregate(&windows, &windows, &vol, Direction::Horizontal).unwrap();

        assert_eq!(out.get(2, 0, 1), 2.0);
        assert_eq!(out.get(2, 1, 3), 2.0);
        assert_eq!(out.get(1, 0, 2), 2.0);
    }

    #[test]
    fn averages_never_read_invalid_cells() {
        // A flat image gives full-image windows, so the left edge of the intersection is the
        // only thing keeping invalid cells out.
        let img = ColorImage::from_fn(8, 3, |_, _| [30.0; 3]);
        let windows = WindowMap::build(&img, &LIMITS);
        let vol = CostVolume::from_fn(4, 8, 3, |d, x, _| {
            if x < d { f64::INFINITY } else { 0.5 }
        });

        let out = aggregate(&windows, &windows, &vol, Direction::Vertical).unwrap();

        for d in 0..4 {
            for x in d..8 {
                for y in 0..3 {
                    assert_relative_eq!(out.get(d, x, y), 0.5);
                }
            }
        }
    }

    #[test]
    fn mean_over_flat_window() {
        // One row, flat colour: every window spans the row, so d = 0 averages the whole row.
        let img = ColorImage::from_fn(4, 1, |_, _| [10.0; 3]);
        let windows = WindowMap::build(&img, &LIMITS);
        let vol = CostVolume::from_fn(1, 4, 1, |_, x, _| x as f64);

        let out = aggregate(&windows, &windows, &vol, Direction::Horizontal).unwrap();

        for x in 0..4 {
            assert_relative_eq!(out.get(0, x, 0), 1.5);
        }
    }

    #[test]
    fn directions_agree_up_to_rounding() {
        let img = textured(10, 7);
        let windows = WindowMap::build(&img, &LIMITS);
        let vol = CostVolume::from_fn(3, 10, 7, |d, x, y| {
            if x < d { 2.0 } else { ((x * 7 + y * 3 + d) % 11) as f64 / 11.0 }
        });

        let h = aggregate(&windows, &windows, &vol, Direction::Horizontal).unwrap();
        let v = aggregate(&windows, &windows, &vol, Direction::Vertical).unwrap();

        for (&a, &b) in h.as_slice().iter().zip(v.as_slice()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn broken_windows_are_reported() {
        let img = textured(3, 3);
        let good = WindowMap::build(&img, &LIMITS);
        let mut broken = good.clone();
        for w in broken.windows_mut() {
            w.right = w.left + 1;
        }
        let vol = CostVolume::filled(1, 3, 3, 1.0);

        let res = aggregate(&broken, &good, &vol, Direction::Horizontal);
        assert!(matches!(res, Err(Error::EmptyAggregationWindow { d: 0, .. })));
    }
}
