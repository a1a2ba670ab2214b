//! # Cost volumes
//!
//! Dense `disparity × height × width` arrays of matching costs.

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A dense cost volume indexed by `(d, y, x)`.
///
/// Each disparity is stored as a contiguous row-major plane, so a plane can be handed to a
/// worker thread on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct CostVolume {
    max_disp: usize,
    width: usize,
    height: usize,
    data: Vec<f64>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CostVolume {
    /// Create a volume with every cell set to `fill`.
    pub fn filled(max_disp: usize, width: usize, height: usize, fill: f64) -> Self {
        Self {
            max_disp,
            width,
            height,
            data: vec![fill; max_disp * width * height]
        }
    }

    /// Create a volume by evaluating `f(d, x, y)` for every cell.
    pub fn from_fn<F>(max_disp: usize, width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> f64
    {
        let mut data = Vec::with_capacity(max_disp * width * height);
        for d in 0..max_disp {
            for y in 0..height {
                for x in 0..width {
                    data.push(f(d, x, y));
                }
            }
        }

        Self { max_disp, width, height, data }
    }

    pub fn max_disp(&self) -> usize {
        self.max_disp
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells in one disparity plane.
    pub fn plane_len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn get(&self, d: usize, x: usize, y: usize) -> f64 {
        self.data[(d * self.height + y) * self.width + x]
    }

    #[inline]
    pub fn put(&mut self, d: usize, x: usize, y: usize, val: f64) {
        self.data[(d * self.height + y) * self.width + x] = val;
    }

    /// The row-major plane of disparity `d`.
    pub fn plane(&self, d: usize) -> &[f64] {
        let n = self.plane_len();
        &self.data[d * n..(d + 1) * n]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Index of the smallest cost over all disparities at `(x, y)`.
    ///
    /// Scans disparities in ascending order and only replaces the current best on a strictly
    /// smaller cost, so ties resolve to the smallest disparity.
    pub fn argmin(&self, x: usize, y: usize) -> usize {
        (1..self.max_disp).fold(0, |best, d| {
            if self.get(d, x, y) < self.get(best, x, y) {
                d
            }
            else {
                best
            }
        })
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_plane_major() {
        let vol = CostVolume::from_fn(2, 3, 2, |d, x, y| (d * 100 + y * 10 + x) as f64);

        assert_eq!(vol.get(1, 2, 1), 112.0);
        assert_eq!(vol.plane(1)[0], 100.0);
        assert_eq!(vol.plane(0).len(), 6);
    }

    #[test]
    fn argmin_prefers_first_minimum() {
        let mut vol = CostVolume::filled(4, 1, 1, 1.0);
        vol.put(1, 0, 0, 0.25);
        vol.put(3, 0, 0, 0.25);

        assert_eq!(vol.argmin(0, 0), 1);
    }
}
