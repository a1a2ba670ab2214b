//! Winner-take-all disparity selection.

use rayon::prelude::*;

use crate::disparity::DisparityMap;
use crate::volume::CostVolume;

/// Pick the disparity of minimum cost at every pixel, preferring the smallest disparity on ties.
pub fn winner_take_all(volume: &CostVolume) -> DisparityMap {
    let (width, height) = (volume.width(), volume.height());
    let mut data = vec![0.0f32; width * height];

    if width > 0 {
        data.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    *px = volume.argmin(x, y) as f32;
                }
            });
    }

    DisparityMap::from_raw(width, height, data)
}
