//! # Disparity Computation
//!
//! This crate provides dense disparity map computation for rectified stereo pairs using the
//! AD-Census cost with cross-based cost aggregation.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod adcensus;
mod disparity;
mod error;
mod frame;
mod volume;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::disparity::{DisparityAlgorithm, DisparityMap};
pub use crate::error::{Error, Result};
pub use crate::frame::{ColorImage, StereoFrame, CHANNELS};
pub use crate::volume::CostVolume;

pub mod prelude {
    pub use crate::adcensus::{AdCensus, BorderMode, Params};
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap};
    pub use crate::frame::{ColorImage, StereoFrame};
    pub use crate::volume::CostVolume;
}
