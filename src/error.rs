//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Left image is {left:?} (w, h) but right image is {right:?} (w, h)")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize)
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An aggregation cell summed no costs. This is an internal defect in window growth or
    /// window intersection, never a user error.
    #[error("Aggregation window at (d = {d}, y = {y}, x = {x}) contained no cells")]
    EmptyAggregationWindow {
        d: usize,
        y: usize,
        x: usize
    },

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Expected {expected} samples in image buffer, got {actual}")]
    InvalidImageData {
        expected: usize,
        actual: usize
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse parameters: {0}")]
    Config(#[from] serde_json::Error)
}
