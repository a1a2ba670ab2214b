//! # Stereo frames
//!
//! Floating point colour images and the stereo frame pairing them.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::DynamicImage;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of channels in every image handled by this crate.
pub const CHANNELS: usize = 3;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A three channel image with `f64` samples stored row-major, channels interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    width: usize,
    height: usize,
    data: Vec<f64>
}

/// A rectified left/right image pair.
#[derive(Debug, Clone)]
pub struct StereoFrame {
    pub left: ColorImage,
    pub right: ColorImage
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl ColorImage {
    /// Create a black image of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height * CHANNELS]
        }
    }

    /// Wrap a raw interleaved buffer of `width * height * 3` samples.
    pub fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        let expected = width * height * CHANNELS;
        if data.len() != expected {
            return Err(Error::InvalidImageData {
                expected,
                actual: data.len()
            });
        }

        Ok(Self { width, height, data })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> [f64; CHANNELS]
    {
        let mut data = Vec::with_capacity(width * height * CHANNELS);

        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }

        Self { width, height, data }
    }

    /// Build an image from rows of single channel intensities, replicated into every channel.
    ///
    /// All rows must have the same length.
    pub fn from_gray_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);

        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Error::InvalidImageData {
                    expected: width * height * CHANNELS,
                    actual: row.len() * height * CHANNELS
                });
            }
            for &v in row {
                data.extend_from_slice(&[v; CHANNELS]);
            }
        }

        Ok(Self { width, height, data })
    }

    /// Converts a dynamic image into a floating point colour image.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);

        let data = rgb
            .into_raw()
            .into_iter()
            .map(|v| v as f64)
            .collect();

        Self { width, height, data }
    }

    /// Load an image from disk.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?;
        Ok(Self::from_dynamic(&img))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get all channels of the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[f64] {
        let i = (y * self.width + x) * CHANNELS;
        &self.data[i..i + CHANNELS]
    }

    /// Get a single channel of the pixel at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> f64 {
        self.data[(y * self.width + x) * CHANNELS + c]
    }

    pub fn put(&mut self, x: usize, y: usize, val: [f64; CHANNELS]) {
        let i = (y * self.width + x) * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&val);
    }

    /// Maximum over channels of the absolute colour difference between two pixels.
    #[inline]
    pub fn color_diff(&self, a: (usize, usize), b: (usize, usize)) -> f64 {
        self.pixel(a.0, a.1)
            .iter()
            .zip(self.pixel(b.0, b.1))
            .fold(0.0, |acc, (p, q)| f64::max(acc, (p - q).abs()))
    }
}

impl StereoFrame {
    pub fn new(left: ColorImage, right: ColorImage) -> Self {
        Self { left, right }
    }

    pub fn width(&self) -> usize {
        self.left.width()
    }

    pub fn height(&self) -> usize {
        self.left.height()
    }

    /// Check that both images share the same non-empty shape.
    pub fn check_shape(&self) -> Result<()> {
        let left = (self.left.width(), self.left.height());
        let right = (self.right.width(), self.right.height());

        if left != right {
            return Err(Error::ShapeMismatch { left, right });
        }
        if left.0 == 0 || left.1 == 0 {
            return Err(Error::EmptyImage);
        }

        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
