//! # Census signatures
//!
//! Every pixel gets a bit string recording, for each neighbour in a fixed window and each
//! channel, whether the neighbour is darker than the centre. Neighbours outside the image are
//! resolved by a [`BorderPolicy`].

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use rayon::prelude::*;

use crate::frame::{ColorImage, CHANNELS};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Entry emitted for a single (neighbour, channel) position of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CensusEntry {
    /// Result of `neighbour < centre`.
    Bit(bool),

    /// The shared out-of-bounds marker. Equal to itself, different from either bit.
    Sentinel
}

/// Every out-of-bounds position gets the same sentinel, in both images.
///
/// Two border pixels therefore always agree on their out-of-bounds entries, which drives
/// their census cost towards zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedSentinel;

/// Out-of-bounds neighbours are clamped to the nearest edge pixel and compared normally.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicateEdge;

/// Bit-packed census signatures of a whole image.
///
/// Each pixel owns `words_per_pixel` words in two planes: the comparison bits and a mask of
/// entries that are the border sentinel. Sentinel positions have a zero comparison bit.
#[derive(Debug, Clone)]
pub struct CensusImage {
    width: usize,
    height: usize,
    len: usize,
    words_per_pixel: usize,
    bits: Vec<u64>,
    sentinel: Vec<u64>
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// Decides the census entry for a neighbour lying outside the image.
pub trait BorderPolicy: Send + Sync {
    /// `(x, y)` is the centre pixel, `(nx, ny)` the out-of-bounds neighbour and `c` the channel.
    fn out_of_bounds(
        &self,
        image: &ColorImage,
        x: usize,
        y: usize,
        nx: isize,
        ny: isize,
        c: usize
    ) -> CensusEntry;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl BorderPolicy for SharedSentinel {
    fn out_of_bounds(&self, _: &ColorImage, _: usize, _: usize, _: isize, _: isize, _: usize)
        -> CensusEntry
    {
        CensusEntry::Sentinel
    }
}

impl BorderPolicy for ReplicateEdge {
    fn out_of_bounds(
        &self,
        image: &ColorImage,
        x: usize,
        y: usize,
        nx: isize,
        ny: isize,
        c: usize
    ) -> CensusEntry {
        let cx = nx.max(0).min(image.width() as isize - 1) as usize;
        let cy = ny.max(0).min(image.height() as isize - 1) as usize;

        CensusEntry::Bit(image.get(cx, cy, c) < image.get(x, y, c))
    }
}

impl CensusImage {
    /// Build the census signatures of `image` over a `window = (height, width)` neighbourhood.
    ///
    /// The window is centred on the pixel, so an even dimension is widened to the next odd one.
    pub fn build<P: BorderPolicy>(image: &ColorImage, window: (usize, usize), policy: &P)
        -> Self
    {
        let (width, height) = (image.width(), image.height());
        let half_h = (window.0 / 2) as isize;
        let half_w = (window.1 / 2) as isize;

        let len = (2 * half_h as usize + 1) * (2 * half_w as usize + 1) * CHANNELS;
        let words_per_pixel = (len + 63) / 64;
        let row_words = words_per_pixel * width;

        let mut bits = vec![0u64; row_words * height];
        let mut sentinel = vec![0u64; row_words * height];

        if row_words > 0 {
            bits.par_chunks_mut(row_words)
                .zip(sentinel.par_chunks_mut(row_words))
                .enumerate()
                .for_each(|(y, (bit_row, sentinel_row))| {
                    for x in 0..width {
                        let base = x * words_per_pixel;
                        let mut index = 0;

                        for i in -half_h..=half_h {
                            for j in -half_w..=half_w {
                                let ny = y as isize + i;
                                let nx = x as isize + j;
                                let inside = ny >= 0
                                    && ny < height as isize
                                    && nx >= 0
                                    && nx < width as isize;

                                for c in 0..CHANNELS {
                                    let entry = if inside {
                                        CensusEntry::Bit(
                                            image.get(nx as usize, ny as usize, c)
                                                < image.get(x, y, c)
                                        )
                                    }
                                    else {
                                        policy.out_of_bounds(image, x, y, nx, ny, c)
                                    };

                                    let word = base + index / 64;
                                    let mask = 1u64 << (index % 64);
                                    match entry {
                                        CensusEntry::Bit(true) => bit_row[word] |= mask,
                                        CensusEntry::Bit(false) => (),
                                        CensusEntry::Sentinel => sentinel_row[word] |= mask
                                    }

                                    index += 1;
                                }
                            }
                        }
                    }
                });
        }

        Self {
            width,
            height,
            len,
            words_per_pixel,
            bits,
            sentinel
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of entries in every signature of this image.
    pub fn signature_len(&self) -> usize {
        self.len
    }

    /// Entry `index` of the signature at `(x, y)`.
    pub fn entry(&self, x: usize, y: usize, index: usize) -> CensusEntry {
        let word = (y * self.width + x) * self.words_per_pixel + index / 64;
        let mask = 1u64 << (index % 64);

        if self.sentinel[word] & mask != 0 {
            CensusEntry::Sentinel
        }
        else {
            CensusEntry::Bit(self.bits[word] & mask != 0)
        }
    }

    fn words(&self, x: usize, y: usize) -> (&[u64], &[u64]) {
        let start = (y * self.width + x) * self.words_per_pixel;
        let end = start + self.words_per_pixel;
        (&self.bits[start..end], &self.sentinel[start..end])
    }
}

/// Number of differing entries between the signature of `a` at `a_pos` and of `b` at `b_pos`.
///
/// Sentinel entries match other sentinels and mismatch both comparison bits.
pub fn hamming(a: &CensusImage, a_pos: (usize, usize), b: &CensusImage, b_pos: (usize, usize))
    -> u32
{
    let (a_bits, a_sent) = a.words(a_pos.0, a_pos.1);
    let (b_bits, b_sent) = b.words(b_pos.0, b_pos.1);

    a_bits.iter()
        .zip(a_sent)
        .zip(b_bits.iter().zip(b_sent))
        .map(|((ab, asent), (bb, bsent))| {
            let bit_diff = (ab ^ bb) & !(asent | bsent);
            (bit_diff | (asent ^ bsent)).count_ones()
        })
        .sum()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
