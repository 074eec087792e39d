//! Lazily reading [`Sample`]s out of a [`Bitmap`].
//!
//! Only a subset of the pixels is visited, controlled by a quality stride: rows `0, q, 2q, ...`
//! are read, and within those rows every `q`-th pixel. When a row ends part way through a stride,
//! the rest of the stride carries over to the start of the next sampled row.

use crate::{Bitmap, Sample};
use core::iter::FusedIterator;

/// The quality stride used when none, or zero, is given.
pub const DEFAULT_QUALITY: u8 = 10;

/// Pixels with an alpha value below this are ignored.
pub const MIN_ALPHA: u8 = 125;

/// Pixels with every color channel above this are considered white.
pub const WHITE_THRESHOLD: u8 = 250;

/// Returns the quality stride to use for the given `quality`, replacing `0` with [`DEFAULT_QUALITY`].
#[inline]
pub const fn normalize_quality(quality: u8) -> u8 {
    if quality == 0 { DEFAULT_QUALITY } else { quality }
}

/// Returns whether every channel of `rgb` is above [`WHITE_THRESHOLD`].
#[inline]
pub fn is_white(rgb: [u8; 3]) -> bool {
    rgb.iter().all(|&c| c > WHITE_THRESHOLD)
}

/// An iterator over a strided subset of the pixels of a [`Bitmap`].
///
/// Mostly transparent pixels (alpha below [`MIN_ALPHA`]) and, if enabled, near white pixels
/// (all channels above [`WHITE_THRESHOLD`]) are yielded as ignored [`Sample`]s.
///
/// # Examples
///
/// ```
/// # use mmcq::{Bitmap, ChannelLayout, CreateBitmapError, sampling::Sampler};
/// # fn main() -> Result<(), CreateBitmapError> {
/// let pixels = [
///     255, 255, 255, 255,
///     10, 20, 30, 255,
///     10, 20, 30, 0,
/// ];
/// let bitmap = Bitmap::new(&pixels, 3, 1, ChannelLayout::Rgba)?;
///
/// let flags = Sampler::new(bitmap, 1, true)
///     .map(|sample| sample.is_ignored())
///     .collect::<Vec<_>>();
/// assert_eq!(flags, [true, false, true]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Sampler<'a> {
    /// The pixels to sample.
    bitmap: Bitmap<'a>,
    /// The distance between sampled rows and between sampled pixels in a row.
    quality: u32,
    /// Whether to ignore near white pixels.
    ignore_white: bool,
    /// The current row.
    y: u32,
    /// The next column in the current row.
    x: u32,
    /// The first column of the next sampled row.
    next_row_start: u32,
    /// The row at which sampling stops.
    end: u32,
}

impl<'a> Sampler<'a> {
    /// Create a new [`Sampler`] over `bitmap`.
    ///
    /// A `quality` of `1` reads every pixel, while larger values skip pixels for speed.
    /// A `quality` of `0` is treated as [`DEFAULT_QUALITY`].
    #[must_use]
    pub fn new(bitmap: Bitmap<'a>, quality: u8, ignore_white: bool) -> Self {
        Self {
            bitmap,
            quality: u32::from(normalize_quality(quality)),
            ignore_white,
            y: 0,
            x: 0,
            next_row_start: 0,
            end: bitmap.height(),
        }
    }

    /// Returns the quality stride in use.
    #[inline]
    pub fn quality(&self) -> u8 {
        #[allow(clippy::cast_possible_truncation)] // constructed from a u8
        {
            self.quality as u8
        }
    }

    /// Convert the raw pixel bytes at `(x, y)` into a [`Sample`].
    fn sample_at(&self, x: u32, y: u32) -> Sample {
        let pixel = self.bitmap.pixel(x, y);
        let rgb = [pixel[0], pixel[1], pixel[2]];
        let transparent = self.bitmap.layout().has_alpha() && pixel[3] < MIN_ALPHA;
        let white = self.ignore_white && is_white(rgb);
        Sample::with_ignored(rgb, transparent || white)
    }
}

impl Iterator for Sampler<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        let width = self.bitmap.width();
        while self.y < self.end {
            if self.x < width {
                let x = self.x;
                let remaining = width - x;
                if remaining < self.quality {
                    self.next_row_start = self.quality - remaining;
                }
                self.x = x.saturating_add(self.quality);
                return Some(self.sample_at(x, self.y));
            }
            self.y = self.y.saturating_add(self.quality);
            self.x = self.next_row_start;
        }
        None
    }
}

impl FusedIterator for Sampler<'_> {}

/// Returns the first column sampled in the row after a row whose first sampled column is `start`.
///
/// Only the last pixel of a row can leave fewer than `quality` columns, and only then does the
/// offset change.
#[cfg(feature = "threads")]
fn next_row_start(width: u32, quality: u32, start: u32) -> u32 {
    if start >= width {
        return start;
    }
    let last = start + (width - 1 - start) / quality * quality;
    let remaining = width - last;
    if remaining < quality { quality - remaining } else { start }
}

#[cfg(feature = "threads")]
impl<'a> Sampler<'a> {
    /// Split the sampling of `bitmap` into consecutive runs of `rows_per_chunk` sampled rows.
    ///
    /// Chaining the returned samplers yields exactly the samples of [`Sampler::new`].
    /// Only row offsets are computed here, no pixels are read.
    pub(crate) fn row_chunks(
        bitmap: Bitmap<'a>,
        quality: u8,
        ignore_white: bool,
        rows_per_chunk: u32,
    ) -> alloc::vec::Vec<Self> {
        let whole = Self::new(bitmap, quality, ignore_white);
        let (width, height) = bitmap.dimensions();
        let quality = whole.quality;
        let rows_per_chunk = rows_per_chunk.max(1);
        let chunk_height = rows_per_chunk.saturating_mul(quality);

        let mut chunks = alloc::vec::Vec::new();
        let mut start = 0;
        let mut y = 0;
        let mut row = 0;
        while y < height {
            if row % rows_per_chunk == 0 {
                chunks.push(Self {
                    y,
                    x: start,
                    next_row_start: start,
                    end: y.saturating_add(chunk_height).min(height),
                    ..whole
                });
            }
            start = next_row_start(width, quality, start);
            y = y.saturating_add(quality);
            row += 1;
        }
        chunks
    }
}
