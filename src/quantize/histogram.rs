use super::Bounds;
use crate::{SIG_BITS, Sample};
use alloc::boxed::Box;

/// A dense count table over reduced precision RGB space.
///
/// Each color channel keeps only its top [`significant_bits`](Histogram::significant_bits),
/// so the table has `(2^bits)^3` cells (32768 for the default [`SIG_BITS`]).
/// The cell for a reduced color `(r, g, b)` has the index `r << (2 * bits) | g << bits | b`.
///
/// A [`Histogram`] is built in a single pass over its input and never changes afterwards.
/// Ignored [`Sample`]s are not counted.
///
/// # Examples
///
/// ```
/// use mmcq::{Sample, quantize::Histogram};
///
/// let samples = [
///     Sample::new(255, 0, 0),
///     Sample::new(250, 3, 1),
///     Sample::ignored([255, 255, 255]),
/// ];
/// let hist = Histogram::from_samples(samples);
/// assert_eq!(hist.total(), 2);
/// // both reds land in the same cell
/// assert_eq!(hist.get([31, 0, 0]), 2);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Histogram {
    /// The cell counts in index order.
    bins: Box<[u64]>,
    /// The number of bits kept per channel.
    bits: u8,
    /// The sum of all cells.
    total: u64,
}

impl Histogram {
    /// Create a new, empty [`Histogram`] keeping `bits` bits per channel.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not in the range `1..=8`.
    pub(crate) fn new(bits: u8) -> Self {
        assert!(
            (1..=8).contains(&bits),
            "significant bits must be in the range 1..=8, got {bits}"
        );
        Self {
            bins: bytemuck::zeroed_slice_box(1 << (3 * u32::from(bits))),
            bits,
            total: 0,
        }
    }

    /// Build a [`Histogram`] from the given samples using [`SIG_BITS`] bits per channel.
    ///
    /// The samples are consumed exactly once, in order.
    #[must_use]
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self::with_bits(samples, SIG_BITS)
    }

    /// Build a [`Histogram`] from the given samples keeping `bits` bits per channel.
    pub(crate) fn with_bits(samples: impl IntoIterator<Item = Sample>, bits: u8) -> Self {
        let mut hist = Self::new(bits);
        hist.add_samples(samples);
        hist
    }

    /// Count the non-ignored samples.
    fn add_samples(&mut self, samples: impl IntoIterator<Item = Sample>) {
        for sample in samples {
            if sample.is_ignored() {
                continue;
            }
            let index = self.index(self.bin(sample.components()));
            self.bins[index] += 1;
            self.total += 1;
        }
    }

    /// Returns the reduced color (histogram coordinates) of a full precision color.
    #[inline]
    pub fn bin(&self, [r, g, b]: [u8; 3]) -> [u8; 3] {
        let shift = 8 - self.bits;
        [r >> shift, g >> shift, b >> shift]
    }

    /// Returns the cell index of a reduced color.
    #[inline]
    pub(crate) fn index(&self, [r, g, b]: [u8; 3]) -> usize {
        let bits = u32::from(self.bits);
        (usize::from(r) << (2 * bits)) | (usize::from(g) << bits) | usize::from(b)
    }

    /// Returns the reduced color of a cell index.
    #[inline]
    fn coordinates(&self, index: usize) -> [u8; 3] {
        let bits = u32::from(self.bits);
        let mask = (1 << bits) - 1;
        #[allow(clippy::cast_possible_truncation)] // each value is masked to at most 8 bits
        [
            (index >> (2 * bits)) as u8,
            ((index >> bits) & mask) as u8,
            (index & mask) as u8,
        ]
    }

    /// Returns the count of the cell at the given reduced color.
    ///
    /// # Panics
    ///
    /// Panics if any component is greater than [`max_coordinate`](Histogram::max_coordinate).
    #[must_use]
    #[inline]
    pub fn get(&self, reduced: [u8; 3]) -> u64 {
        assert!(
            reduced.iter().all(|&c| c <= self.max_coordinate()),
            "histogram coordinates out of range"
        );
        self.count(reduced)
    }

    /// Returns the count of the cell at the given reduced color without checking each component.
    ///
    /// Callers iterating over validated [`Bounds`] use this in their inner loops.
    #[inline]
    pub(crate) fn count(&self, reduced: [u8; 3]) -> u64 {
        self.bins[self.index(reduced)]
    }

    /// Returns the number of bits kept per channel.
    #[inline]
    pub fn significant_bits(&self) -> u8 {
        self.bits
    }

    /// Returns the largest valid coordinate along each axis, which is `2^bits - 1`.
    #[inline]
    pub fn max_coordinate(&self) -> u8 {
        #[allow(clippy::cast_possible_truncation)] // bits <= 8
        {
            ((1u16 << self.bits) - 1) as u8
        }
    }

    /// Returns the width of one cell in full precision channel units, which is `2^(8 - bits)`.
    #[inline]
    pub(crate) fn cell_width(&self) -> u32 {
        1 << (8 - self.bits)
    }

    /// Returns the number of counted samples, i.e. the sum of all cells.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns whether no samples were counted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Returns a flat slice of the histogram cells in index order.
    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.bins
    }

    /// Returns the smallest [`Bounds`] containing every non-empty cell,
    /// or `None` if the histogram is empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let mut populated = self
            .bins
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(index, _)| self.coordinates(index));

        let first = populated.next()?;
        let (min, max) = populated.fold((first, first), |(mut min, mut max), coords| {
            for ((lo, hi), c) in min.iter_mut().zip(&mut max).zip(coords) {
                *lo = (*lo).min(c);
                *hi = (*hi).max(c);
            }
            (min, max)
        });

        Some(Bounds { min, max })
    }
}

impl core::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Histogram")
            .field("bits", &self.bits)
            .field("total", &self.total)
            .field("populated", &self.bins.iter().filter(|&&c| c > 0).count())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "threads")]
mod parallel {
    use super::Histogram;
    use crate::{
        Bitmap, SIG_BITS, Sample,
        sampling::{self, Sampler},
    };
    use rayon::prelude::*;

    impl Histogram {
        /// Merge two histograms of the same resolution by summing their cells.
        #[allow(clippy::needless_pass_by_value)]
        pub(crate) fn merge_partial(mut a: Self, b: Self) -> Self {
            debug_assert_eq!(a.bits, b.bits);
            for (a, &b) in a.bins.iter_mut().zip(b.bins.iter()) {
                *a += b;
            }
            a.total += b.total;
            a
        }

        /// Return the per thread chunk size based on the length.
        fn chunk_size(len: usize) -> usize {
            let cells = 1 << (3 * u32::from(SIG_BITS));
            let chunk_size = len.div_ceil(rayon::current_num_threads()).max(cells * 4);
            let num_chunks = len.div_ceil(chunk_size);
            len.div_ceil(num_chunks.max(1)).max(1)
        }

        /// Returns the number of sampled rows each thread should count from a bitmap.
        fn rows_per_chunk(bitmap: Bitmap<'_>, quality: u8) -> u32 {
            let quality = u32::from(sampling::normalize_quality(quality));
            let per_row = bitmap.width().div_ceil(quality).max(1) as usize;
            let rows = bitmap.height().div_ceil(quality) as usize;
            let cells = 1 << (3 * u32::from(SIG_BITS));
            let rows_per_chunk = rows
                .div_ceil(rayon::current_num_threads())
                .max((cells * 4).div_ceil(per_row))
                .max(1);
            u32::try_from(rows_per_chunk).unwrap_or(u32::MAX)
        }

        /// Sample `bitmap` and count the samples in parallel, splitting the work by rows.
        ///
        /// The result is identical to [`Histogram::from_samples`] over a [`Sampler`]
        /// with the same options. Samples are counted as they are read and never collected.
        #[must_use]
        pub fn from_bitmap_par(bitmap: Bitmap<'_>, quality: u8, ignore_white: bool) -> Self {
            let rows = Self::rows_per_chunk(bitmap, quality);
            Self::from_samplers_par(Sampler::row_chunks(bitmap, quality, ignore_white, rows))
        }

        /// Count each sampler into its own histogram in parallel and sum the results.
        pub(crate) fn from_samplers_par(samplers: alloc::vec::Vec<Sampler<'_>>) -> Self {
            samplers
                .into_par_iter()
                .map(Self::from_samples)
                .reduce_with(Self::merge_partial)
                .unwrap_or_else(|| Self::new(SIG_BITS))
        }

        /// Build a [`Histogram`] from a slice of samples in parallel.
        ///
        /// The result is identical to [`Histogram::from_samples`] over the same samples.
        #[must_use]
        pub fn from_slice_par(samples: &[Sample]) -> Self {
            samples
                .par_chunks(Self::chunk_size(samples.len()))
                .map(|chunk| Self::from_samples(chunk.iter().copied()))
                .reduce_with(Self::merge_partial)
                .unwrap_or_else(|| Self::new(SIG_BITS))
        }
    }
}
