use super::Histogram;
use alloc::{vec, vec::Vec};
use core::{cell::OnceCell, cmp::Reverse, fmt, ops::RangeInclusive};
use palette::Srgb;

/// An axis aligned box over the reduced color space of a [`Histogram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// The lower bin indices (inclusive).
    pub min: [u8; 3],
    /// The upper bin indices (inclusive).
    pub max: [u8; 3],
}

impl Bounds {
    /// Create new [`Bounds`] from an inclusive range of bin indices for each of red, green, and blue.
    #[must_use]
    #[inline]
    pub fn from_ranges(
        red: RangeInclusive<u8>,
        green: RangeInclusive<u8>,
        blue: RangeInclusive<u8>,
    ) -> Self {
        Self {
            min: [*red.start(), *green.start(), *blue.start()],
            max: [*red.end(), *green.end(), *blue.end()],
        }
    }

    /// Returns the number of bins spanned along `axis`.
    #[inline]
    fn extent(&self, axis: usize) -> u8 {
        self.max[axis] - self.min[axis]
    }

    /// Returns the number of bins inside the bounds.
    #[inline]
    pub fn volume(&self) -> u64 {
        (0..3).map(|axis| u64::from(self.extent(axis)) + 1).product()
    }

    /// Iterate over the reduced colors inside the bounds in histogram index order.
    fn cells(self) -> impl Iterator<Item = [u8; 3]> {
        let Self { min, max } = self;
        (min[0]..=max[0]).flat_map(move |r| {
            (min[1]..=max[1]).flat_map(move |g| (min[2]..=max[2]).map(move |b| [r, g, b]))
        })
    }
}

/// A box of similar colors produced by the median cut.
///
/// A [`ColorBox`] never changes once created. Its population and average color are computed
/// on first use and cached. Use [`ColorBox::recomputed`] to get an equivalent box with
/// empty caches.
#[derive(Clone)]
pub struct ColorBox<'h> {
    /// The histogram the box counts from.
    hist: &'h Histogram,
    /// The bin ranges covered by the box.
    bounds: Bounds,
    /// The number of samples inside the box.
    population: OnceCell<u64>,
    /// The population weighted average color of the box.
    average: OnceCell<Srgb<u8>>,
}

impl<'h> ColorBox<'h> {
    /// Create a new [`ColorBox`] over the given bounds of `hist`.
    ///
    /// # Panics
    ///
    /// Panics if a lower bound is greater than its upper bound or if an upper bound
    /// is past [`Histogram::max_coordinate`].
    #[must_use]
    pub fn from_bounds(hist: &'h Histogram, bounds: Bounds) -> Self {
        assert!(
            bounds.min.iter().zip(bounds.max).all(|(&lo, hi)| lo <= hi),
            "color box lower bounds must not exceed its upper bounds"
        );
        assert!(
            bounds.max.iter().all(|&hi| hi <= hist.max_coordinate()),
            "color box bounds are outside of the histogram"
        );
        Self::new_unchecked(hist, bounds, OnceCell::new())
    }

    /// Create a new [`ColorBox`] without checking the bounds.
    fn new_unchecked(hist: &'h Histogram, bounds: Bounds, population: OnceCell<u64>) -> Self {
        Self { hist, bounds, population, average: OnceCell::new() }
    }

    /// Create a new [`ColorBox`] spanning every populated cell of `hist`,
    /// or `None` if the histogram is empty.
    #[must_use]
    pub fn covering(hist: &'h Histogram) -> Option<Self> {
        hist.bounds().map(|bounds| Self::from_bounds(hist, bounds))
    }

    /// Returns a box with the same bounds whose population and average will be computed again.
    #[must_use]
    pub fn recomputed(&self) -> Self {
        Self::new_unchecked(self.hist, self.bounds, OnceCell::new())
    }

    /// Returns the bounds of the box.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Returns the histogram the box counts from.
    #[inline]
    pub fn histogram(&self) -> &'h Histogram {
        self.hist
    }

    /// Returns the number of histogram cells inside the box.
    #[inline]
    pub fn volume(&self) -> u64 {
        self.bounds.volume()
    }

    /// Returns the number of samples inside the box.
    pub fn population(&self) -> u64 {
        *self
            .population
            .get_or_init(|| self.bounds.cells().map(|cell| self.hist.count(cell)).sum())
    }

    /// Returns the average color of the samples inside the box.
    ///
    /// Each cell contributes the center of its full precision range, weighted by its count.
    /// An empty box returns the center of the box instead.
    pub fn average(&self) -> Srgb<u8> {
        *self.average.get_or_init(|| self.compute_average())
    }

    fn compute_average(&self) -> Srgb<u8> {
        let mult = u128::from(self.hist.cell_width());
        let population = u128::from(self.population());

        let channels = if population == 0 {
            let Bounds { min, max } = self.bounds;
            [0, 1, 2].map(|i| mult * (u128::from(min[i]) + u128::from(max[i]) + 1) / 2)
        } else {
            // sums of count * (2 * index + 1), i.e. twice the cell centers
            let mut sums = [0u128; 3];
            for cell in self.bounds.cells() {
                let count = u128::from(self.hist.count(cell));
                if count > 0 {
                    for (sum, c) in sums.iter_mut().zip(cell) {
                        *sum += count * (2 * u128::from(c) + 1);
                    }
                }
            }
            sums.map(|sum| sum * mult / (2 * population))
        };

        #[allow(clippy::cast_possible_truncation)] // cell centers are always below 256
        let [red, green, blue] = channels.map(|c| c as u8);
        Srgb::new(red, green, blue)
    }

    /// Returns the axes in the order they are tried for a split:
    /// widest first, with ties going to red, then green, then blue.
    fn split_axes(&self) -> [usize; 3] {
        let mut axes = [0, 1, 2];
        axes.sort_by_key(|&axis| Reverse(self.bounds.extent(axis)));
        axes
    }

    /// Returns the population of each slice of the box perpendicular to `axis`.
    fn slice_populations(&self, axis: usize) -> Vec<u64> {
        let min = self.bounds.min[axis];
        let mut slices = vec![0; usize::from(self.bounds.extent(axis)) + 1];
        for cell in self.bounds.cells() {
            slices[usize::from(cell[axis] - min)] += self.hist.count(cell);
        }
        slices
    }

    /// Cut the box in two along `axis` at the population median,
    /// returning `None` if all of the population lies in a single slice.
    fn split_along(&self, axis: usize, total: u64) -> Option<(Self, Self)> {
        if self.bounds.extent(axis) == 0 {
            return None;
        }

        let partial = self
            .slice_populations(axis)
            .into_iter()
            .scan(0, |sum, count| {
                *sum += count;
                Some(*sum)
            })
            .collect::<Vec<_>>();

        // the last partial sum is the total, so a median always exists
        let median = partial.iter().position(|&sum| 2 * sum >= total)?;
        let cut = if partial[median] < total {
            median
        } else if median > 0 && partial[median - 1] > 0 {
            median - 1
        } else {
            return None;
        };

        #[allow(clippy::cast_possible_truncation)] // cut < extent + 1 <= 256
        let cut_at = self.bounds.min[axis] + cut as u8;

        let mut lower = self.bounds;
        let mut upper = self.bounds;
        lower.max[axis] = cut_at;
        upper.min[axis] = cut_at + 1;

        let lower_population = partial[cut];
        let upper_population = total - lower_population;

        log::trace!(
            "split axis {axis} at {cut_at} into populations {lower_population} and {upper_population}"
        );

        Some((
            Self::new_unchecked(self.hist, lower, OnceCell::from(lower_population)),
            Self::new_unchecked(self.hist, upper, OnceCell::from(upper_population)),
        ))
    }

    /// Split the box in two at the median of its population.
    ///
    /// The widest axis is cut first. If all of the population lies in one slice along that axis,
    /// the next widest axis is tried instead. Both returned boxes are non-empty and their
    /// populations sum to the population of `self`.
    ///
    /// Returns `None` if the box is empty or no axis can be cut.
    #[must_use]
    pub fn split(&self) -> Option<(Self, Self)> {
        let total = self.population();
        if total == 0 {
            return None;
        }
        self.split_axes()
            .into_iter()
            .find_map(|axis| self.split_along(axis, total))
    }
}

impl fmt::Debug for ColorBox<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorBox")
            .field("bounds", &self.bounds)
            .field("population", &self.population.get())
            .field("average", &self.average.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SIG_BITS, Sample, tests::*};

    fn full(hist: &Histogram) -> ColorBox<'_> {
        let max = hist.max_coordinate();
        ColorBox::from_bounds(hist, Bounds { min: [0; 3], max: [max; 3] })
    }

    /// Population weighted centroid computed directly from the samples.
    fn centroid(hist: &Histogram, samples: &[Sample]) -> Srgb<u8> {
        let shift = 8 - hist.significant_bits();
        let mult = f64::from(hist.cell_width());
        let mut sums = [0.0; 3];
        for sample in samples {
            for (sum, c) in sums.iter_mut().zip(sample.components()) {
                *sum += (f64::from(c >> shift) + 0.5) * mult;
            }
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let [r, g, b] = sums.map(|sum| (sum / samples.len() as f64).floor() as u8);
        Srgb::new(r, g, b)
    }

    #[test]
    fn solid_color_average() {
        let hist = Histogram::from_samples(solid([255, 0, 0], 100));
        let cbox = full(&hist);
        assert_eq!(cbox.population(), 100);
        assert_eq!(cbox.average(), Srgb::new(252, 4, 4));
        assert!(cbox.split().is_none());
    }

    #[test]
    fn weighted_centroid() {
        let samples = test_samples(5000);
        let hist = Histogram::from_samples(samples.iter().copied());
        let cbox = ColorBox::covering(&hist).unwrap();
        assert_eq!(cbox.population(), 5000);
        assert_eq!(cbox.average(), centroid(&hist, &samples));
    }

    #[test]
    fn empty_box_midpoint() {
        let hist = Histogram::from_samples(solid([0, 0, 0], 3));
        let cbox = ColorBox::from_bounds(&hist, Bounds::from_ranges(10..=20, 0..=31, 31..=31));
        assert_eq!(cbox.population(), 0);
        // 8 * (10 + 20 + 1) / 2 = 124, 8 * 32 / 2 = 128, 8 * 63 / 2 = 252
        assert_eq!(cbox.average(), Srgb::new(124, 128, 252));
        assert!(cbox.split().is_none());
    }

    #[test]
    fn volume_is_pure() {
        let hist = Histogram::new(SIG_BITS);
        let cbox = ColorBox::from_bounds(&hist, Bounds::from_ranges(0..=3, 5..=5, 10..=19));
        assert_eq!(cbox.volume(), 4 * 10);
        assert_eq!(full(&hist).volume(), 32 * 32 * 32);
    }

    #[test]
    fn split_conserves_population() {
        let samples = test_samples(2000);
        let hist = Histogram::from_samples(samples);
        let mut boxes = vec![ColorBox::covering(&hist).unwrap()];
        for _ in 0..50 {
            let cbox = boxes.remove(0);
            let (a, b) = cbox.split().unwrap();

            let (a_fresh, b_fresh) = (a.recomputed(), b.recomputed());
            assert!(a_fresh.population() > 0);
            assert!(b_fresh.population() > 0);
            assert_eq!(a_fresh.population(), a.population());
            assert_eq!(b_fresh.population(), b.population());
            assert_eq!(a.population() + b.population(), cbox.recomputed().population());

            boxes.push(a);
            boxes.push(b);
        }
        assert_eq!(boxes.iter().map(ColorBox::population).sum::<u64>(), 2000);
    }

    #[test]
    fn split_children_partition_parent() {
        let hist = Histogram::from_samples(test_samples(500));
        let parent = ColorBox::covering(&hist).unwrap();
        let (lower, upper) = parent.split().unwrap();
        let (lower, upper, parent) = (lower.bounds(), upper.bounds(), parent.bounds());

        let axis = (0..3).find(|&i| lower.max[i] != parent.max[i]).unwrap();
        assert_eq!(lower.min, parent.min);
        assert_eq!(upper.max, parent.max);
        assert_eq!(lower.max[axis] + 1, upper.min[axis]);
        for other in (0..3).filter(|&i| i != axis) {
            assert_eq!(lower.max[other], parent.max[other]);
            assert_eq!(upper.min[other], parent.min[other]);
        }
    }

    #[test]
    fn widest_axis_first_with_red_winning_ties() {
        let hist = Histogram::from_samples([Sample::new(0, 0, 0), Sample::new(255, 255, 255)]);
        let (lower, upper) = ColorBox::covering(&hist).unwrap().split().unwrap();
        assert_eq!(lower.bounds(), Bounds::from_ranges(0..=0, 0..=31, 0..=31));
        assert_eq!(upper.bounds(), Bounds::from_ranges(1..=31, 0..=31, 0..=31));

        let hist = Histogram::from_samples([Sample::new(0, 0, 0), Sample::new(8, 255, 0)]);
        let (lower, upper) = ColorBox::covering(&hist).unwrap().split().unwrap();
        assert_eq!(lower.bounds(), Bounds::from_ranges(0..=1, 0..=0, 0..=0));
        assert_eq!(upper.bounds(), Bounds::from_ranges(0..=1, 1..=31, 0..=0));
    }

    #[test]
    fn median_nudged_down_when_upper_half_is_empty() {
        // slices along red: [1, 3] -> median lands on the last slice
        let mut samples = solid([0, 0, 0], 1);
        samples.extend(solid([8, 0, 0], 3));
        let hist = Histogram::from_samples(samples);
        let (lower, upper) = ColorBox::covering(&hist).unwrap().split().unwrap();
        assert_eq!(lower.bounds(), Bounds::from_ranges(0..=0, 0..=0, 0..=0));
        assert_eq!(upper.bounds(), Bounds::from_ranges(1..=1, 0..=0, 0..=0));
        assert_eq!((lower.population(), upper.population()), (1, 3));
    }

    #[test]
    fn falls_through_to_next_axis() {
        // red is widest but every sample has the same red bin
        let hist = Histogram::from_samples([
            Sample::new(0, 0, 0),
            Sample::new(0, 0, 16),
            Sample::new(255, 255, 255),
        ]);
        let cbox = ColorBox::from_bounds(&hist, Bounds::from_ranges(0..=31, 0..=0, 0..=2));
        assert_eq!(cbox.population(), 2);
        let (lower, upper) = cbox.split().unwrap();
        assert_eq!(lower.bounds(), Bounds::from_ranges(0..=31, 0..=0, 0..=0));
        assert_eq!(upper.bounds(), Bounds::from_ranges(0..=31, 0..=0, 1..=2));
    }

    #[test]
    fn unsplittable_boxes() {
        let hist = Histogram::from_samples(solid([100, 100, 100], 10));
        assert!(ColorBox::covering(&hist).unwrap().split().is_none());
        // a wide box whose population sits in one cell
        assert!(full(&hist).split().is_none());
    }

    #[test]
    #[should_panic(expected = "lower bounds")]
    fn inverted_bounds() {
        let hist = Histogram::new(SIG_BITS);
        let _ = ColorBox::from_bounds(&hist, Bounds { min: [3, 0, 0], max: [2, 0, 0] });
    }

    #[test]
    #[should_panic(expected = "outside of the histogram")]
    fn bounds_past_histogram() {
        let hist = Histogram::new(SIG_BITS);
        let _ = ColorBox::from_bounds(&hist, Bounds { min: [0; 3], max: [32, 0, 0] });
    }
}
