use super::{ColorBox, Histogram};
use crate::{FRACTION_BY_POPULATION, MAX_ITERATIONS, PaletteSize, Sample};
use alloc::{collections::BinaryHeap, vec::Vec};
use core::{cmp::Ordering, slice};

/// The key used to order boxes in the split queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Priority {
    /// Split the most populated box first.
    Population,
    /// Split the box with the largest population times volume first.
    PopulationVolume,
}

impl Priority {
    /// Returns the score of `cbox` under this priority. Larger scores are split first.
    fn score(self, cbox: &ColorBox<'_>) -> u128 {
        let population = u128::from(cbox.population());
        match self {
            Self::Population => population,
            Self::PopulationVolume => population * u128::from(cbox.volume()),
        }
    }
}

/// A box, its score, and the order in which it was created.
struct Ranked<'h> {
    /// The color box.
    cbox: ColorBox<'h>,
    /// The priority score of the box.
    score: u128,
    /// The creation order of the box, used to break ties in favor of older boxes.
    sequence: u64,
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl Eq for Ranked<'_> {}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

/// The live and exhausted boxes of one phase of splitting.
struct SplitQueue<'h> {
    /// The boxes that may still be split, best candidate first.
    heap: BinaryHeap<Ranked<'h>>,
    /// The boxes that were found to be unsplittable.
    exhausted: Vec<Ranked<'h>>,
    /// The key used to order `heap`.
    priority: Priority,
}

impl<'h> SplitQueue<'h> {
    fn new(priority: Priority) -> Self {
        Self { heap: BinaryHeap::new(), exhausted: Vec::new(), priority }
    }

    /// Returns the total number of boxes held.
    fn len(&self) -> usize {
        self.heap.len() + self.exhausted.len()
    }

    fn rank(&self, cbox: ColorBox<'h>, sequence: u64) -> Ranked<'h> {
        Ranked { score: self.priority.score(&cbox), cbox, sequence }
    }

    fn push(&mut self, cbox: ColorBox<'h>, sequence: u64) {
        let ranked = self.rank(cbox, sequence);
        self.heap.push(ranked);
    }

    fn push_exhausted(&mut self, cbox: ColorBox<'h>, sequence: u64) {
        let ranked = self.rank(cbox, sequence);
        self.exhausted.push(ranked);
    }

    /// Move every box into a new queue ordered by `priority`, keeping track of which boxes
    /// are already known to be unsplittable.
    fn reprioritize(self, priority: Priority) -> Self {
        let mut queue = Self::new(priority);
        for Ranked { cbox, sequence, .. } in self.heap {
            queue.push(cbox, sequence);
        }
        for Ranked { cbox, sequence, .. } in self.exhausted {
            queue.push_exhausted(cbox, sequence);
        }
        queue
    }

    /// Returns all boxes in descending priority order.
    fn into_sorted(self) -> Vec<ColorBox<'h>> {
        let mut boxes = self.heap.into_vec();
        boxes.extend(self.exhausted);
        boxes.sort_unstable_by(|a, b| b.cmp(a));
        boxes.into_iter().map(|ranked| ranked.cbox).collect()
    }
}

/// The median cut splitting loop over a [`Histogram`].
///
/// The histogram is built once and can then be quantized any number of times
/// with different target sizes.
///
/// Quantization runs in two phases. The first phase repeatedly splits the most populated box
/// until [`FRACTION_BY_POPULATION`] of the target number of boxes exist. The second phase
/// splits the box with the largest population times volume until the target is reached.
/// Boxes that cannot be split are set aside, so fewer boxes than requested are returned
/// for inputs with few distinct colors.
///
/// # Examples
///
/// ```
/// use mmcq::{PaletteSize, Sample, quantize::MedianCut};
/// use palette::Srgb;
///
/// let samples = (0..50)
///     .map(|_| Sample::new(0, 0, 0))
///     .chain((0..50).map(|_| Sample::new(255, 255, 255)));
///
/// let median_cut = MedianCut::new(samples);
/// let clusters = median_cut.quantize(PaletteSize::DEFAULT);
///
/// // only two distinct colors, so only two boxes
/// assert_eq!(clusters.len(), 2);
/// let averages = clusters.iter().map(|cbox| cbox.average()).collect::<Vec<_>>();
/// assert_eq!(averages, [Srgb::new(252, 252, 252), Srgb::new(4, 4, 4)]);
/// ```
#[derive(Debug, Clone)]
pub struct MedianCut {
    /// The histogram of the input samples.
    hist: Histogram,
}

impl MedianCut {
    /// Build the histogram of the given samples, skipping ignored ones.
    #[must_use]
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self::from_histogram(Histogram::from_samples(samples))
    }

    /// Create a new [`MedianCut`] over an existing [`Histogram`].
    #[must_use]
    #[inline]
    pub fn from_histogram(hist: Histogram) -> Self {
        Self { hist }
    }

    /// Returns the histogram being quantized.
    #[inline]
    pub fn histogram(&self) -> &Histogram {
        &self.hist
    }

    /// Consume the [`MedianCut`] and return its [`Histogram`].
    #[inline]
    pub fn into_histogram(self) -> Histogram {
        self.hist
    }

    /// Split the histogram into at most `target` boxes.
    ///
    /// The returned boxes are ordered by descending population times volume.
    /// An empty histogram results in an empty [`ClusterSet`].
    #[must_use]
    pub fn quantize(&self, target: PaletteSize) -> ClusterSet<'_> {
        let Some(seed) = ColorBox::covering(&self.hist) else {
            log::debug!("median cut on an empty histogram");
            return ClusterSet::new();
        };

        let target = target.as_usize();
        let by_population = population_goal(target);

        log::debug!(
            "median cut of {} samples into {target} boxes, {by_population} by population",
            self.hist.total(),
        );

        let mut splitter = Splitter { next_sequence: 1 };

        let mut queue = SplitQueue::new(Priority::Population);
        queue.push(seed, 0);
        splitter.run(&mut queue, by_population);
        log::debug!("population phase ended with {} boxes", queue.len());

        let mut queue = queue.reprioritize(Priority::PopulationVolume);
        splitter.run(&mut queue, target);
        log::debug!("volume phase ended with {} boxes", queue.len());

        ClusterSet(queue.into_sorted())
    }
}

/// Returns the number of boxes to produce by population alone for a `target` number of boxes.
fn population_goal(target: usize) -> usize {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let goal = (FRACTION_BY_POPULATION * target as f64).ceil() as usize;
    goal
}

#[cfg(feature = "threads")]
impl MedianCut {
    /// Build the histogram of the given samples in parallel, skipping ignored ones.
    #[must_use]
    pub fn from_slice_par(samples: &[Sample]) -> Self {
        Self::from_histogram(Histogram::from_slice_par(samples))
    }
}

/// Hands out creation order numbers while splitting.
struct Splitter {
    /// The sequence number of the next box created.
    next_sequence: u64,
}

impl Splitter {
    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Split boxes from `queue` until it holds `goal` boxes or none can be split.
    fn run<'h>(&mut self, queue: &mut SplitQueue<'h>, goal: usize) {
        let mut iterations = 0;
        while queue.len() < goal {
            if iterations >= MAX_ITERATIONS {
                log::debug!("median cut stopped after {MAX_ITERATIONS} iterations");
                break;
            }
            iterations += 1;

            let Some(Ranked { cbox, sequence, .. }) = queue.heap.pop() else {
                break;
            };

            if let Some((lower, upper)) = cbox.split() {
                queue.push(lower, self.next_sequence());
                queue.push(upper, self.next_sequence());
            } else {
                queue.push_exhausted(cbox, sequence);
            }
        }
    }
}

/// The boxes produced by [`MedianCut::quantize`], in priority order.
#[derive(Debug, Clone, Default)]
pub struct ClusterSet<'h>(Vec<ColorBox<'h>>);

impl<'h> ClusterSet<'h> {
    /// Create a new, empty [`ClusterSet`].
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the number of boxes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no boxes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the boxes as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[ColorBox<'h>] {
        &self.0
    }

    /// Iterate over the boxes in order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, ColorBox<'h>> {
        self.0.iter()
    }

    /// Append a box to the end of the set.
    #[inline]
    pub fn push(&mut self, cbox: ColorBox<'h>) {
        self.0.push(cbox);
    }

    /// Returns the boxes as a [`Vec`].
    #[must_use]
    #[inline]
    pub fn into_vec(self) -> Vec<ColorBox<'h>> {
        self.0
    }
}

impl<'h> FromIterator<ColorBox<'h>> for ClusterSet<'h> {
    fn from_iter<I: IntoIterator<Item = ColorBox<'h>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'h> IntoIterator for ClusterSet<'h> {
    type Item = ColorBox<'h>;
    type IntoIter = alloc::vec::IntoIter<ColorBox<'h>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, 'h> IntoIterator for &'a ClusterSet<'h> {
    type Item = &'a ColorBox<'h>;
    type IntoIter = slice::Iter<'a, ColorBox<'h>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lightness, PaletteBuilder, quantize::Bounds, tests::*};
    use palette::Srgb;

    fn size(n: u16) -> PaletteSize {
        PaletteSize::try_from_u16(n).unwrap()
    }

    fn bounds(clusters: &ClusterSet<'_>) -> Vec<Bounds> {
        clusters.iter().map(ColorBox::bounds).collect()
    }

    #[test]
    fn solid_color() {
        let median_cut = MedianCut::new(solid([255, 0, 0], 100));
        let clusters = median_cut.quantize(size(5));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.as_slice()[0].average(), Srgb::new(252, 4, 4));
        assert_eq!(clusters.as_slice()[0].population(), 100);
    }

    #[test]
    fn two_colors() {
        let mut samples = solid([0, 0, 0], 50);
        samples.extend(solid([255, 255, 255], 50));
        let median_cut = MedianCut::new(samples);
        let clusters = median_cut.quantize(size(5));

        let colors = clusters.iter().map(ColorBox::average).collect::<Vec<_>>();
        assert_eq!(colors, [Srgb::new(252, 252, 252), Srgb::new(4, 4, 4)]);
        assert!(clusters.iter().all(|cbox| cbox.population() == 50));
    }

    #[test]
    fn single_box_is_weighted_average() {
        let samples = test_samples(3000);
        let median_cut = MedianCut::new(samples);
        let clusters = median_cut.quantize(PaletteSize::MIN);
        assert_eq!(clusters.len(), 1);

        let seed = ColorBox::covering(median_cut.histogram()).unwrap();
        assert_eq!(clusters.as_slice()[0].bounds(), seed.bounds());
        assert_eq!(clusters.as_slice()[0].average(), seed.average());
        assert_eq!(clusters.as_slice()[0].population(), 3000);
    }

    #[test]
    fn all_ignored() {
        let samples = solid([255, 255, 255], 20)
            .into_iter()
            .map(|s| Sample::ignored(s.components()));
        let median_cut = MedianCut::new(samples);
        assert!(median_cut.histogram().is_empty());
        assert!(median_cut.quantize(size(5)).is_empty());
    }

    #[test]
    fn reaches_target_on_varied_input() {
        let median_cut = MedianCut::new(test_samples(5000));
        for n in [1, 2, 5, 8, 16, 64] {
            assert_eq!(median_cut.quantize(size(n)).len(), usize::from(n));
        }
        assert!(median_cut.quantize(PaletteSize::MAX).len() <= 256);
    }

    #[test]
    fn population_is_conserved() {
        let mut samples = test_samples(4000);
        for sample in samples.iter_mut().step_by(7) {
            *sample = Sample::ignored(sample.components());
        }
        let median_cut = MedianCut::new(samples);
        let total = median_cut.histogram().total();

        for n in [3, 10, 100] {
            let clusters = median_cut.quantize(size(n));
            let sum = clusters.iter().map(|cbox| cbox.recomputed().population()).sum::<u64>();
            assert_eq!(sum, total);
        }
    }

    #[test]
    fn boxes_are_disjoint() {
        let median_cut = MedianCut::new(test_samples(2000));
        let clusters = median_cut.quantize(size(24));
        let boxes = bounds(&clusters);
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                let overlaps = (0..3).all(|c| a.min[c] <= b.max[c] && b.min[c] <= a.max[c]);
                assert!(!overlaps);
            }
        }
    }

    #[test]
    fn ordered_by_population_times_volume() {
        let median_cut = MedianCut::new(test_samples(2000));
        let clusters = median_cut.quantize(size(32));
        let scores = clusters
            .iter()
            .map(|cbox| Priority::PopulationVolume.score(cbox))
            .collect::<Vec<_>>();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn deterministic() {
        let samples = test_samples(3000);
        let a = MedianCut::new(samples.iter().copied());
        let b = MedianCut::new(samples);
        for n in [4, 17, 100, 256] {
            let first = PaletteBuilder::new(a.quantize(size(n)), Lightness::Yiq).into_vec();
            let second = PaletteBuilder::new(b.quantize(size(n)), Lightness::Yiq).into_vec();
            assert_eq!(first, second);
            // quantizing the same histogram again gives the same palette
            let again = PaletteBuilder::new(a.quantize(size(n)), Lightness::Yiq).into_vec();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn population_phase_goal_rounds_up() {
        assert_eq!(population_goal(1), 1);
        assert_eq!(population_goal(2), 2);
        assert_eq!(population_goal(4), 3);
        assert_eq!(population_goal(5), 4);
        assert_eq!(population_goal(8), 6);
        assert_eq!(population_goal(256), 192);
    }

    /// Samples along the red axis only, given as `(reduced red, count)` pairs.
    fn red_line(cells: &[(u8, usize)]) -> Vec<Sample> {
        cells
            .iter()
            .flat_map(|&(r, count)| solid([r * 8, 0, 0], count))
            .collect()
    }

    fn red(range: core::ops::RangeInclusive<u8>) -> Bounds {
        Bounds::from_ranges(range, 0..=0, 0..=0)
    }

    // A dense cluster at reds 0..=3 and a sparse one spread out to red 31.
    // The seed is cut at red 2, then red 0..=2 is cut at red 1. After that the most
    // populated box is red 0..=1, but red 3..=31 has the largest population times volume.
    fn dense_and_sparse() -> MedianCut {
        MedianCut::new(red_line(&[(0, 50), (1, 50), (2, 50), (3, 50), (20, 5), (31, 5)]))
    }

    #[test]
    fn second_phase_splits_by_population_times_volume() {
        let median_cut = dense_and_sparse();
        // 3 boxes by population, then 1 by population times volume
        let clusters = median_cut.quantize(size(4));
        assert_eq!(bounds(&clusters), [red(4..=31), red(0..=1), red(2..=2), red(3..=3)]);

        let populations = clusters.iter().map(ColorBox::population).collect::<Vec<_>>();
        assert_eq!(populations, [10, 100, 50, 50]);
    }

    #[test]
    fn first_phase_stops_at_rounded_up_fraction() {
        let median_cut = dense_and_sparse();
        // 4 boxes by population (red 0..=1 is split), then 1 by population times volume
        let clusters = median_cut.quantize(size(5));
        assert_eq!(
            bounds(&clusters),
            [red(4..=31), red(2..=2), red(0..=0), red(1..=1), red(3..=3)]
        );
    }

    #[test]
    fn ties_go_to_older_boxes() {
        let hist = Histogram::from_samples(test_samples(10));
        let rank = |sequence| Ranked {
            cbox: ColorBox::covering(&hist).unwrap(),
            score: 10,
            sequence,
        };
        assert!(rank(1) > rank(2));
        assert!(Ranked { score: 11, ..rank(5) } > rank(1));

        let mut heap = BinaryHeap::from([rank(3), rank(1), rank(2)]);
        assert_eq!(heap.pop().map(|r| r.sequence), Some(1));
    }
}
