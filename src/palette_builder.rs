use crate::{
    Lightness, PaletteEntry,
    quantize::{ClusterSet, ColorBox},
};
use alloc::vec::Vec;
use core::{cell::OnceCell, iter::FusedIterator, slice};

/// Turns the boxes of a [`ClusterSet`] into [`PaletteEntry`]s.
///
/// Entries are produced in cluster set order, either lazily through [`PaletteBuilder::iter`]
/// or all at once through [`PaletteBuilder::palette_list`], which is computed once and cached.
///
/// # Examples
///
/// ```
/// use mmcq::{Lightness, PaletteBuilder, PaletteSize, Sample, quantize::MedianCut};
///
/// let samples = (0..10).map(|_| Sample::new(255, 0, 0));
/// let median_cut = MedianCut::new(samples);
/// let builder = PaletteBuilder::new(median_cut.quantize(PaletteSize::DEFAULT), Lightness::Yiq);
///
/// let first = builder.palette_list();
/// assert_eq!(first.len(), 1);
/// assert_eq!(first[0].to_hex(), "#FC0404");
/// assert_eq!(builder.iter().next(), Some(first[0]));
/// ```
#[derive(Debug, Clone)]
pub struct PaletteBuilder<'h> {
    /// The boxes to convert.
    clusters: ClusterSet<'h>,
    /// The strategy deciding whether each color is dark.
    lightness: Lightness,
    /// The cached result of [`PaletteBuilder::palette_list`].
    palette: OnceCell<Vec<PaletteEntry>>,
}

impl<'h> PaletteBuilder<'h> {
    /// Create a new [`PaletteBuilder`] over the given boxes.
    #[must_use]
    pub fn new(clusters: ClusterSet<'h>, lightness: Lightness) -> Self {
        Self { clusters, lightness, palette: OnceCell::new() }
    }

    /// Returns the boxes the palette is built from.
    #[inline]
    pub fn clusters(&self) -> &ClusterSet<'h> {
        &self.clusters
    }

    /// Returns the [`Lightness`] used to classify the palette colors.
    #[inline]
    pub fn lightness(&self) -> Lightness {
        self.lightness
    }

    /// Returns the number of palette entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns whether the palette has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Returns a lazy iterator over the palette entries.
    ///
    /// Each call starts again from the first box.
    #[inline]
    pub fn iter(&self) -> PaletteIter<'_, 'h> {
        PaletteIter { boxes: self.clusters.iter(), lightness: self.lightness }
    }

    /// Returns all palette entries.
    ///
    /// The entries are computed on the first call and the same slice is returned afterwards,
    /// until a box is added with [`PaletteBuilder::push`].
    pub fn palette_list(&self) -> &[PaletteEntry] {
        self.palette.get_or_init(|| self.iter().collect())
    }

    /// Append a box to the end of the palette, clearing any cached palette list.
    pub fn push(&mut self, cbox: ColorBox<'h>) {
        self.palette.take();
        self.clusters.push(cbox);
    }

    /// Consume the builder and return the palette entries.
    #[must_use]
    pub fn into_vec(self) -> Vec<PaletteEntry> {
        let Self { clusters, lightness, palette } = self;
        palette.into_inner().unwrap_or_else(|| {
            clusters.iter().map(|cbox| entry(cbox, lightness)).collect()
        })
    }
}

/// Returns the palette entry of a single box.
fn entry(cbox: &ColorBox<'_>, lightness: Lightness) -> PaletteEntry {
    PaletteEntry::new(cbox.average(), cbox.population(), lightness)
}

impl<'a, 'h> IntoIterator for &'a PaletteBuilder<'h> {
    type Item = PaletteEntry;
    type IntoIter = PaletteIter<'a, 'h>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A lazy iterator over the entries of a [`PaletteBuilder`].
///
/// Created by [`PaletteBuilder::iter`].
#[derive(Debug, Clone)]
pub struct PaletteIter<'a, 'h> {
    /// The boxes left to convert.
    boxes: slice::Iter<'a, ColorBox<'h>>,
    /// The strategy deciding whether each color is dark.
    lightness: Lightness,
}

impl Iterator for PaletteIter<'_, '_> {
    type Item = PaletteEntry;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.boxes.next().map(|cbox| entry(cbox, self.lightness))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.boxes.size_hint()
    }
}

impl ExactSizeIterator for PaletteIter<'_, '_> {}

impl FusedIterator for PaletteIter<'_, '_> {}
