#[cfg(feature = "threads")]
use crate::quantize::Histogram;
use crate::{
    Bitmap, Lightness, PaletteBuilder, PaletteEntry, PaletteSize, Sample,
    quantize::{ClusterSet, MedianCut},
    sampling::{self, Sampler},
};
use alloc::vec::Vec;
use palette::Srgb;

/// A builder struct to specify palette extraction options.
///
/// # Examples
///
/// First, specify any options you want:
/// ```
/// # fn main() -> Result<(), mmcq::PaletteSizeFromIntError> {
/// use mmcq::{Lightness, LumaCoefficients, Pipeline};
///
/// let pipeline = Pipeline::new()
///     .color_count(8u16.try_into()?)
///     .quality(1)
///     .ignore_white(false)
///     .lightness(Lightness::Linear(LumaCoefficients::Bt709));
/// # Ok(())
/// # }
/// ```
///
/// Then, specify the input and the desired output:
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use mmcq::{Bitmap, ChannelLayout, Pipeline};
///
/// // 4x4 RGBA pixels, all opaque dark blue
/// let pixels = [20u8, 30, 120, 255].repeat(16);
/// let bitmap = Bitmap::new(&pixels, 4, 4, ChannelLayout::Rgba)?;
///
/// let palette = Pipeline::new().quality(1).input_bitmap(bitmap).palette();
/// assert_eq!(palette.len(), 1);
/// assert_eq!(palette[0].population(), 16);
/// assert!(palette[0].is_dark());
///
/// let dominant = Pipeline::new().quality(1).input_bitmap(bitmap).dominant_color();
/// assert_eq!(dominant, Some(palette[0]));
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    /// The number of colors to put in the palette.
    k: PaletteSize,
    /// The pixel stride used when sampling bitmaps.
    quality: u8,
    /// Whether to leave near white pixels out of the histogram.
    ignore_white: bool,
    /// The strategy deciding whether palette colors are dark.
    lightness: Lightness,
    #[cfg(feature = "threads")]
    /// Whether or not to sample bitmaps in parallel.
    parallel: bool,
}

impl Pipeline {
    /// Create a new [`Pipeline`] with default options.
    pub fn new() -> Self {
        Self {
            k: PaletteSize::DEFAULT,
            quality: sampling::DEFAULT_QUALITY,
            ignore_white: true,
            lightness: Lightness::Yiq,
            #[cfg(feature = "threads")]
            parallel: false,
        }
    }

    /// Sets the (maximum) number of colors to have in the palette.
    ///
    /// See the docs for [`PaletteSize`] for more information.
    ///
    /// The default color count is [`PaletteSize::DEFAULT`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use mmcq::{PaletteSize, PaletteSizeFromIntError, Pipeline};
    /// # fn main() -> Result<(), PaletteSizeFromIntError> {
    /// let pipeline = Pipeline::new()
    ///     .color_count(24u16.try_into()?)
    ///     .color_count(PaletteSize::from_i32_clamped(-1))
    ///     .color_count(PaletteSize::MAX);
    /// # Ok(())
    /// # }
    /// ```
    #[inline]
    pub fn color_count(mut self, size: PaletteSize) -> Self {
        self.k = size;
        self
    }

    /// Sets the sampling stride for bitmap input.
    ///
    /// `1` reads every pixel. Larger values are faster but more likely to miss colors.
    /// `0` is replaced by [`DEFAULT_QUALITY`](sampling::DEFAULT_QUALITY).
    ///
    /// The default value is [`DEFAULT_QUALITY`](sampling::DEFAULT_QUALITY).
    #[inline]
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = sampling::normalize_quality(quality);
        self
    }

    /// Sets whether or not to leave near white pixels out of the palette.
    ///
    /// The default value is `true`.
    #[inline]
    pub fn ignore_white(mut self, ignore_white: bool) -> Self {
        self.ignore_white = ignore_white;
        self
    }

    /// Sets the strategy used to decide whether palette colors are dark.
    ///
    /// The default value is [`Lightness::Yiq`].
    #[inline]
    pub fn lightness(mut self, lightness: Lightness) -> Self {
        self.lightness = lightness;
        self
    }

    #[cfg(feature = "threads")]
    /// Sets whether or not to sample and count [`Bitmap`] input in parallel across multiple threads.
    ///
    /// The rows of the bitmap are split between threads, each counting into its own histogram.
    /// Iterator input from [`Pipeline::input_samples`] is always counted on the calling thread;
    /// use [`MedianCut::from_slice_par`] for samples already in a slice.
    ///
    /// Use a [`rayon::ThreadPool`] to specify the number of threads if necessary.
    ///
    /// The default value is `false`.
    #[inline]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Specify a [`Bitmap`] as input.
    ///
    /// Pixels are read with a [`Sampler`] using the configured quality.
    #[inline]
    pub fn input_bitmap(self, bitmap: Bitmap<'_>) -> PipelineWithBitmapInput<'_> {
        PipelineWithBitmapInput { options: self, bitmap }
    }

    /// Specify already sampled pixels as input.
    ///
    /// Samples that are already flagged as ignored stay ignored. If enabled,
    /// near white samples are ignored as well.
    #[inline]
    pub fn input_samples<I>(self, samples: I) -> PipelineWithSampleInput<I>
    where
        I: IntoIterator<Item = Sample>,
    {
        PipelineWithSampleInput { options: self, samples }
    }

    /// Pair the options with a built histogram.
    fn with_median_cut(self, median_cut: MedianCut) -> PipelineWithHistogram {
        log::debug!(
            "histogram built from {} samples",
            median_cut.histogram().total()
        );
        PipelineWithHistogram { options: self, median_cut }
    }
}

impl Default for Pipeline {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Pipeline`] paired with a [`Bitmap`], ready to be computed into a palette.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineWithBitmapInput<'a> {
    /// The options to use when generating the palette.
    options: Pipeline,
    /// The input pixels.
    bitmap: Bitmap<'a>,
}

impl PipelineWithBitmapInput<'_> {
    /// Sample the bitmap and build its histogram.
    pub fn histogram(self) -> PipelineWithHistogram {
        let Self { options, bitmap } = self;
        log::debug!(
            "sampling {}x{} bitmap with quality {}",
            bitmap.width(),
            bitmap.height(),
            options.quality,
        );

        #[cfg(feature = "threads")]
        if options.parallel {
            let hist = Histogram::from_bitmap_par(bitmap, options.quality, options.ignore_white);
            return options.with_median_cut(MedianCut::from_histogram(hist));
        }

        let samples = Sampler::new(bitmap, options.quality, options.ignore_white);
        options.with_median_cut(MedianCut::new(samples))
    }

    /// Runs the pipeline and returns the palette entries.
    #[must_use]
    pub fn palette(self) -> Vec<PaletteEntry> {
        self.histogram().palette()
    }

    /// Runs the pipeline and returns the dominant color.
    ///
    /// See [`PipelineWithHistogram::dominant_color`] for more details.
    #[must_use]
    pub fn dominant_color(self) -> Option<PaletteEntry> {
        self.histogram().dominant_color()
    }
}

/// A [`Pipeline`] paired with an iterator of [`Sample`]s, ready to be computed into a palette.
#[must_use]
#[derive(Debug, Clone)]
pub struct PipelineWithSampleInput<I> {
    /// The options to use when generating the palette.
    options: Pipeline,
    /// The input samples.
    samples: I,
}

impl<I: IntoIterator<Item = Sample>> PipelineWithSampleInput<I> {
    /// Consume the samples and build their histogram.
    pub fn histogram(self) -> PipelineWithHistogram {
        let Self { options, samples } = self;
        let ignore_white = options.ignore_white;
        let samples = samples.into_iter().map(|sample| {
            let white = ignore_white && sampling::is_white(sample.components());
            Sample::with_ignored(sample.components(), sample.is_ignored() || white)
        });
        options.with_median_cut(MedianCut::new(samples))
    }

    /// Runs the pipeline and returns the palette entries.
    #[must_use]
    pub fn palette(self) -> Vec<PaletteEntry> {
        self.histogram().palette()
    }

    /// Runs the pipeline and returns the dominant color.
    ///
    /// See [`PipelineWithHistogram::dominant_color`] for more details.
    #[must_use]
    pub fn dominant_color(self) -> Option<PaletteEntry> {
        self.histogram().dominant_color()
    }
}

/// A [`Pipeline`] paired with the histogram of its input.
///
/// The histogram can be quantized any number of times.
#[must_use]
#[derive(Debug, Clone)]
pub struct PipelineWithHistogram {
    /// The options to use when generating the palette.
    options: Pipeline,
    /// The histogram of the input.
    median_cut: MedianCut,
}

impl PipelineWithHistogram {
    /// Returns the underlying [`MedianCut`].
    #[inline]
    pub fn median_cut(&self) -> &MedianCut {
        &self.median_cut
    }

    /// Split the histogram into at most the configured number of boxes.
    #[must_use]
    pub fn cluster_set(&self) -> ClusterSet<'_> {
        self.median_cut.quantize(self.options.k)
    }

    /// Returns a [`PaletteBuilder`] over the configured number of boxes.
    #[must_use]
    pub fn palette_builder(&self) -> PaletteBuilder<'_> {
        PaletteBuilder::new(self.cluster_set(), self.options.lightness)
    }

    /// Returns the palette entries, ordered by descending population times volume.
    #[must_use]
    pub fn palette(&self) -> Vec<PaletteEntry> {
        self.palette_builder().into_vec()
    }

    /// Returns a single color summarizing the input.
    ///
    /// The histogram is split into up to [`PaletteSize::MAX`] boxes. The result is the
    /// unweighted mean color of the boxes, with the mean box population.
    /// Both means are rounded down.
    ///
    /// Returns `None` if every sample was ignored.
    #[must_use]
    pub fn dominant_color(&self) -> Option<PaletteEntry> {
        let clusters = self.median_cut.quantize(PaletteSize::MAX);
        if clusters.is_empty() {
            return None;
        }

        let mut sums = [0u64; 3];
        let mut population = 0;
        for cbox in &clusters {
            let Srgb { red, green, blue, .. } = cbox.average();
            for (sum, c) in sums.iter_mut().zip([red, green, blue]) {
                *sum += u64::from(c);
            }
            population += cbox.population();
        }

        let n = clusters.len() as u64;
        #[allow(clippy::cast_possible_truncation)] // the mean of u8 values fits in a u8
        let [red, green, blue] = sums.map(|sum| (sum / n) as u8);
        Some(PaletteEntry::new(
            Srgb::new(red, green, blue),
            population / n,
            self.options.lightness,
        ))
    }
}
