use palette::{Srgb, cast};

/// A single pixel color fed into the quantizer.
///
/// Samples flagged as ignored (for example, near white or mostly transparent pixels)
/// are skipped when building a [`Histogram`](crate::quantize::Histogram).
///
/// # Examples
///
/// ```
/// use mmcq::Sample;
/// use palette::Srgb;
///
/// let kept = Sample::from(Srgb::new(12, 200, 40));
/// assert!(!kept.is_ignored());
///
/// let skipped = Sample::ignored([255, 255, 255]);
/// assert!(skipped.is_ignored());
/// assert_eq!(skipped.components(), [255, 255, 255]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sample {
    /// The red, green, and blue components.
    rgb: [u8; 3],
    /// Whether this sample should be left out of the histogram.
    ignored: bool,
}

impl Sample {
    /// Create a new, retained [`Sample`].
    #[must_use]
    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { rgb: [red, green, blue], ignored: false }
    }

    /// Create a new [`Sample`] that will be skipped by the histogram.
    #[must_use]
    #[inline]
    pub const fn ignored(rgb: [u8; 3]) -> Self {
        Self { rgb, ignored: true }
    }

    /// Create a new [`Sample`] with an explicit ignore flag.
    #[must_use]
    #[inline]
    pub const fn with_ignored(rgb: [u8; 3], ignored: bool) -> Self {
        Self { rgb, ignored }
    }

    /// Returns the red, green, and blue components.
    #[inline]
    pub const fn components(&self) -> [u8; 3] {
        self.rgb
    }

    /// Returns the sample as an [`Srgb`] color.
    #[inline]
    pub fn color(&self) -> Srgb<u8> {
        cast::from_array(self.rgb)
    }

    /// Returns whether this sample is skipped by the histogram.
    #[inline]
    pub const fn is_ignored(&self) -> bool {
        self.ignored
    }
}

impl From<[u8; 3]> for Sample {
    #[inline]
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Srgb<u8>> for Sample {
    #[inline]
    fn from(color: Srgb<u8>) -> Self {
        Self::from(cast::into_array(color))
    }
}
