use crate::Lightness;
use core::{
    fmt,
    num::{NonZeroU8, NonZeroU16},
};
use palette::{FromColor as _, Hsl, Srgb};
use thiserror::Error;

/// The error returned when an integer is not a valid [`PaletteSize`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("palette size must be between 1 and 256")]
pub struct PaletteSizeFromIntError(());

/// The number of colors requested from the median cut.
///
/// Always in `1..=256` ([`PaletteSize::MIN`] to [`PaletteSize::MAX`]). Images with few
/// distinct colors may produce fewer boxes, so this is an upper bound on the palette length.
///
/// Use the `try_from` conversions to reject out of range counts, or the `*_clamped`
/// constructors to pull them into range.
///
/// # Examples
///
/// ```
/// # use mmcq::{PaletteSize, PaletteSizeFromIntError};
/// # fn main() -> Result<(), PaletteSizeFromIntError> {
/// let size: PaletteSize = 8u16.try_into()?;
/// assert_eq!(size, 8u16);
/// assert_eq!(PaletteSize::try_from_u16(1024), None);
/// assert_eq!(PaletteSize::from_i32_clamped(-3), PaletteSize::MIN);
/// assert_eq!(PaletteSize::from_usize_clamped(1024), PaletteSize::MAX);
/// assert_eq!(PaletteSize::default(), 5u16);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(NonZeroU16);

impl PaletteSize {
    /// One color.
    pub const MIN: Self = Self(NonZeroU16::MIN);

    /// 256 colors, one more than fits in a `u8`.
    pub const MAX: Self = Self(NonZeroU16::new(256).unwrap());

    /// Five colors, used by [`Pipeline`](crate::Pipeline) unless set otherwise.
    pub const DEFAULT: Self = Self(NonZeroU16::new(5).unwrap());

    /// Returns the color count as a [`NonZeroU16`].
    #[inline]
    pub const fn as_nz_u16(&self) -> NonZeroU16 {
        self.0
    }

    /// Returns the color count as a `u16`.
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0.get()
    }

    /// Returns the color count as a `usize`.
    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0.get() as usize
    }

    /// Returns `Some` if `value` is in `1..=256`.
    #[must_use]
    #[inline]
    pub const fn try_from_u16(value: u16) -> Option<Self> {
        match NonZeroU16::new(value) {
            Some(count) if value <= Self::MAX.as_u16() => Some(Self(count)),
            _ => None,
        }
    }

    /// Returns `Some` if `value` is in `1..=256`.
    #[must_use]
    #[inline]
    pub const fn try_from_usize(value: usize) -> Option<Self> {
        if value > Self::MAX.as_usize() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)] // checked against MAX above
        Self::try_from_u16(value as u16)
    }

    /// Clamps `value` into `1..=256`.
    #[must_use]
    #[inline]
    pub const fn from_usize_clamped(value: usize) -> Self {
        match Self::try_from_usize(value) {
            Some(size) => size,
            None if value == 0 => Self::MIN,
            None => Self::MAX,
        }
    }

    /// Clamps `value` into `1..=256`, so zero and negative counts become [`PaletteSize::MIN`].
    #[must_use]
    #[inline]
    pub const fn from_i32_clamped(value: i32) -> Self {
        if value <= 0 {
            Self::MIN
        } else {
            #[allow(clippy::cast_sign_loss)]
            Self::from_usize_clamped(value as usize)
        }
    }

    /// Widens a nonzero `u8`, which is always in range.
    #[must_use]
    #[inline]
    pub const fn from_nz_u8(value: NonZeroU8) -> Self {
        match Self::try_from_u16(value.get() as u16) {
            Some(size) => size,
            None => Self::MIN,
        }
    }
}

impl Default for PaletteSize {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<PaletteSize> for u16 {
    #[inline]
    fn from(size: PaletteSize) -> Self {
        size.as_u16()
    }
}

impl From<PaletteSize> for usize {
    #[inline]
    fn from(size: PaletteSize) -> Self {
        size.as_usize()
    }
}

impl From<NonZeroU8> for PaletteSize {
    #[inline]
    fn from(value: NonZeroU8) -> Self {
        Self::from_nz_u8(value)
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = PaletteSizeFromIntError;

    #[inline]
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::try_from_u16(value).ok_or(PaletteSizeFromIntError(()))
    }
}

impl TryFrom<usize> for PaletteSize {
    type Error = PaletteSizeFromIntError;

    #[inline]
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::try_from_usize(value).ok_or(PaletteSizeFromIntError(()))
    }
}

impl PartialEq<u16> for PaletteSize {
    #[inline]
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == *other
    }
}

impl PartialEq<usize> for PaletteSize {
    #[inline]
    fn eq(&self, other: &usize) -> bool {
        self.as_usize() == *other
    }
}

impl fmt::Display for PaletteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// A single color of an extracted palette.
///
/// Each entry corresponds to one box of the median cut: the averaged color of the box,
/// the number of sampled pixels that fell inside it, and whether the color is dark according
/// to the [`Lightness`] strategy it was created with.
///
/// # Examples
///
/// ```
/// use mmcq::{Lightness, PaletteEntry};
/// use palette::Srgb;
///
/// let entry = PaletteEntry::new(Srgb::new(18, 52, 86), 40, Lightness::Yiq);
/// assert!(entry.is_dark());
/// assert_eq!(entry.to_hex(), "#123456");
/// assert_eq!(entry.to_string(), "#123456");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    /// The averaged color.
    color: Srgb<u8>,
    /// The number of samples represented by `color`.
    population: u64,
    /// Whether `color` is classified as dark.
    is_dark: bool,
}

impl PaletteEntry {
    /// Create a new [`PaletteEntry`], classifying `color` with the given [`Lightness`].
    #[must_use]
    #[inline]
    pub fn new(color: Srgb<u8>, population: u64, lightness: Lightness) -> Self {
        Self { color, population, is_dark: lightness.is_dark(color) }
    }

    /// Returns the averaged color of this entry.
    #[inline]
    pub fn color(&self) -> Srgb<u8> {
        self.color
    }

    /// Returns the number of samples represented by this entry.
    #[inline]
    pub fn population(&self) -> u64 {
        self.population
    }

    /// Returns whether the color of this entry is dark.
    #[inline]
    pub fn is_dark(&self) -> bool {
        self.is_dark
    }

    /// Returns the color as an upper case `#RRGGBB` hex string.
    #[must_use]
    pub fn to_hex(&self) -> alloc::string::String {
        alloc::format!("{self}")
    }

    /// Returns the color in the HSL color space.
    ///
    /// The hue is in degrees, while saturation and lightness are in the range `0.0..=1.0`.
    #[must_use]
    pub fn to_hsl(&self) -> Hsl {
        Hsl::from_color(self.color.into_format::<f32>())
    }
}

impl fmt::Display for PaletteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Srgb { red, green, blue, .. } = self.color;
        write!(f, "#{red:02X}{green:02X}{blue:02X}")
    }
}
