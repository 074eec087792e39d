use palette::{LinSrgb, Srgb};

/// The weights applied to linear red, green, and blue to compute relative luminance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LumaCoefficients {
    /// ITU-R BT.601: `0.299 R + 0.587 G + 0.114 B`.
    Bt601,
    /// ITU-R BT.709 (sRGB primaries): `0.2126 R + 0.7152 G + 0.0722 B`.
    #[default]
    Bt709,
}

impl LumaCoefficients {
    /// Returns the red, green, and blue weights. They sum to `1.0`.
    #[inline]
    pub const fn weights(self) -> [f32; 3] {
        match self {
            Self::Bt601 => [0.299, 0.587, 0.114],
            Self::Bt709 => [0.2126, 0.7152, 0.0722],
        }
    }
}

/// The strategy used to decide whether a palette color is dark.
///
/// Each strategy maps a color to an integer luma and compares it against a fixed threshold.
///
/// # Examples
///
/// ```
/// use mmcq::{Lightness, LumaCoefficients};
/// use palette::Srgb;
///
/// let gray = Srgb::new(128, 128, 128);
///
/// assert_eq!(Lightness::Yiq.luma(gray), 128);
/// assert!(!Lightness::Yiq.is_dark(gray));
///
/// // mid gray is much darker in linear light
/// let linear = Lightness::Linear(LumaCoefficients::Bt709);
/// assert_eq!(linear.luma(gray), 216);
/// assert!(linear.is_dark(gray));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lightness {
    /// The YIQ formula on gamma encoded channels: `(299 R + 587 G + 114 B) / 1000`.
    ///
    /// The quotient is rounded to the nearest integer, with halves going to the even one.
    /// Luma is in `0..=255` and colors with a luma below `128` are dark.
    #[default]
    Yiq,
    /// Relative luminance of the linearized color using the given weights.
    ///
    /// Luma is scaled to `0..=1000` and colors with a luma below `428` are dark.
    Linear(LumaCoefficients),
}

impl Lightness {
    /// Returns the luma of `color` on the scale of this strategy.
    #[must_use]
    pub fn luma(self, color: Srgb<u8>) -> u32 {
        match self {
            Self::Yiq => {
                let Srgb { red, green, blue, .. } = color;
                let weighted = 299 * u32::from(red) + 587 * u32::from(green) + 114 * u32::from(blue);
                // halves round to the even neighbor
                let (quotient, remainder) = (weighted / 1000, weighted % 1000);
                if remainder > 500 || (remainder == 500 && quotient % 2 == 1) {
                    quotient + 1
                } else {
                    quotient
                }
            }
            Self::Linear(coefficients) => {
                let linear: LinSrgb = color.into_format::<f32>().into_linear();
                let LinSrgb { red, green, blue, .. } = linear;
                let [wr, wg, wb] = coefficients.weights();
                let luminance = wr * red + wg * green + wb * blue;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    (luminance * 1000.0).round().clamp(0.0, 1000.0) as u32
                }
            }
        }
    }

    /// Returns the luma below which a color counts as dark.
    #[inline]
    pub const fn threshold(self) -> u32 {
        match self {
            Self::Yiq => 128,
            Self::Linear(_) => 428,
        }
    }

    /// Returns whether `color` is dark.
    #[must_use]
    #[inline]
    pub fn is_dark(self, color: Srgb<u8>) -> bool {
        self.luma(color) < self.threshold()
    }
}
