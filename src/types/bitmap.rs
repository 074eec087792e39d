use crate::CreateBitmapError;

/// The byte layout of each pixel in a [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// Three bytes per pixel in red, green, blue order.
    Rgb,
    /// Four bytes per pixel in red, green, blue, alpha order.
    Rgba,
}

impl ChannelLayout {
    /// Returns the number of bytes per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Returns whether pixels of this layout carry an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }
}

/// A borrowed view of raw, already decoded pixel memory.
///
/// This type consists of a width, a height, a row stride in bytes, and a [`ChannelLayout`].
/// Rows are stored top to bottom and may be padded, in which case the stride is larger than
/// `width * layout.channels()`. Padding bytes are never read.
///
/// # Examples
///
/// ```
/// # use mmcq::{Bitmap, ChannelLayout, CreateBitmapError};
/// # fn main() -> Result<(), CreateBitmapError> {
/// // 2x2 RGBA pixels with 4 bytes of padding at the end of each row
/// let bytes = vec![0u8; 2 * 12];
/// let bitmap = Bitmap::with_stride(&bytes, 2, 2, 12, ChannelLayout::Rgba)?;
/// assert_eq!(bitmap.dimensions(), (2, 2));
///
/// assert!(Bitmap::new(&bytes[..5], 2, 2, ChannelLayout::Rgb).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap<'a> {
    /// The raw pixel bytes.
    bytes: &'a [u8],
    /// The width of the bitmap in pixels.
    width: u32,
    /// The height of the bitmap in pixels.
    height: u32,
    /// The number of bytes between the start of two consecutive rows.
    stride: usize,
    /// The pixel format.
    layout: ChannelLayout,
}

impl<'a> Bitmap<'a> {
    /// Create a new [`Bitmap`] with tightly packed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is too short for the given dimensions.
    #[inline]
    pub fn new(
        bytes: &'a [u8],
        width: u32,
        height: u32,
        layout: ChannelLayout,
    ) -> Result<Self, CreateBitmapError> {
        let stride = (width as usize)
            .checked_mul(layout.channels())
            .ok_or(CreateBitmapError::Overflow { width, height })?;
        Self::with_stride(bytes, width, height, stride, layout)
    }

    /// Create a new [`Bitmap`] whose rows are `stride` bytes apart.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the following are true:
    /// - `stride` is less than `width * layout.channels()`.
    /// - `bytes` does not contain `stride * (height - 1) + width * layout.channels()` bytes.
    /// - the byte count above overflows a `usize`.
    pub fn with_stride(
        bytes: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        layout: ChannelLayout,
    ) -> Result<Self, CreateBitmapError> {
        let overflow = CreateBitmapError::Overflow { width, height };
        let row = (width as usize)
            .checked_mul(layout.channels())
            .ok_or(overflow)?;

        if stride < row {
            return Err(CreateBitmapError::StrideTooSmall { stride, row });
        }

        let expected = if width == 0 || height == 0 {
            0
        } else {
            stride
                .checked_mul(height as usize - 1)
                .and_then(|n| n.checked_add(row))
                .ok_or(overflow)?
        };

        if bytes.len() < expected {
            return Err(CreateBitmapError::BufferTooShort {
                width,
                height,
                expected,
                length: bytes.len(),
            });
        }

        Ok(Self { bytes, width, height, stride, layout })
    }

    /// Returns the width and height of the bitmap.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the width of the bitmap.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the bitmap.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of bytes between the start of two rows.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the pixel format of the bitmap.
    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Returns whether the bitmap has zero pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the number of pixels in the bitmap.
    #[inline]
    pub fn num_pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns the raw bytes of the pixel at `(x, y)`.
    ///
    /// The slice has [`ChannelLayout::channels`] bytes.
    #[inline]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> &'a [u8] {
        debug_assert!(x < self.width && y < self.height);
        let channels = self.layout.channels();
        let offset = self.stride * y as usize + channels * x as usize;
        &self.bytes[offset..offset + channels]
    }
}

#[cfg(feature = "image")]
mod image_integration {
    use super::{Bitmap, ChannelLayout};
    use crate::CreateBitmapError;
    use core::ops::Deref;
    use image::{ImageBuffer, Rgb, Rgba};

    impl<'a, Container> TryFrom<&'a ImageBuffer<Rgb<u8>, Container>> for Bitmap<'a>
    where
        Container: Deref<Target = [u8]>,
    {
        type Error = CreateBitmapError;

        fn try_from(image: &'a ImageBuffer<Rgb<u8>, Container>) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            Bitmap::new(&**image, width, height, ChannelLayout::Rgb)
        }
    }

    impl<'a, Container> TryFrom<&'a ImageBuffer<Rgba<u8>, Container>> for Bitmap<'a>
    where
        Container: Deref<Target = [u8]>,
    {
        type Error = CreateBitmapError;

        fn try_from(image: &'a ImageBuffer<Rgba<u8>, Container>) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            Bitmap::new(&**image, width, height, ChannelLayout::Rgba)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_rows() {
        let bytes = [0u8; 12];
        let bitmap = Bitmap::new(&bytes, 2, 2, ChannelLayout::Rgb).unwrap();
        assert_eq!(bitmap.stride(), 6);
        assert_eq!(bitmap.num_pixels(), 4);
        assert!(!bitmap.is_empty());
    }

    #[test]
    fn padded_last_row_may_be_short() {
        // the final row does not need its padding bytes
        let bytes = [0u8; 8 + 6];
        let bitmap = Bitmap::with_stride(&bytes, 2, 2, 8, ChannelLayout::Rgb).unwrap();
        assert_eq!(bitmap.pixel(1, 1).len(), 3);
    }

    #[test]
    fn invalid_buffers() {
        let bytes = [0u8; 16];
        assert_eq!(
            Bitmap::with_stride(&bytes, 2, 2, 7, ChannelLayout::Rgba),
            Err(CreateBitmapError::StrideTooSmall { stride: 7, row: 8 }),
        );
        assert_eq!(
            Bitmap::new(&bytes, 3, 2, ChannelLayout::Rgb),
            Err(CreateBitmapError::BufferTooShort {
                width: 3,
                height: 2,
                expected: 18,
                length: 16,
            }),
        );
        assert!(matches!(
            Bitmap::with_stride(&bytes, 1, u32::MAX, usize::MAX, ChannelLayout::Rgb),
            Err(CreateBitmapError::Overflow { .. }),
        ));
    }

    #[test]
    fn empty_bitmap() {
        let bitmap = Bitmap::new(&[], 0, 10, ChannelLayout::Rgba).unwrap();
        assert!(bitmap.is_empty());
        assert_eq!(bitmap.num_pixels(), 0);
    }

    #[test]
    fn pixel_offsets() {
        #[rustfmt::skip]
        let bytes = [
            1, 2, 3, 4,   5, 6, 7, 8,   0, 0,
            9, 10, 11, 12, 13, 14, 15, 16,
        ];
        let bitmap = Bitmap::with_stride(&bytes, 2, 2, 10, ChannelLayout::Rgba).unwrap();
        assert_eq!(bitmap.pixel(0, 0), [1, 2, 3, 4]);
        assert_eq!(bitmap.pixel(1, 0), [5, 6, 7, 8]);
        assert_eq!(bitmap.pixel(1, 1), [13, 14, 15, 16]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn from_image_buffers() {
        let rgb = image::RgbImage::new(4, 3);
        let bitmap = Bitmap::try_from(&rgb).unwrap();
        assert_eq!(bitmap.dimensions(), (4, 3));
        assert_eq!(bitmap.layout(), ChannelLayout::Rgb);

        let rgba = image::RgbaImage::new(2, 5);
        let bitmap = Bitmap::try_from(&rgba).unwrap();
        assert_eq!(bitmap.stride(), 8);
        assert_eq!(bitmap.layout(), ChannelLayout::Rgba);
    }
}
