use thiserror::Error;

/// The error returned when a [`Bitmap`](crate::Bitmap) failed to be created.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CreateBitmapError {
    /// The row stride is smaller than the number of bytes in a row of pixels.
    #[error("row stride of {stride} bytes is smaller than the {row} bytes in a row of pixels")]
    StrideTooSmall {
        /// The provided stride in bytes.
        stride: usize,
        /// The number of bytes needed for one row of pixels.
        row: usize,
    },
    /// The pixel buffer does not hold enough bytes for the given dimensions.
    #[error("bitmap of ({width}, {height}) needs {expected} bytes but the buffer has {length}")]
    BufferTooShort {
        /// The provided image width.
        width: u32,
        /// The provided image height.
        height: u32,
        /// The minimum number of bytes needed.
        expected: usize,
        /// The length of the pixel buffer.
        length: usize,
    },
    /// The dimensions overflow the addressable buffer size.
    #[error("bitmap dimensions of ({width}, {height}) overflow the addressable buffer size")]
    Overflow {
        /// The provided image width.
        width: u32,
        /// The provided image height.
        height: u32,
    },
}
