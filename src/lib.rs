//! Dominant color and palette extraction using modified median cut quantization (MMCQ).
//!
//! Given the pixels of an image, `mmcq` builds a reduced-precision color histogram,
//! recursively cuts it into boxes of similar colors, and reports one averaged color per box
//! along with the number of pixels it represents and whether the color reads as dark.
//!
//! # Overview
//!
//! Most users will want the [`Pipeline`] builder:
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mmcq::{Bitmap, ChannelLayout, PaletteSize, Pipeline};
//!
//! // A 2x1 RGB image: one red pixel, one blue pixel.
//! let pixels = [255, 0, 0, 0, 0, 255];
//! let bitmap = Bitmap::new(&pixels, 2, 1, ChannelLayout::Rgb)?;
//!
//! let palette = Pipeline::new()
//!     .color_count(PaletteSize::try_from(4u16)?)
//!     .quality(1)
//!     .input_bitmap(bitmap)
//!     .palette();
//!
//! assert_eq!(palette.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! The individual stages are also public for callers that produce their own samples:
//! - [`Histogram`](quantize::Histogram): the color count table built from [`Sample`]s.
//! - [`ColorBox`](quantize::ColorBox): a box of the histogram that can average and split itself.
//! - [`MedianCut`](quantize::MedianCut): the two phase splitting loop producing a [`ClusterSet`](quantize::ClusterSet).
//! - [`PaletteBuilder`]: turns a cluster set into [`PaletteEntry`]s.
//!
//! # Features
//!
//! - `threads`: adds parallel histogram construction via [`rayon`].
//! - `image`: adds conversions from [`image`] buffers into [`Bitmap`]s.

#![deny(unsafe_code)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_slice,
    missing_docs,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::unreadable_literal
)]

extern crate alloc;

mod api;
mod luma;
mod palette_builder;
mod types;

pub mod deps;
pub mod quantize;
pub mod sampling;

pub use api::*;
pub use luma::*;
pub use palette_builder::*;
pub use types::*;

/// The number of most significant bits kept from each color channel when building a histogram.
///
/// With 5 bits the histogram has `32 * 32 * 32 = 32768` cells.
pub const SIG_BITS: u8 = 5;

/// The fraction of the requested colors produced while splitting boxes by population alone.
///
/// The remaining splits are chosen by population times volume.
pub const FRACTION_BY_POPULATION: f64 = 0.75;

/// The maximum number of split attempts made in a single phase of the median cut loop.
pub const MAX_ITERATIONS: u32 = 1000;

#[cfg(test)]
pub(crate) mod tests {
    use crate::Sample;
    use alloc::vec::Vec;
    use palette::Srgb;

    /// Deterministic pseudo random colors (xorshift) for tests that need varied input.
    pub fn test_colors(len: usize) -> Vec<Srgb<u8>> {
        let mut state = 0x2545_f491_u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let [r, g, b, _] = state.to_le_bytes();
                Srgb::new(r, g, b)
            })
            .collect()
    }

    /// [`test_colors`] as retained samples.
    pub fn test_samples(len: usize) -> Vec<Sample> {
        test_colors(len).into_iter().map(Sample::from).collect()
    }

    /// `count` copies of a single color.
    pub fn solid(color: [u8; 3], count: usize) -> Vec<Sample> {
        alloc::vec![Sample::from(color); count]
    }
}
