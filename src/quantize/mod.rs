//! The median cut quantization engine.
//!
//! The stages are:
//! 1. [`Histogram`]: count the input [`Sample`](crate::Sample)s in a reduced precision RGB table.
//! 2. [`ColorBox`]: a box over the histogram that can compute its population and average color,
//!    and cut itself in two at the population median.
//! 3. [`MedianCut`]: repeatedly split boxes until the requested number exist,
//!    producing a [`ClusterSet`].
//!
//! Most users will want to go through the [`Pipeline`](crate::Pipeline) builder instead.

mod color_box;
mod histogram;
mod median_cut;

pub use color_box::*;
pub use histogram::*;
pub use median_cut::*;
