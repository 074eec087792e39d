mod bitmap;
mod error;
mod palette;
mod sample;

pub use bitmap::*;
pub use error::*;
pub use palette::*;
pub use sample::*;
