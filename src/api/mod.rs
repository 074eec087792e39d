mod pipeline;

pub use pipeline::{
    Pipeline, PipelineWithBitmapInput, PipelineWithHistogram, PipelineWithSampleInput,
};
