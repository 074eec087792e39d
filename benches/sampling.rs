#[path = "../util/mod.rs"]
mod util;

use criterion::{
    Bencher, BenchmarkId, Criterion, SamplingMode, criterion_group, criterion_main,
    measurement::WallTime,
};
use image::RgbaImage;
use mmcq::{Bitmap, ChannelLayout, Pipeline, sampling::Sampler};
use std::time::Duration;
use util::benchmark_images;

fn bench(
    c: &mut Criterion,
    group: &str,
    images: &[(String, RgbaImage)],
    mut f: impl FnMut(&mut Bencher<'_, WallTime>, Bitmap<'_>),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (name, image) in images {
        let (width, height) = image.dimensions();
        let bitmap = Bitmap::new(image.as_raw(), width, height, ChannelLayout::Rgba).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &bitmap, |b, &bitmap| {
            f(b, bitmap)
        });
    }
}

fn sample_every_pixel(c: &mut Criterion) {
    bench(c, "sample_every_pixel", benchmark_images(), |b, bitmap| {
        b.iter(|| Sampler::new(bitmap, 1, true).filter(|s| !s.is_ignored()).count())
    })
}

fn sample_default_quality(c: &mut Criterion) {
    bench(c, "sample_default_quality", benchmark_images(), |b, bitmap| {
        b.iter(|| Sampler::new(bitmap, 0, true).count())
    })
}

fn palette_default(c: &mut Criterion) {
    bench(c, "palette_default", benchmark_images(), |b, bitmap| {
        b.iter(|| Pipeline::new().input_bitmap(bitmap).palette())
    })
}

#[cfg(feature = "threads")]
fn palette_parallel(c: &mut Criterion) {
    bench(c, "palette_parallel", benchmark_images(), |b, bitmap| {
        b.iter(|| {
            Pipeline::new()
                .quality(1)
                .parallel(true)
                .input_bitmap(bitmap)
                .palette()
        })
    })
}

fn palette_bands(c: &mut Criterion) {
    let image = util::bands(1920, 1080);
    let (width, height) = image.dimensions();
    let bitmap = Bitmap::new(image.as_raw(), width, height, ChannelLayout::Rgb).unwrap();
    c.bench_function("palette_bands", |b| {
        b.iter(|| Pipeline::new().quality(1).input_bitmap(bitmap).palette())
    });
}

fn dominant_color(c: &mut Criterion) {
    bench(c, "dominant_color", benchmark_images(), |b, bitmap| {
        b.iter(|| Pipeline::new().input_bitmap(bitmap).dominant_color())
    })
}

#[cfg(feature = "threads")]
criterion_group!(
    benches,
    sample_every_pixel,
    sample_default_quality,
    palette_default,
    palette_parallel,
    palette_bands,
    dominant_color
);
#[cfg(not(feature = "threads"))]
criterion_group!(
    benches,
    sample_every_pixel,
    sample_default_quality,
    palette_default,
    palette_bands,
    dominant_color
);
criterion_main!(benches);
