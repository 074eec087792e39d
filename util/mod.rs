#![allow(dead_code)]

use image::{RgbImage, RgbaImage};
use mmcq::Sample;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(PathBuf, RgbaImage)> {
    let mut paths = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<_>>();

    paths.sort_unstable();

    paths
        .into_iter()
        .map(|path| {
            let image = image::open(&path).unwrap().into_rgba8();
            (path, image)
        })
        .collect()
}

fn root_dir() -> PathBuf {
    // assume current exe path is something like: target/profile/dir/current_exe
    std::env::current_exe()
        .unwrap()
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap()
        .into()
}

/// A smooth gradient with a noisy blue channel, so most histogram cells are populated.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    let mut state = 0x9e37_79b9_u32;
    RgbaImage::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        #[allow(clippy::cast_possible_truncation)]
        let (r, g) = ((x * 255 / width) as u8, (y * 255 / height) as u8);
        let [b, a, ..] = state.to_le_bytes();
        image::Rgba([r, g, b, a.max(96)])
    })
}

/// A few flat color bands, the easy case for median cut.
pub fn bands(width: u32, height: u32) -> RgbImage {
    const COLORS: [[u8; 3]; 6] = [
        [230, 57, 70],
        [241, 250, 238],
        [168, 218, 220],
        [69, 123, 157],
        [29, 53, 87],
        [255, 255, 255],
    ];
    RgbImage::from_fn(width, height, |x, _| {
        image::Rgb(COLORS[(x as usize * COLORS.len()) / width as usize])
    })
}

static BENCHMARK_IMAGES: OnceLock<Vec<(String, RgbaImage)>> = OnceLock::new();

/// Images under `img/` in the repository root if present, otherwise synthetic images.
pub fn benchmark_images() -> &'static [(String, RgbaImage)] {
    BENCHMARK_IMAGES.get_or_init(|| {
        let mut dir = root_dir();
        dir.push("img");
        if dir.is_dir() {
            load_image_dir(dir)
                .into_iter()
                .map(|(path, image)| {
                    let name = path.file_name().unwrap().to_string_lossy().into_owned();
                    (name, image)
                })
                .collect()
        } else {
            [(640, 480), (1920, 1080), (4000, 3000)]
                .into_iter()
                .map(|(w, h)| (format!("gradient_{w}x{h}"), gradient(w, h)))
                .collect()
        }
    })
}

static BENCHMARK_SAMPLES: OnceLock<Vec<(String, Vec<Sample>)>> = OnceLock::new();

/// Every pixel of each benchmark image as a sample.
pub fn benchmark_samples() -> &'static [(String, Vec<Sample>)] {
    BENCHMARK_SAMPLES.get_or_init(|| {
        benchmark_images()
            .iter()
            .map(|(name, image)| {
                let samples = image
                    .pixels()
                    .map(|&image::Rgba([r, g, b, _])| Sample::new(r, g, b))
                    .collect();
                (name.clone(), samples)
            })
            .collect()
    })
}
