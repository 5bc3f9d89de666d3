#![allow(dead_code)]

use std::sync::OnceLock;

use image::RgbaImage;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// The sizes of the synthetic benchmark images.
pub const SIZES: [(u32, u32); 3] = [(480, 270), (960, 540), (1920, 1080)];

/// A smooth two-axis gradient with per-pixel noise, giving a photo-like number of unique colors.
pub fn gradient_image(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbaImage::from_fn(width, height, |x, y| {
        let u = x * 255 / width.max(1);
        let v = y * 255 / height.max(1);
        let noise = rng.gen_range(0..8);
        #[allow(clippy::cast_possible_truncation)]
        image::Rgba([
            (u + noise).min(255) as u8,
            (v + noise).min(255) as u8,
            ((u + v) / 2) as u8,
            255,
        ])
    })
}

/// A few flat regions, like a logo or a screenshot.
pub fn flat_image(width: u32, height: u32) -> RgbaImage {
    const COLORS: [[u8; 4]; 6] = [
        [250, 250, 250, 255],
        [20, 20, 30, 255],
        [200, 40, 40, 255],
        [40, 120, 200, 255],
        [240, 200, 60, 255],
        [0, 0, 0, 0],
    ];
    RgbaImage::from_fn(width, height, |x, y| {
        let i = ((x * 3 / width.max(1)) + (y * 2 / height.max(1)) * 3) as usize;
        image::Rgba(COLORS[i % COLORS.len()])
    })
}

fn make_images() -> Vec<(String, RgbaImage)> {
    SIZES
        .iter()
        .flat_map(|&(w, h)| {
            [
                (format!("gradient/{w}x{h}"), gradient_image(w, h, 0)),
                (format!("flat/{w}x{h}"), flat_image(w, h)),
            ]
        })
        .collect()
}

static IMAGES: OnceLock<Vec<(String, RgbaImage)>> = OnceLock::new();

pub fn bench_images() -> &'static [(String, RgbaImage)] {
    IMAGES.get_or_init(make_images)
}
