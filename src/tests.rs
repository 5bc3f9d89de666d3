//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use crate::PixelBuffer;
use palette::Srgba;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// Wraps `pixels` in a [`PixelBuffer`].
pub fn buffer(width: u32, height: u32, pixels: &[Srgba<u8>]) -> PixelBuffer<'_> {
    PixelBuffer::new(width, height, pixels).unwrap()
}

/// A single color.
pub fn solid(width: u32, height: u32, [r, g, b, a]: [u8; 4]) -> Vec<Srgba<u8>> {
    vec![Srgba::new(r, g, b, a); (width * height) as usize]
}

/// The first `count` pixels (in row-major order) are `first`, the rest are `second`.
pub fn split(width: u32, height: u32, first: [u8; 4], second: [u8; 4], count: usize) -> Vec<Srgba<u8>> {
    let mut pixels = solid(width, height, second);
    let [r, g, b, a] = first;
    for pixel in &mut pixels[..count] {
        *pixel = Srgba::new(r, g, b, a);
    }
    pixels
}

/// Every column has its own distinct, opaque color.
#[allow(clippy::cast_possible_truncation)]
pub fn stripes(width: u32, height: u32) -> Vec<Srgba<u8>> {
    (0..height)
        .flat_map(|_| {
            (0..width).map(|x| {
                let x = x as u8;
                Srgba::new(x.wrapping_mul(37), x.wrapping_mul(91), x.wrapping_mul(153), 255)
            })
        })
        .collect()
}

/// Three horizontal bands of red, green, and blue shades, ten shades each.
#[allow(clippy::cast_possible_truncation)]
pub fn families(width: u32, height: u32) -> Vec<Srgba<u8>> {
    (0..height)
        .flat_map(|y| {
            let band = y * 3 / height;
            (0..width).map(move |x| {
                let v = (x % 10) as u8;
                let (main, low) = (200 + v * 3, v * 2);
                match band {
                    0 => Srgba::new(main, low, low, 255),
                    1 => Srgba::new(low, main, low, 255),
                    _ => Srgba::new(low, low, main, 255),
                }
            })
        })
        .collect()
}

/// 1024 opaque pixels of seeded random colors.
pub fn test_data_1024() -> Vec<Srgba<u8>> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
    (0..1024)
        .map(|_| {
            let [r, g, b] = rng.gen::<[u8; 3]>();
            Srgba::new(r, g, b, 255)
        })
        .collect()
}

/// Red, green, and blue families of ten close shades each, with the given pixel counts.
///
/// Each family's shades are spread evenly over its pixels.
#[allow(clippy::cast_possible_truncation)]
pub fn weighted_families([red, green, blue]: [usize; 3]) -> Vec<Srgba<u8>> {
    let family = |count: usize, shade: fn(u8) -> Srgba<u8>| {
        (0..count).map(move |i| shade((i % 10) as u8))
    };
    family(red, |v| Srgba::new(200 + v, v, v, 255))
        .chain(family(green, |v| Srgba::new(v, 200 + v, v, 255)))
        .chain(family(blue, |v| Srgba::new(v, v, 200 + v, 255)))
        .collect()
}
