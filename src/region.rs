//! Picking a single color at a point of an image.
//!
//! [`pick_exact`] returns the pixel under the point as-is, while [`pick_region`] resolves
//! one representative color from a square window centered on the point.
//! The window is clamped to the image and always covers at least one pixel.
//!
//! # Examples
//! ```
//! # use huepick::{region, PixelBuffer, Provenance, RegionSize};
//! # use palette::Srgba;
//! # fn main() -> Result<(), huepick::EngineError> {
//! let pixels = vec![Srgba::new(10, 120, 200, 255); 50 * 50];
//! let buffer = PixelBuffer::new(50, 50, &pixels)?;
//!
//! let picked = region::pick_region(buffer, 0, 0, RegionSize::default())?;
//! assert_eq!(picked.color().hex(), "#0A78C8");
//! assert_eq!(picked.provenance(), &Provenance::RegionPick);
//!
//! assert!(region::pick_exact(buffer, 50, 0).is_err());
//! # Ok(())
//! # }
//! ```

use crate::{
    quantize, ColorSample, Histogram, PixelBuffer, Provenance, RegionSize, Result, Window,
    DEFAULT_ALPHA_THRESHOLD,
};
use log::{debug, info};
use palette::Srgb;

/// The name given to an exact pick.
pub const EXACT_PIXEL_NAME: &str = "Exact Pixel";

/// The name of the color returned for a window without visible pixels.
pub const FALLBACK_NAME: &str = "Fallback White";

/// Windows with at most this many distinct colors resolve to their most frequent color.
const SIMPLE_REGION_COLORS: usize = 3;

/// A color picked from an image, together with how it was picked.
#[derive(Debug, Clone, PartialEq)]
pub struct PickedColor {
    /// The picked color.
    color: ColorSample,
    /// Either [`Provenance::ExactPick`] or [`Provenance::RegionPick`].
    provenance: Provenance,
}

impl PickedColor {
    /// The picked color.
    #[must_use]
    pub fn color(&self) -> &ColorSample {
        &self.color
    }

    /// How the color was picked.
    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Splits the pick into its color and provenance.
    #[must_use]
    pub fn into_parts(self) -> (ColorSample, Provenance) {
        (self.color, self.provenance)
    }
}

/// Returns the pixel at `(x, y)` verbatim, with its alpha normalized to `0.0..=1.0`.
///
/// # Errors
/// Returns [`crate::EngineError::OutOfRange`] if `(x, y)` is outside of the buffer.
pub fn pick_exact(buffer: PixelBuffer, x: u32, y: u32) -> Result<PickedColor> {
    let pixel = buffer.try_pixel(x, y)?;
    let color = ColorSample::from_srgb_alpha(pixel.color, pixel.alpha).with_name(EXACT_PIXEL_NAME);

    info!("exact pixel at ({x}, {y}): {}", color.hex());

    Ok(PickedColor {
        color,
        provenance: Provenance::ExactPick,
    })
}

/// Resolves one representative color from a `size × size` window centered on `(x, y)`.
///
/// - A window without visible pixels gives opaque white named [`FALLBACK_NAME`].
/// - A window with at most three distinct colors gives its most frequent color.
/// - Otherwise, all colors of the window are merged into a single group,
///   and the pixel-weighted CIELAB mean is returned.
///
/// The single group applies no distance threshold, so every visible color of the window
/// contributes. Grouping the window with [`quantize::quantize`] under a small threshold
/// (such as 1.0) and keeping the largest group would instead return the most frequent
/// cluster of near-identical colors.
///
/// # Errors
/// Returns [`crate::EngineError::OutOfRange`] if `(x, y)` is outside of the buffer.
pub fn pick_region(buffer: PixelBuffer, x: u32, y: u32, size: RegionSize) -> Result<PickedColor> {
    buffer.check_bounds(x, y)?;

    let window = Window::centered(buffer.width(), buffer.height(), x, y, size.into_inner());
    debug!(
        "region bounds: x={}-{}, y={}-{} (actual size: {}x{})",
        window.x,
        window.end_x(),
        window.y,
        window.end_y(),
        window.width,
        window.height
    );

    let histogram = Histogram::from_window(buffer, window, DEFAULT_ALPHA_THRESHOLD);
    let color = representative(&histogram);

    info!(
        "region pick at ({x}, {y}) with size {size}: {} from {} colors",
        color.hex(),
        histogram.len()
    );

    Ok(PickedColor {
        color,
        provenance: Provenance::RegionPick,
    })
}

/// Like [`pick_region`], but validates a raw window size first.
///
/// # Errors
/// Returns [`crate::EngineError::OutOfRange`] if `(x, y)` is outside of the buffer
/// or `size` is not in `5..=50`.
pub fn pick_region_with_size(buffer: PixelBuffer, x: u32, y: u32, size: u32) -> Result<PickedColor> {
    // coordinates are reported before an invalid size
    buffer.check_bounds(x, y)?;
    pick_region(buffer, x, y, RegionSize::try_from(size)?)
}

/// Resolves the representative color of a window's histogram.
fn representative(histogram: &Histogram) -> ColorSample {
    let entries = histogram.entries();
    match entries.first() {
        None => ColorSample::from_srgb(Srgb::new(255, 255, 255)).with_name(FALLBACK_NAME),
        Some(top) if entries.len() <= SIMPLE_REGION_COLORS => top.color().clone(),
        Some(top) => quantize::single_group(entries)
            .map_or_else(|| top.color().clone(), |group| group.representative().clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, EngineError};
    use palette::Srgba;

    #[test]
    fn exact_pick_is_verbatim() {
        let mut pixels = solid(4, 4, [0, 0, 0, 255]);
        pixels[2 * 4 + 1] = Srgba::new(12, 34, 56, 204);
        let picked = pick_exact(buffer(4, 4, &pixels), 1, 2).unwrap();
        assert_eq!(picked.color().rgb(), [12, 34, 56]);
        assert!((picked.color().alpha() - 0.8).abs() < 1e-6);
        assert_eq!(picked.color().name(), Some(EXACT_PIXEL_NAME));
        assert_eq!(picked.provenance(), &Provenance::ExactPick);
    }

    #[test]
    fn out_of_bounds() {
        let pixels = solid(4, 3, [0, 0, 0, 255]);
        let buffer = buffer(4, 3, &pixels);
        assert_eq!(
            pick_exact(buffer, 4, 0).unwrap_err(),
            EngineError::out_of_range("x", 4, 0, 3)
        );
        assert!(pick_exact(buffer, 0, 3).is_err());
        assert!(pick_region(buffer, 9, 9, RegionSize::default()).is_err());
    }

    #[test]
    fn region_size_is_validated() {
        let pixels = solid(10, 10, [0, 0, 0, 255]);
        let buffer = buffer(10, 10, &pixels);
        for size in [4, 51] {
            assert!(matches!(
                pick_region_with_size(buffer, 5, 5, size),
                Err(EngineError::OutOfRange { what: "regionSize", .. })
            ));
        }
        assert!(pick_region_with_size(buffer, 5, 5, 5).is_ok());
        assert!(pick_region_with_size(buffer, 5, 5, 50).is_ok());
        assert_eq!(
            pick_region_with_size(buffer, 10, 5, 4).unwrap_err(),
            EngineError::out_of_range("x", 10, 0, 9)
        );
    }

    #[test]
    fn corner_of_solid_image() {
        let pixels = solid(50, 50, [10, 120, 200, 255]);
        let picked = pick_region(buffer(50, 50, &pixels), 0, 0, RegionSize::default()).unwrap();
        assert_eq!(picked.color().rgb(), [10, 120, 200]);
        assert_eq!(picked.provenance(), &Provenance::RegionPick);
    }

    #[test]
    fn simple_region_uses_most_common() {
        // the window covers the whole image: 40 red and 60 blue pixels
        let pixels = split(10, 10, [255, 0, 0, 255], [0, 0, 255, 255], 40);
        let size = RegionSize::try_from(10u32).unwrap();
        let picked = pick_region(buffer(10, 10, &pixels), 5, 5, size).unwrap();
        assert_eq!(picked.color().rgb(), [0, 0, 255]);
        assert_eq!(picked.color().name(), None);
    }

    #[test]
    fn complex_region_is_averaged() {
        let pixels = stripes(12, 12);
        let buffer = buffer(12, 12, &pixels);
        let picked = pick_region(buffer, 6, 6, RegionSize::try_from(10u32).unwrap()).unwrap();

        let window = Window::centered(12, 12, 6, 6, 10);
        let histogram = Histogram::from_window(buffer, window, DEFAULT_ALPHA_THRESHOLD);
        assert!(histogram.len() > 3);
        let group = quantize::single_group(histogram.entries()).unwrap();
        assert_eq!(picked.color(), group.representative());

        // a thresholded grouping keeps only one near-identical cluster instead of the mean
        let options = quantize::QuantizeOptions::new().threshold(1.0);
        let groups = quantize::quantize(histogram.entries(), options).into_groups();
        assert!(groups.len() > 1);
        assert_ne!(picked.color().rgb(), groups[0].representative().rgb());
    }

    #[test]
    fn transparent_region_falls_back_to_white() {
        let pixels = solid(8, 8, [30, 30, 30, 0]);
        let picked = pick_region(buffer(8, 8, &pixels), 4, 4, RegionSize::MIN).unwrap();
        assert_eq!(picked.color().rgb(), [255, 255, 255]);
        assert_eq!(picked.color().name(), Some(FALLBACK_NAME));
    }

    #[test]
    fn one_pixel_image() {
        let pixels = solid(1, 1, [1, 2, 3, 255]);
        let picked = pick_region(buffer(1, 1, &pixels), 0, 0, RegionSize::MAX).unwrap();
        assert_eq!(picked.color().rgb(), [1, 2, 3]);
    }
}
