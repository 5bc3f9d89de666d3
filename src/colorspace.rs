//! Conversions between sRGB, CIELAB, and HSL, and the CIE76 color difference.
//!
//! CIELAB uses the D65 reference white, reached through linear sRGB and CIE XYZ
//! with the standard sRGB companding curve.

use palette::{Hsl, IntoColor, Lab, LinSrgb, Srgb};

/// Converts an 8-bit sRGB color into CIELAB.
pub(crate) fn srgb_to_lab(color: Srgb<u8>) -> Lab {
    let linear: LinSrgb = color.into_linear();
    linear.into_color()
}

/// Converts a CIELAB color back into 8-bit sRGB, clamping colors outside of the sRGB gamut.
pub(crate) fn lab_to_srgb(color: Lab) -> Srgb<u8> {
    let linear: LinSrgb = color.into_color();
    linear.into_encoding()
}

/// Converts an 8-bit sRGB color into `[hue, saturation, lightness]`.
///
/// Hue is in degrees in `0.0..360.0`, saturation and lightness are percentages.
/// Achromatic colors have a hue of `0.0`.
pub(crate) fn srgb_to_hsl(color: Srgb<u8>) -> [f32; 3] {
    let hsl: Hsl = color.into_format::<f32>().into_color();
    let hue = hsl.hue.into_positive_degrees();
    [
        if hue >= 360.0 { 0.0 } else { hue },
        hsl.saturation * 100.0,
        hsl.lightness * 100.0,
    ]
}

/// Returns the components of a [`Lab`] color as an array.
#[inline]
pub(crate) fn lab_components(color: Lab) -> [f32; 3] {
    [color.l, color.a, color.b]
}

/// The squared Euclidean distance between two CIELAB points.
#[inline]
pub(crate) fn distance_squared(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dl = a[0] - b[0];
    let da = a[1] - b[1];
    let db = a[2] - b[2];
    dl * dl + da * da + db * db
}

/// The CIE76 color difference (Delta-E) between two CIELAB colors.
///
/// This is the Euclidean distance in CIELAB space.
/// A difference below `1.0` is imperceptible, while a difference above `5.0`
/// reads as an obviously different color.
#[must_use]
pub fn delta_e(a: Lab, b: Lab) -> f32 {
    distance_squared(lab_components(a), lab_components(b)).sqrt()
}

/// Accumulates a pixel-count-weighted mean of CIELAB points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct WeightedLabSum {
    /// The component-wise sum of `lab * weight`.
    components: [f64; 3],
    /// The sum of the weights.
    weight: u64,
}

impl WeightedLabSum {
    /// Adds a point with the given weight.
    pub(crate) fn add(&mut self, lab: [f32; 3], weight: u32) {
        let w = f64::from(weight);
        for (sum, c) in self.components.iter_mut().zip(lab) {
            *sum += f64::from(c) * w;
        }
        self.weight += u64::from(weight);
    }

    /// The weighted mean of all added points, or `None` if the total weight is zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn mean(&self) -> Option<[f32; 3]> {
        if self.weight == 0 {
            None
        } else {
            let w = self.weight as f64;
            Some(self.components.map(|c| (c / w) as f32))
        }
    }
}
