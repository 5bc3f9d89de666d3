//! The color value type used across the crate.

use crate::{
    colorspace::{delta_e, lab_components, lab_to_srgb, srgb_to_hsl, srgb_to_lab},
    EngineError, Result,
};
use palette::{Lab, Srgb};
use std::fmt::{self, Display};

/// A single sRGB color with alpha and an optional display name.
///
/// [`ColorSample`] is an immutable value: the CIELAB representation is computed once
/// on construction, and every "mutation" (e.g., [`ColorSample::with_rgb`]) returns a new value
/// whose derived representations match its components.
///
/// # Examples
/// ```
/// # use huepick::ColorSample;
/// # fn main() -> Result<(), huepick::EngineError> {
/// let red = ColorSample::from_hex("#F00")?;
/// assert_eq!(red.rgb(), [255, 0, 0]);
/// assert_eq!(red.hex(), "#FF0000");
///
/// let darker = red.with_rgb(200, 0, 0);
/// assert!(darker.delta_e(&red) > 5.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSample {
    /// The source of truth for every other representation.
    rgb: Srgb<u8>,
    /// Opacity in `0.0..=1.0`.
    alpha: f32,
    /// An optional label, e.g., for picked colors.
    name: Option<String>,
    /// Derived from `rgb` on construction.
    lab: Lab,
}

impl ColorSample {
    /// Creates an opaque, unnamed color.
    #[must_use]
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self::from_srgb(Srgb::new(red, green, blue))
    }

    /// Creates an opaque, unnamed color from an 8-bit [`Srgb`] value.
    #[must_use]
    pub fn from_srgb(rgb: Srgb<u8>) -> Self {
        Self {
            rgb,
            alpha: 1.0,
            name: None,
            lab: srgb_to_lab(rgb),
        }
    }

    /// Creates a color from an 8-bit color and an 8-bit alpha, normalizing alpha to `0.0..=1.0`.
    #[must_use]
    pub(crate) fn from_srgb_alpha(rgb: Srgb<u8>, alpha: u8) -> Self {
        Self {
            alpha: f32::from(alpha) / 255.0,
            ..Self::from_srgb(rgb)
        }
    }

    /// Creates a color from integer components, validating each one is in `0..=255`.
    pub fn try_new(red: i32, green: i32, blue: i32) -> Result<Self> {
        fn component(what: &'static str, value: i32) -> Result<u8> {
            u8::try_from(value).map_err(|_| EngineError::out_of_range(what, value, 0, 255))
        }

        Ok(Self::new(
            component("red", red)?,
            component("green", green)?,
            component("blue", blue)?,
        ))
    }

    /// Parses a hex color in the form `#RRGGBB`, `RRGGBB`, `#RGB`, or `RGB`.
    ///
    /// Surrounding whitespace is ignored.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let trimmed = hex.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidInput(
                "hex color cannot be empty".to_owned(),
            ));
        }

        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let invalid = || EngineError::InvalidInput(format!("invalid hex color: {hex}"));

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let nibbles = digits
            .chars()
            .filter_map(|c| c.to_digit(16))
            .filter_map(|d| u8::try_from(d).ok())
            .collect::<Vec<_>>();

        let [r, g, b] = match nibbles.as_slice() {
            &[r, g, b] => [r, g, b].map(|n| n << 4 | n),
            &[r1, r0, g1, g0, b1, b0] => [r1 << 4 | r0, g1 << 4 | g0, b1 << 4 | b0],
            _ => return Err(invalid()),
        };

        Ok(Self::new(r, g, b))
    }

    /// Creates an opaque color from a CIELAB point, clamping it into the sRGB gamut.
    #[must_use]
    pub fn from_lab(lab: Lab) -> Self {
        Self::from_srgb(lab_to_srgb(lab))
    }

    /// Creates an opaque color from CIELAB components.
    #[must_use]
    pub(crate) fn from_lab_components([l, a, b]: [f32; 3]) -> Self {
        Self::from_lab(Lab::new(l, a, b))
    }

    /// Returns a copy of this color with new RGB components.
    ///
    /// The alpha and name are kept, and the CIELAB representation is recomputed.
    #[must_use]
    pub fn with_rgb(&self, red: u8, green: u8, blue: u8) -> Self {
        let rgb = Srgb::new(red, green, blue);
        Self {
            rgb,
            alpha: self.alpha,
            name: self.name.clone(),
            lab: srgb_to_lab(rgb),
        }
    }

    /// Returns a copy of this color with a new alpha, which must be in `0.0..=1.0`.
    pub fn with_alpha(&self, alpha: f32) -> Result<Self> {
        if (0.0..=1.0).contains(&alpha) {
            Ok(Self { alpha, ..self.clone() })
        } else {
            #[allow(clippy::cast_possible_truncation)]
            Err(EngineError::out_of_range("alpha", alpha.round() as i64, 0, 1))
        }
    }

    /// Returns a copy of this color with the given name.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self.clone()
        }
    }

    /// The red component.
    #[must_use]
    pub fn red(&self) -> u8 {
        self.rgb.red
    }

    /// The green component.
    #[must_use]
    pub fn green(&self) -> u8 {
        self.rgb.green
    }

    /// The blue component.
    #[must_use]
    pub fn blue(&self) -> u8 {
        self.rgb.blue
    }

    /// The RGB components as an array.
    #[must_use]
    pub fn rgb(&self) -> [u8; 3] {
        [self.rgb.red, self.rgb.green, self.rgb.blue]
    }

    /// The color as an 8-bit [`Srgb`] value.
    #[must_use]
    pub fn srgb(&self) -> Srgb<u8> {
        self.rgb
    }

    /// The opacity in `0.0..=1.0`.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// The display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the color has a non-blank name.
    #[must_use]
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.trim().is_empty())
    }

    /// The color as an uppercase `#RRGGBB` string.
    #[must_use]
    pub fn hex(&self) -> String {
        let [r, g, b] = self.rgb();
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    /// The color as `[hue, saturation, lightness]`,
    /// with hue in degrees and saturation and lightness as percentages.
    #[must_use]
    pub fn hsl(&self) -> [f32; 3] {
        srgb_to_hsl(self.rgb)
    }

    /// The color in CIELAB (D65).
    #[must_use]
    pub fn lab(&self) -> Lab {
        self.lab
    }

    /// The CIELAB components as `[L, a, b]`.
    #[must_use]
    pub fn lab_components(&self) -> [f32; 3] {
        lab_components(self.lab)
    }

    /// The CIE76 color difference between this color and `other`.
    #[must_use]
    pub fn delta_e(&self, other: &Self) -> f32 {
        delta_e(self.lab, other.lab)
    }
}

impl From<Srgb<u8>> for ColorSample {
    fn from(rgb: Srgb<u8>) -> Self {
        Self::from_srgb(rgb)
    }
}

impl Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.rgb();
        match self.name.as_deref() {
            Some(name) if self.has_name() => {
                write!(f, "{name}: RGBA({r},{g},{b},{:.2}) {}", self.alpha, self.hex())
            }
            _ => write!(f, "RGBA({r},{g},{b},{:.2}) {}", self.alpha, self.hex()),
        }
    }
}
