//! Contains various types needed across the crate.

use crate::{EngineError, Result, MAX_DOMINANT_COLORS, MAX_PIXELS};
use palette::{cast, Srgba};
use std::{cmp::Reverse, fmt::Display};
#[cfg(feature = "image")]
use image::RgbaImage;

/// A read-only view over a decoded image: `width × height` [`Srgba`] pixels in row-major order.
///
/// The invariants are that the slice length equals `width * height`,
/// that both dimensions are non-zero, and that the pixel count is at most [`MAX_PIXELS`].
///
/// # Examples
/// From a raw pixel slice:
/// ```
/// # use huepick::PixelBuffer;
/// # use palette::Srgba;
/// # fn main() -> Result<(), huepick::EngineError> {
/// let pixels = vec![Srgba::new(0, 0, 0, 255); 6];
/// let buffer = PixelBuffer::new(3, 2, &pixels)?;
/// assert_eq!(buffer.pixel(2, 1), Some(Srgba::new(0, 0, 0, 255)));
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use huepick::PixelBuffer;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let buffer = PixelBuffer::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBuffer<'a> {
    /// The number of pixels in each row.
    width: u32,
    /// The number of rows.
    height: u32,
    /// The pixels in row-major order.
    pixels: &'a [Srgba<u8>],
}

impl<'a> PixelBuffer<'a> {
    /// Creates a [`PixelBuffer`] after validating the dimensions against the slice.
    pub fn new(width: u32, height: u32, pixels: &'a [Srgba<u8>]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidInput(format!(
                "pixel buffer dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let expected = u64::from(width) * u64::from(height);
        if expected > u64::from(MAX_PIXELS) {
            return Err(EngineError::InvalidInput(format!(
                "pixel buffer of {expected} pixels is above the maximum of {MAX_PIXELS}"
            )));
        }

        if pixels.len() as u64 != expected {
            return Err(EngineError::InvalidInput(format!(
                "pixel buffer has {} pixels but its dimensions are {width}x{height}",
                pixels.len()
            )));
        }

        Ok(Self { width, height, pixels })
    }

    /// Creates a [`PixelBuffer`] from tightly packed RGBA bytes.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(EngineError::InvalidInput(format!(
                "{} bytes cannot be split into RGBA pixels",
                bytes.len()
            )));
        }
        Self::new(width, height, cast::from_component_slice(bytes))
    }

    /// The number of pixels in each row.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The pixels in row-major order.
    #[must_use]
    pub const fn pixels(&self) -> &'a [Srgba<u8>] {
        self.pixels
    }

    /// The total number of pixels as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_pixels(&self) -> u32 {
        self.pixels.len() as u32
    }

    /// Returns the pixel at `(x, y)`, or `None` if the coordinate is outside of the buffer.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Srgba<u8>> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Errors
    /// Returns [`EngineError::OutOfRange`] if the coordinate is outside of the buffer.
    pub fn try_pixel(&self, x: u32, y: u32) -> Result<Srgba<u8>> {
        self.check_bounds(x, y)?;
        Ok(self.pixels[self.index(x, y)])
    }

    /// Ensures `(x, y)` lies within the buffer.
    pub fn check_bounds(&self, x: u32, y: u32) -> Result<()> {
        if x >= self.width {
            Err(EngineError::out_of_range("x", x, 0, i64::from(self.width) - 1))
        } else if y >= self.height {
            Err(EngineError::out_of_range("y", y, 0, i64::from(self.height) - 1))
        } else {
            Ok(())
        }
    }

    /// A window covering the whole buffer.
    #[must_use]
    pub const fn full_window(&self) -> Window {
        Window {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    /// Iterates over the pixels inside `window` in row-major order.
    ///
    /// The window is intersected with the buffer, so no pixel outside of the buffer is ever read.
    pub fn window_pixels(&self, window: Window) -> impl Iterator<Item = Srgba<u8>> + 'a {
        let window = window.intersect(self.width, self.height);
        let pixels = self.pixels;
        let width = self.width as usize;
        let (x0, x1) = (window.x as usize, (window.x + window.width) as usize);
        (window.y..(window.y + window.height)).flat_map(move |y| {
            let row = y as usize * width;
            pixels[(row + x0)..(row + x1)].iter().copied()
        })
    }

    /// The index of `(x, y)` into the pixel slice.
    const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for PixelBuffer<'a> {
    type Error = EngineError;

    fn try_from(image: &'a RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let len = image.pixels().len() * 4;
        Self::from_rgba_bytes(width, height, &image.as_raw()[..len])
    }
}

/// A rectangular region of a [`PixelBuffer`]: the half-open ranges
/// `x..x + width` and `y..y + height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// The leftmost column (inclusive).
    pub x: u32,
    /// The topmost row (inclusive).
    pub y: u32,
    /// The number of columns.
    pub width: u32,
    /// The number of rows.
    pub height: u32,
}

impl Window {
    /// Computes a window of roughly `size × size` pixels centered on `(x, y)`,
    /// clamped to a `buffer_width × buffer_height` image.
    ///
    /// The window spans `x - size / 2` up to (but excluding) `x + size / 2` on each axis,
    /// never starts at a negative coordinate, never extends past the image,
    /// and always covers at least one pixel.
    #[must_use]
    pub fn centered(buffer_width: u32, buffer_height: u32, x: u32, y: u32, size: u32) -> Self {
        /// Clamps one axis, returning the start and the (non-zero) length.
        fn axis(center: u32, half: u32, limit: u32) -> (u32, u32) {
            let start = center.saturating_sub(half);
            let end = center.saturating_add(half).min(limit);
            if end <= start {
                (start, 1)
            } else {
                (start, end - start)
            }
        }

        let half = size / 2;
        let (x, width) = axis(x, half, buffer_width);
        let (y, height) = axis(y, half, buffer_height);
        Self { x, y, width, height }
    }

    /// The number of pixels covered by the window.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// The exclusive end column.
    #[must_use]
    pub const fn end_x(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// The exclusive end row.
    #[must_use]
    pub const fn end_y(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Clips the window to a `width × height` image.
    #[must_use]
    pub fn intersect(self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.x.saturating_add(self.width).min(width) - x,
            height: self.y.saturating_add(self.height).min(height) - y,
        }
    }
}

/// The number of dominant colors to extract from an image.
///
/// This is a simple new type wrapper around `u8` with the invariant that it must be
/// in `1..=`[`MAX_DOMINANT_COLORS`].
///
/// # Examples
/// ```
/// # use huepick::MaxColors;
/// # fn main() -> Result<(), huepick::EngineError> {
/// let size = MaxColors::try_from(5u8)?;
/// let size: MaxColors = 5u8.try_into()?;
/// let size = MaxColors::from_clamped(200);
/// assert_eq!(size, MaxColors::MAX);
/// assert!(MaxColors::try_from(0u8).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MaxColors(u8);

impl MaxColors {
    /// The largest supported number of dominant colors (given by [`MAX_DOMINANT_COLORS`]).
    pub const MAX: Self = Self(MAX_DOMINANT_COLORS);

    /// Gets the inner `u8` value.
    #[must_use]
    pub const fn into_inner(self) -> u8 {
        self.0
    }

    /// Creates a [`MaxColors`] by clamping the given value into `1..=`[`MAX_DOMINANT_COLORS`].
    #[must_use]
    pub const fn from_clamped(value: u8) -> Self {
        if value == 0 {
            Self(1)
        } else if value <= MAX_DOMINANT_COLORS {
            Self(value)
        } else {
            Self::MAX
        }
    }
}

impl Default for MaxColors {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<MaxColors> for usize {
    fn from(value: MaxColors) -> Self {
        usize::from(value.0)
    }
}

impl TryFrom<u8> for MaxColors {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self> {
        if (1..=MAX_DOMINANT_COLORS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::out_of_range("maxColors", value, 1, MAX_DOMINANT_COLORS))
        }
    }
}

impl Display for MaxColors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The side length of the sampling window used when picking a color from a region.
///
/// This is a simple new type wrapper around `u32` with the invariant that it must be in
/// [`RegionSize::MIN`]`..=`[`RegionSize::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RegionSize(u32);

impl RegionSize {
    /// The smallest supported region size.
    pub const MIN: Self = Self(5);

    /// The largest supported region size.
    pub const MAX: Self = Self(50);

    /// The default region size of `20`.
    pub const DEFAULT: Self = Self(20);

    /// Gets the inner `u32` value.
    #[must_use]
    pub const fn into_inner(self) -> u32 {
        self.0
    }

    /// Creates a [`RegionSize`] by clamping the given value into the supported range.
    #[must_use]
    pub const fn from_clamped(value: u32) -> Self {
        if value < Self::MIN.0 {
            Self::MIN
        } else if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }
}

impl Default for RegionSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for RegionSize {
    type Error = EngineError;

    fn try_from(value: u32) -> Result<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::out_of_range(
                "regionSize",
                value,
                Self::MIN.0,
                Self::MAX.0,
            ))
        }
    }
}

impl Display for RegionSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// Sort key that orders items by descending pixel count.
///
/// Use with a stable sort (e.g., [`slice::sort_by_key`]) so that ties keep their input order.
#[must_use]
pub fn by_count_desc(count: u32) -> Reverse<u32> {
    Reverse(count)
}

/// Sort key that orders items by descending percentage.
///
/// `NaN` sorts last. Use with a stable sort so that ties keep their input order.
#[must_use]
pub fn by_percentage_desc(percentage: f64) -> Reverse<ordered_float::OrderedFloat<f64>> {
    Reverse(ordered_float::OrderedFloat(if percentage.is_nan() {
        f64::NEG_INFINITY
    } else {
        percentage
    }))
}
