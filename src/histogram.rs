//! Contains the code for counting the distinct visible colors of a pixel buffer.

use crate::{
    by_count_desc, error::saturating_i64, traits::ZeroedIsZero, ColorSample, EngineError,
    PixelBuffer, Result, Window,
};
use bitvec::vec::BitVec;
use log::{debug, info};
use palette::{Srgb, Srgba};
use std::{
    fmt::{self, Display},
    ops::Range,
};

/// One distinct visible color and how often it occurs.
///
/// The percentage is relative to the number of visible pixels of the extraction pass
/// that created the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramEntry {
    /// The color, with the alpha of its first visible occurrence.
    color: ColorSample,
    /// The number of pixels with this RGB value.
    count: u32,
    /// `100 * count / visible_pixels`.
    percentage: f64,
}

impl HistogramEntry {
    /// Creates an entry directly, e.g., for testing or for callers with their own counts.
    #[must_use]
    pub fn new(color: ColorSample, count: u32, percentage: f64) -> Self {
        Self { color, count, percentage }
    }

    /// The color of this entry.
    #[must_use]
    pub fn color(&self) -> &ColorSample {
        &self.color
    }

    /// The number of pixels with this color.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The share of visible pixels with this color, in percent.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// The CIELAB components of the color.
    #[must_use]
    pub fn lab_components(&self) -> [f32; 3] {
        self.color.lab_components()
    }
}

impl Display for HistogramEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} pixels ({:.2}%)",
            self.color.hex(),
            self.count,
            self.percentage
        )
    }
}

/// The frequency table of the visible colors in a pixel buffer (or a window of one).
///
/// Entries are unique by RGB and sorted by descending count.
/// Ties are ordered by ascending RGB value, so the order is fully deterministic.
///
/// # Examples
/// ```
/// # use huepick::{Histogram, PixelBuffer, DEFAULT_ALPHA_THRESHOLD};
/// # use palette::Srgba;
/// # fn main() -> Result<(), huepick::EngineError> {
/// let mut pixels = vec![Srgba::new(255, 0, 0, 255); 7];
/// pixels.extend([Srgba::new(0, 0, 255, 255); 3]);
/// let buffer = PixelBuffer::new(10, 1, &pixels)?;
///
/// let histogram = Histogram::new(buffer, DEFAULT_ALPHA_THRESHOLD);
/// let percentages = histogram.entries().iter().map(|e| e.percentage()).collect::<Vec<_>>();
/// assert_eq!(percentages, vec![70.0, 30.0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    /// The distinct visible colors.
    entries: Vec<HistogramEntry>,
    /// The number of pixels that were read.
    total_pixels: u32,
    /// The number of pixels with an alpha of at least the threshold.
    visible_pixels: u32,
    /// The number of pixels with an alpha below the threshold.
    transparent_pixels: u32,
}

/// A byte-sized Radix
const RADIX: usize = u8::MAX as usize + 1;

/// Returns the range associated with the `i`-th chunk.
#[inline]
fn chunk_range(chunks: &[u32], i: usize) -> Range<usize> {
    (chunks[i] as usize)..(chunks[i + 1] as usize)
}

/// Computes the prefix sum of the array in place.
#[inline]
fn prefix_sum<const M: usize>(counts: &mut [u32; M]) {
    for i in 1..M {
        counts[i] += counts[i - 1];
    }
}

/// Deduplicates visible `[r, g, b, a]` pixels, returning each distinct RGB value
/// with the alpha of its first occurrence and its count.
///
/// The output is sorted by ascending RGB value.
fn count_unique(pixels: &[[u8; 4]]) -> Vec<(ColorSample, u32)> {
    let mut unique = Vec::new();

    #[allow(clippy::cast_possible_truncation)]
    let color = |r: usize, g: usize, b: usize, a: u8| {
        ColorSample::from_srgb_alpha(Srgb::new(r as u8, g as u8, b as u8), a)
    };

    let mut red_prefix = <[u32; RADIX + 1]>::box_zeroed();
    for &[r, ..] in pixels {
        red_prefix[usize::from(r)] += 1;
    }
    prefix_sum(&mut red_prefix);

    let mut green_blue = vec![[0; 3]; pixels.len()];
    for &[r, g, b, a] in pixels {
        let r = usize::from(r);
        let j = red_prefix[r] - 1;
        green_blue[j as usize] = [g, b, a];
        red_prefix[r] = j;
    }
    #[allow(clippy::cast_possible_truncation)]
    {
        red_prefix[RADIX] = pixels.len() as u32;
    }

    let mut lower_counts = <[[u32; RADIX]; RADIX]>::box_zeroed();
    let mut first_alpha = <[[u8; RADIX]; RADIX]>::box_zeroed();
    let mut bitmask: BitVec = BitVec::repeat(false, RADIX * RADIX);

    for r in 0..RADIX {
        let chunk = chunk_range(red_prefix.as_slice(), r);
        if chunk.is_empty() {
            continue;
        }

        // the scatter above reverses each red chunk, so walk it backwards to see pixels in order
        let green_blue = &green_blue[chunk.clone()];

        if chunk.len() < RADIX * RADIX / 4 {
            for &[g, b, a] in green_blue.iter().rev() {
                let [g, b] = [g, b].map(usize::from);
                if lower_counts[g][b] == 0 {
                    first_alpha[g][b] = a;
                }
                lower_counts[g][b] += 1;
                bitmask.set(g * RADIX + b, true);
            }

            for i in bitmask.iter_ones() {
                let g = i / RADIX;
                let b = i % RADIX;
                unique.push((color(r, g, b, first_alpha[g][b]), lower_counts[g][b]));
                lower_counts[g][b] = 0;
            }

            bitmask.fill(false);
        } else {
            for &[g, b, a] in green_blue.iter().rev() {
                let [g, b] = [g, b].map(usize::from);
                if lower_counts[g][b] == 0 {
                    first_alpha[g][b] = a;
                }
                lower_counts[g][b] += 1;
            }

            for (g, counts) in lower_counts.iter_mut().enumerate() {
                for (b, count) in counts.iter_mut().enumerate() {
                    if *count > 0 {
                        unique.push((color(r, g, b, first_alpha[g][b]), *count));
                        *count = 0;
                    }
                }
            }
        }
    }

    unique
}

impl Histogram {
    /// Counts every visible color in the buffer.
    ///
    /// Pixels with an alpha below `alpha_threshold` are counted as transparent and excluded
    /// from both the entries and the denominator used for percentages.
    #[must_use]
    pub fn new(buffer: PixelBuffer, alpha_threshold: u8) -> Self {
        Self::from_window(buffer, buffer.full_window(), alpha_threshold)
    }

    /// Counts every visible color inside `window` of the buffer.
    ///
    /// The window is clipped to the buffer.
    #[must_use]
    pub fn from_window(buffer: PixelBuffer, window: Window, alpha_threshold: u8) -> Self {
        debug!(
            "counting colors of {}x{} window at ({}, {})",
            window.width, window.height, window.x, window.y
        );
        Self::from_pixels(buffer.window_pixels(window), alpha_threshold)
    }

    /// Counts every visible color in the given pixels.
    fn from_pixels(pixels: impl Iterator<Item = Srgba<u8>>, alpha_threshold: u8) -> Self {
        let mut total_pixels = 0u32;
        let mut transparent_pixels = 0u32;
        let mut visible = Vec::new();

        for pixel in pixels {
            total_pixels += 1;
            if pixel.alpha < alpha_threshold {
                transparent_pixels += 1;
            } else {
                visible.push([pixel.red, pixel.green, pixel.blue, pixel.alpha]);
            }
        }

        let visible_pixels = total_pixels - transparent_pixels;

        let mut entries = count_unique(&visible)
            .into_iter()
            .map(|(color, count)| {
                let percentage = if visible_pixels == 0 {
                    0.0
                } else {
                    100.0 * f64::from(count) / f64::from(visible_pixels)
                };
                HistogramEntry { color, count, percentage }
            })
            .collect::<Vec<_>>();

        entries.sort_by_key(|entry| by_count_desc(entry.count));

        info!(
            "color extraction complete: {} unique colors from {total_pixels} pixels \
            ({visible_pixels} visible, {transparent_pixels} transparent)",
            entries.len()
        );

        Self {
            entries,
            total_pixels,
            visible_pixels,
            transparent_pixels,
        }
    }

    /// The distinct visible colors, most frequent first.
    #[must_use]
    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    /// Consumes the histogram, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<HistogramEntry> {
        self.entries
    }

    /// The `limit` most frequent entries (or all of them if there are fewer).
    pub fn top(&self, limit: usize) -> Result<&[HistogramEntry]> {
        if limit == 0 {
            Err(EngineError::out_of_range(
                "limit",
                0,
                1,
                saturating_i64(usize::MAX),
            ))
        } else {
            Ok(&self.entries[..limit.min(self.entries.len())])
        }
    }

    /// The number of distinct visible colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no visible pixels were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of pixels that were read.
    #[must_use]
    pub fn total_pixels(&self) -> u32 {
        self.total_pixels
    }

    /// The number of visible pixels, the denominator of every entry's percentage.
    #[must_use]
    pub fn visible_pixels(&self) -> u32 {
        self.visible_pixels
    }

    /// The number of pixels below the alpha threshold.
    #[must_use]
    pub fn transparent_pixels(&self) -> u32 {
        self.transparent_pixels
    }

    /// Summary statistics, or `None` if there are no visible pixels.
    #[must_use]
    pub fn stats(&self) -> Option<HistogramStats> {
        let most_common = self.entries.first()?.clone();
        let least_common = self.entries.last()?.clone();
        Some(HistogramStats {
            total_pixels: self.total_pixels,
            visible_pixels: self.visible_pixels,
            transparent_pixels: self.transparent_pixels,
            unique_colors: self.entries.len(),
            most_common,
            least_common,
        })
    }
}

/// Summary statistics of a [`Histogram`], rendered as a report by its [`Display`] impl.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramStats {
    /// The number of pixels that were read.
    pub total_pixels: u32,
    /// The number of visible pixels.
    pub visible_pixels: u32,
    /// The number of transparent pixels.
    pub transparent_pixels: u32,
    /// The number of distinct visible colors.
    pub unique_colors: usize,
    /// The most frequent color.
    pub most_common: HistogramEntry,
    /// The least frequent color.
    pub least_common: HistogramEntry,
}

impl HistogramStats {
    /// The average number of pixels per distinct color.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_pixels_per_color(&self) -> f64 {
        f64::from(self.visible_pixels) / self.unique_colors as f64
    }
}

impl Display for HistogramStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let share = |n: u32| 100.0 * f64::from(n) / f64::from(self.total_pixels.max(1));
        let least = &self.least_common;
        writeln!(f, "Color Analysis Report")?;
        writeln!(f, "=====================")?;
        writeln!(f, "Pixels: {}", self.total_pixels)?;
        writeln!(
            f,
            "Visible Pixels: {} ({:.1}%)",
            self.visible_pixels,
            share(self.visible_pixels)
        )?;
        writeln!(
            f,
            "Transparent Pixels: {} ({:.1}%)",
            self.transparent_pixels,
            share(self.transparent_pixels)
        )?;
        writeln!(f, "Unique Colors: {}", self.unique_colors)?;
        writeln!(f, "Most common: {}", self.most_common)?;
        writeln!(
            f,
            "Least common: {} ({} pixel{}, {:.2}%)",
            least.color.hex(),
            least.count,
            if least.count == 1 { "" } else { "s" },
            least.percentage
        )?;
        write!(
            f,
            "Average pixels per color: {:.1}",
            self.average_pixels_per_color()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use std::collections::HashSet;

    fn assert_valid(histogram: &Histogram) {
        let rgb = histogram
            .entries()
            .iter()
            .map(|e| e.color().rgb())
            .collect::<HashSet<_>>();
        assert_eq!(rgb.len(), histogram.len());

        let counts = histogram.entries().iter().map(HistogramEntry::count).sum::<u32>();
        assert_eq!(counts, histogram.visible_pixels());
        assert_eq!(
            histogram.visible_pixels() + histogram.transparent_pixels(),
            histogram.total_pixels()
        );

        if !histogram.is_empty() {
            let total = histogram
                .entries()
                .iter()
                .map(HistogramEntry::percentage)
                .sum::<f64>();
            assert!((total - 100.0).abs() < 1e-6);
        }

        for pair in histogram.entries().windows(2) {
            assert!(pair[0].count() >= pair[1].count());
            if pair[0].count() == pair[1].count() {
                assert!(pair[0].color().rgb() < pair[1].color().rgb());
            }
        }
    }

    #[test]
    fn solid_color() {
        let pixels = solid(10, 10, [12, 34, 56, 255]);
        let histogram = Histogram::new(buffer(10, 10, &pixels), 128);
        assert_valid(&histogram);
        assert_eq!(histogram.len(), 1);
        let entry = &histogram.entries()[0];
        assert_eq!(entry.color().rgb(), [12, 34, 56]);
        assert_eq!(entry.count(), 100);
        assert!((entry.percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn seventy_thirty_split() {
        let pixels = split(10, 10, [255, 0, 0, 255], [0, 0, 255, 255], 70);
        let histogram = Histogram::new(buffer(10, 10, &pixels), 128);
        assert_valid(&histogram);
        let summary = histogram
            .entries()
            .iter()
            .map(|e| (e.color().rgb(), e.count()))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![([255, 0, 0], 70), ([0, 0, 255], 30)]);
        assert!((histogram.entries()[0].percentage() - 70.0).abs() < 1e-9);
        assert!((histogram.entries()[1].percentage() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn transparent_pixels_are_excluded() {
        let mut pixels = solid(4, 4, [10, 10, 10, 255]);
        for pixel in &mut pixels[..8] {
            *pixel = Srgba::new(200, 0, 0, 127);
        }
        let histogram = Histogram::new(buffer(4, 4, &pixels), 128);
        assert_valid(&histogram);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram.transparent_pixels(), 8);
        assert_eq!(histogram.visible_pixels(), 8);
        assert!((histogram.entries()[0].percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fully_transparent() {
        let pixels = solid(3, 3, [1, 2, 3, 0]);
        let histogram = Histogram::new(buffer(3, 3, &pixels), 128);
        assert!(histogram.is_empty());
        assert_eq!(histogram.visible_pixels(), 0);
        assert_eq!(histogram.transparent_pixels(), 9);
        assert!(histogram.stats().is_none());
    }

    #[test]
    fn alpha_of_first_occurrence() {
        let pixels = vec![
            Srgba::new(9, 9, 9, 200),
            Srgba::new(9, 9, 9, 255),
            Srgba::new(9, 9, 9, 130),
        ];
        let histogram = Histogram::new(buffer(3, 1, &pixels), 128);
        let alpha = histogram.entries()[0].color().alpha();
        assert!((alpha - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn random_data() {
        let pixels = test_data_1024();
        let histogram = Histogram::new(buffer(32, 32, &pixels), 128);
        assert_valid(&histogram);
    }

    #[test]
    fn single_red_chunk() {
        // enough pixels with the same red component to take the dense path
        let pixels = test_data_1024()
            .into_iter()
            .map(|p| Srgba::new(7, p.green, p.blue, 255))
            .collect::<Vec<_>>();
        let pixels = [pixels.as_slice(); 16].concat();
        let histogram = Histogram::new(buffer(128, 128, &pixels), 128);
        assert_valid(&histogram);
        assert!(histogram.entries().iter().all(|e| e.count() % 16 == 0));
        assert!(histogram.entries().iter().all(|e| e.color().red() == 7));
    }

    #[test]
    fn window_extraction() {
        let pixels = split(10, 10, [255, 0, 0, 255], [0, 255, 0, 255], 50);
        let buffer = buffer(10, 10, &pixels);
        let window = Window { x: 0, y: 0, width: 10, height: 2 };
        let histogram = Histogram::from_window(buffer, window, 128);
        assert_eq!(histogram.total_pixels(), 20);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram.entries()[0].color().rgb(), [255, 0, 0]);
    }

    #[test]
    fn top_and_stats() {
        let pixels = split(10, 10, [255, 0, 0, 255], [0, 0, 255, 255], 70);
        let histogram = Histogram::new(buffer(10, 10, &pixels), 128);
        assert_eq!(histogram.top(1).unwrap().len(), 1);
        assert_eq!(histogram.top(5).unwrap().len(), 2);
        assert!(histogram.top(0).is_err());

        let stats = histogram.stats().unwrap();
        assert_eq!(stats.most_common.color().hex(), "#FF0000");
        assert_eq!(stats.least_common.color().hex(), "#0000FF");
        assert!((stats.average_pixels_per_color() - 50.0).abs() < f64::EPSILON);
        let report = stats.to_string();
        assert!(report.contains("Unique Colors: 2"));
        assert!(report.contains("Most common: #FF0000: 70 pixels (70.00%)"));
    }
}
