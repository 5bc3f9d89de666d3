//! Contains the builder struct for finding the dominant colors of an image.

use crate::{
    by_percentage_desc,
    kmeans::{self, Cluster, KmeansOptions},
    ColorSample, Histogram, HistogramEntry, MaxColors, PixelBuffer, Result,
    DEFAULT_ALPHA_THRESHOLD, MIN_COLORS_FOR_CLUSTERING,
};
use log::info;
use std::fmt::{self, Display};

/// One of the most representative colors of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantColor {
    /// The representative color.
    color: ColorSample,
    /// The share of visible pixels represented by this color, in percent.
    percentage: f64,
    /// The number of visible pixels represented by this color.
    pixel_count: u32,
}

impl DominantColor {
    /// The representative color.
    #[must_use]
    pub fn color(&self) -> &ColorSample {
        &self.color
    }

    /// The share of visible pixels represented by this color, in percent.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// The number of visible pixels represented by this color.
    #[must_use]
    pub fn pixel_count(&self) -> u32 {
        self.pixel_count
    }
}

impl From<&HistogramEntry> for DominantColor {
    fn from(entry: &HistogramEntry) -> Self {
        Self {
            color: entry.color().clone(),
            percentage: entry.percentage(),
            pixel_count: entry.count(),
        }
    }
}

impl From<Cluster> for DominantColor {
    fn from(cluster: Cluster) -> Self {
        Self {
            color: cluster.center_color().clone(),
            percentage: cluster.total_percentage(),
            pixel_count: cluster.total_pixel_count(),
        }
    }
}

impl Display for DominantColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2}% ({} pixels)",
            self.color.hex(),
            self.percentage,
            self.pixel_count
        )
    }
}

/// A builder struct to specify options for finding the dominant colors of an image.
///
/// Images with only a few distinct colors (at most `max_colors`, or fewer than
/// `min_colors_for_clustering`) have their most frequent colors returned as-is.
/// All other images are clustered into exactly `max_colors` colors with k-means.
///
/// # Examples
/// ```
/// # use huepick::{DominantColorPipeline, PixelBuffer};
/// # use palette::Srgba;
/// # fn main() -> Result<(), huepick::EngineError> {
/// let mut pixels = vec![Srgba::new(255, 0, 0, 255); 70];
/// pixels.extend([Srgba::new(0, 0, 255, 255); 30]);
/// let buffer = PixelBuffer::new(10, 10, &pixels)?;
///
/// let colors = DominantColorPipeline::new(buffer)
///     .max_colors(5u8.try_into()?)
///     .dominant_colors();
///
/// assert_eq!(colors.len(), 2);
/// assert_eq!(colors[0].color().hex(), "#FF0000");
/// assert_eq!(colors[0].percentage(), 70.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DominantColorPipeline<'a> {
    /// The image to analyze.
    buffer: PixelBuffer<'a>,
    /// The maximum number of colors to return.
    max_colors: MaxColors,
    /// Pixels with an alpha below this are ignored.
    alpha_threshold: u8,
    /// Below this many distinct colors, clustering is skipped.
    min_colors_for_clustering: usize,
    /// The options for clustering.
    kmeans: KmeansOptions,
}

impl<'a> DominantColorPipeline<'a> {
    /// Creates a new [`DominantColorPipeline`] with default options.
    #[must_use]
    pub fn new(buffer: PixelBuffer<'a>) -> Self {
        Self {
            buffer,
            max_colors: MaxColors::default(),
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            min_colors_for_clustering: MIN_COLORS_FOR_CLUSTERING,
            kmeans: KmeansOptions::new(),
        }
    }

    /// Sets the maximum number of colors to return.
    ///
    /// The default is [`MaxColors::MAX`].
    #[must_use]
    pub fn max_colors(mut self, max_colors: MaxColors) -> Self {
        self.max_colors = max_colors;
        self
    }

    /// Sets the alpha value below which pixels are ignored.
    ///
    /// The default is [`DEFAULT_ALPHA_THRESHOLD`].
    #[must_use]
    pub fn alpha_threshold(mut self, alpha_threshold: u8) -> Self {
        self.alpha_threshold = alpha_threshold;
        self
    }

    /// Sets the number of distinct colors below which clustering is skipped.
    ///
    /// The default is [`MIN_COLORS_FOR_CLUSTERING`].
    #[must_use]
    pub fn min_colors_for_clustering(mut self, min_colors: usize) -> Self {
        self.min_colors_for_clustering = min_colors;
        self
    }

    /// Sets the options used for k-means clustering.
    #[must_use]
    pub fn kmeans_options(mut self, options: KmeansOptions) -> Self {
        self.kmeans = options;
        self
    }

    /// Whether `distinct` colors are few enough to return unclustered.
    fn is_simple(&self, distinct: usize) -> bool {
        distinct <= usize::from(self.max_colors) || distinct < self.min_colors_for_clustering
    }

    /// Shared driver for the sequential and parallel versions.
    fn run(
        &self,
        cluster: impl FnOnce(&[HistogramEntry], usize, KmeansOptions) -> Result<Vec<Cluster>>,
    ) -> Vec<DominantColor> {
        let Self { buffer, max_colors, alpha_threshold, kmeans, .. } = *self;
        let max_colors = usize::from(max_colors);

        info!(
            "starting dominant color extraction: {}x{} image, max colors: {max_colors}",
            buffer.width(),
            buffer.height()
        );

        let histogram = Histogram::new(buffer, alpha_threshold);
        let entries = histogram.entries();

        if entries.is_empty() {
            info!("no visible colors found in image");
            return Vec::new();
        }

        let natural = || {
            entries[..max_colors.min(entries.len())]
                .iter()
                .map(DominantColor::from)
                .collect::<Vec<_>>()
        };

        let mut colors = if self.is_simple(entries.len()) {
            info!(
                "returning the {} most frequent colors without clustering",
                max_colors.min(entries.len())
            );
            natural()
        } else {
            // entries.len() > max_colors >= 1, so clustering cannot fail
            cluster(entries, max_colors, kmeans).map_or_else(
                |_| natural(),
                |clusters| clusters.into_iter().map(DominantColor::from).collect(),
            )
        };

        colors.sort_by_key(|color| by_percentage_desc(color.percentage));

        info!(
            "dominant color extraction complete: {} colors covering {:.1}% of pixels",
            colors.len(),
            coverage(&colors)
        );

        colors
    }

    /// Finds the dominant colors, sorted by descending percentage.
    ///
    /// At most `max_colors` colors are returned.
    /// An image without visible pixels gives an empty list.
    #[must_use]
    pub fn dominant_colors(&self) -> Vec<DominantColor> {
        self.run(kmeans::cluster)
    }

    /// Finds the dominant colors in parallel, sorted by descending percentage.
    ///
    /// The output is identical to [`DominantColorPipeline::dominant_colors`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn dominant_colors_par(&self) -> Vec<DominantColor> {
        self.run(kmeans::cluster_par)
    }

    /// Creates a report of `colors` for the image of this pipeline.
    #[must_use]
    pub fn report<'c>(&self, colors: &'c [DominantColor]) -> DominantColorReport<'c> {
        DominantColorReport {
            width: self.buffer.width(),
            height: self.buffer.height(),
            colors,
        }
    }
}

/// Finds the dominant colors of `buffer` with default options and the given maximum.
///
/// # Errors
/// Returns [`crate::EngineError::OutOfRange`] if `max_colors` is not in `1..=10`.
pub fn dominant_colors(buffer: PixelBuffer, max_colors: u8) -> Result<Vec<DominantColor>> {
    let max_colors = MaxColors::try_from(max_colors)?;
    Ok(DominantColorPipeline::new(buffer)
        .max_colors(max_colors)
        .dominant_colors())
}

/// The total percentage of visible pixels covered by `colors`.
#[must_use]
pub fn coverage(colors: &[DominantColor]) -> f64 {
    colors.iter().map(DominantColor::percentage).sum()
}

/// A printable summary of the dominant colors found in an image.
///
/// Created by [`DominantColorPipeline::report`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantColorReport<'c> {
    /// The width of the analyzed image.
    pub width: u32,
    /// The height of the analyzed image.
    pub height: u32,
    /// The dominant colors, in the order they were returned.
    pub colors: &'c [DominantColor],
}

impl DominantColorReport<'_> {
    /// The total percentage of visible pixels covered by the colors.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        coverage(self.colors)
    }
}

impl Display for DominantColorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.colors.is_empty() {
            return write!(f, "No dominant colors extracted from image");
        }

        writeln!(f, "Dominant Color Extraction Report")?;
        writeln!(f, "================================")?;
        writeln!(f, "Image: {}x{} pixels", self.width, self.height)?;
        writeln!(f, "Dominant Colors Found: {}", self.colors.len())?;
        writeln!(f)?;
        for (i, color) in self.colors.iter().enumerate() {
            writeln!(
                f,
                "{:>2}. {} - {} pixels ({:.2}%)",
                i + 1,
                color.color.hex(),
                color.pixel_count,
                color.percentage
            )?;
        }
        writeln!(f)?;
        write!(f, "Total Coverage: {:.1}% of visible pixels", self.coverage())
    }
}
