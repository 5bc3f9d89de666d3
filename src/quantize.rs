//! Greedy Delta-E grouping of histogram entries.
//!
//! Entries are processed most frequent first. Each entry joins the *first* existing group
//! (in creation order) whose representative lies within the threshold, or else starts a new group.
//! This is a first-match policy and not a nearest-group search, so the output depends on
//! the order of the input entries.
//!
//! Every group representative is the pixel-weighted mean of its members taken in CIELAB,
//! mapped back into sRGB.
//!
//! # Examples
//! ```
//! # use huepick::{quantize::{quantize, QuantizeOptions}, HistogramEntry, ColorSample};
//! let entries = vec![
//!     HistogramEntry::new(ColorSample::new(200, 0, 0), 60, 60.0),
//!     HistogramEntry::new(ColorSample::new(0, 0, 200), 30, 30.0),
//!     HistogramEntry::new(ColorSample::new(201, 0, 0), 10, 10.0),
//! ];
//!
//! let quantization = quantize(&entries, QuantizeOptions::new());
//! assert_eq!(quantization.groups().len(), 2);
//! assert_eq!(quantization.groups()[0].total_count(), 70);
//! ```

use crate::{
    by_count_desc,
    colorspace::WeightedLabSum,
    ColorSample, HistogramEntry,
};
use log::{info, warn};
use std::fmt::{self, Display};

/// The default Delta-E threshold under which two colors are grouped together.
pub const DEFAULT_THRESHOLD: f32 = 3.0;

/// The default maximum number of groups.
pub const DEFAULT_MAX_GROUPS: usize = 500;

/// A warning is logged when more than this percentage of visible pixels is left ungrouped.
const UNCOVERED_WARNING_PERCENTAGE: f64 = 10.0;

/// Options for [`quantize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizeOptions {
    /// The Delta-E threshold for joining a group.
    threshold: f32,
    /// The maximum number of groups.
    max_groups: usize,
}

impl QuantizeOptions {
    /// Create a new [`QuantizeOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_groups: DEFAULT_MAX_GROUPS,
        }
    }

    /// Sets the Delta-E threshold for joining a group.
    ///
    /// An entry joins a group if its distance to the group's representative
    /// is less than or equal to this value.
    ///
    /// The default threshold is `3.0`.
    #[must_use]
    pub const fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the maximum number of groups.
    ///
    /// Once this many groups exist, the remaining entries are left ungrouped.
    /// A value of `0` is treated as `1`.
    ///
    /// The default maximum is `500`.
    #[must_use]
    pub const fn max_groups(mut self, max_groups: usize) -> Self {
        self.max_groups = if max_groups == 0 { 1 } else { max_groups };
        self
    }

    /// The Delta-E threshold for joining a group.
    #[must_use]
    pub const fn get_threshold(&self) -> f32 {
        self.threshold
    }

    /// The maximum number of groups.
    #[must_use]
    pub const fn get_max_groups(&self) -> usize {
        self.max_groups
    }
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A bucket of perceptually similar histogram entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGroup {
    /// The entries in the order they joined.
    members: Vec<HistogramEntry>,
    /// The weighted CIELAB mean of the members, mapped back to sRGB.
    representative: ColorSample,
    /// The running weighted sum used to recompute `representative`.
    lab_sum: WeightedLabSum,
    /// The sum of member counts.
    total_count: u32,
    /// The sum of member percentages.
    total_percentage: f64,
}

impl ColorGroup {
    /// Starts a group with a single entry, whose color becomes the representative.
    fn new(entry: HistogramEntry) -> Self {
        let mut lab_sum = WeightedLabSum::default();
        lab_sum.add(entry.lab_components(), entry.count());
        Self {
            representative: entry.color().clone(),
            lab_sum,
            total_count: entry.count(),
            total_percentage: entry.percentage(),
            members: vec![entry],
        }
    }

    /// Adds an entry and recomputes the representative.
    fn add(&mut self, entry: HistogramEntry) {
        self.lab_sum.add(entry.lab_components(), entry.count());
        self.total_count += entry.count();
        self.total_percentage += entry.percentage();
        self.members.push(entry);

        if let Some(mean) = self.lab_sum.mean() {
            self.representative = ColorSample::from_lab_components(mean);
        }
    }

    /// The representative color of the group.
    #[must_use]
    pub fn representative(&self) -> &ColorSample {
        &self.representative
    }

    /// The member entries in the order they joined the group.
    #[must_use]
    pub fn members(&self) -> &[HistogramEntry] {
        &self.members
    }

    /// The total number of pixels across all members.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// The total percentage of visible pixels across all members.
    #[must_use]
    pub fn total_percentage(&self) -> f64 {
        self.total_percentage
    }
}

impl Display for ColorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} colors, {} pixels ({:.2}%)",
            self.representative.hex(),
            self.members.len(),
            self.total_count,
            self.total_percentage
        )
    }
}

/// The output of [`quantize`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quantization {
    /// The groups, sorted by descending total count.
    groups: Vec<ColorGroup>,
    /// The number of entries in the input.
    input_colors: usize,
    /// The number of input entries that were placed into a group.
    processed: usize,
    /// The percentage of visible pixels belonging to entries that were never processed.
    uncovered_percentage: f64,
}

impl Quantization {
    /// The groups, sorted by descending total count.
    #[must_use]
    pub fn groups(&self) -> &[ColorGroup] {
        &self.groups
    }

    /// Consumes the quantization, returning its groups.
    #[must_use]
    pub fn into_groups(self) -> Vec<ColorGroup> {
        self.groups
    }

    /// The representative color of each group, in group order.
    #[must_use]
    pub fn representatives(&self) -> Vec<ColorSample> {
        self.groups
            .iter()
            .map(|group| group.representative.clone())
            .collect()
    }

    /// The number of entries given to [`quantize`].
    #[must_use]
    pub fn input_colors(&self) -> usize {
        self.input_colors
    }

    /// The number of entries that were placed into a group.
    ///
    /// This is less than [`Quantization::input_colors`] only when the group limit was reached.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// The percentage of visible pixels left ungrouped because the group limit was reached.
    #[must_use]
    pub fn uncovered_percentage(&self) -> f64 {
        self.uncovered_percentage
    }

    /// The ratio of input colors to groups.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compression_ratio(&self) -> f64 {
        if self.groups.is_empty() {
            0.0
        } else {
            self.input_colors as f64 / self.groups.len() as f64
        }
    }
}

impl Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quantization Report")?;
        writeln!(f, "===================")?;
        writeln!(f, "Input colors: {}", self.input_colors)?;
        writeln!(f, "Groups: {}", self.groups.len())?;
        write!(f, "Compression ratio: {:.1}:1", self.compression_ratio())?;
        if let (Some(largest), Some(smallest)) = (self.groups.first(), self.groups.last()) {
            write!(f, "\nLargest group: {largest}")?;
            write!(f, "\nSmallest group: {smallest}")?;
        }
        if self.processed < self.input_colors {
            write!(
                f,
                "\nUngrouped: {} colors ({:.2}% of pixels)",
                self.input_colors - self.processed,
                self.uncovered_percentage
            )?;
        }
        Ok(())
    }
}

/// Groups count-sorted histogram entries by Delta-E distance.
///
/// The sum of the group counts equals the sum of the counts of all processed entries.
/// Each member was within `options.threshold` of its group's representative
/// at the time it joined.
///
/// When the group limit is reached, processing stops and the remaining entries
/// are reported through [`Quantization::uncovered_percentage`].
#[must_use]
pub fn quantize(entries: &[HistogramEntry], options: QuantizeOptions) -> Quantization {
    let QuantizeOptions { threshold, max_groups } = options;

    let mut groups: Vec<ColorGroup> = Vec::new();
    let mut processed = 0;

    for entry in entries {
        let color = entry.color();
        match groups
            .iter_mut()
            .find(|group| color.delta_e(&group.representative) <= threshold)
        {
            Some(group) => group.add(entry.clone()),
            None => groups.push(ColorGroup::new(entry.clone())),
        }

        processed += 1;

        if groups.len() >= max_groups {
            break;
        }
    }

    let uncovered_percentage = entries[processed..]
        .iter()
        .map(HistogramEntry::percentage)
        .sum::<f64>();

    if processed < entries.len() {
        info!(
            "reached the limit of {max_groups} groups, {} colors ({uncovered_percentage:.2}% of pixels) left ungrouped",
            entries.len() - processed
        );
        if uncovered_percentage > UNCOVERED_WARNING_PERCENTAGE {
            warn!(
                "{uncovered_percentage:.1}% of pixels are not covered by any group, consider a larger threshold"
            );
        }
    }

    groups.sort_by_key(|group| by_count_desc(group.total_count));

    info!(
        "quantization complete: {} colors reduced to {} groups (threshold {threshold})",
        entries.len(),
        groups.len()
    );

    Quantization {
        groups,
        input_colors: entries.len(),
        processed,
        uncovered_percentage,
    }
}

/// Merges all entries into exactly one group, regardless of distance.
///
/// Returns `None` if `entries` is empty.
#[must_use]
pub fn single_group(entries: &[HistogramEntry]) -> Option<ColorGroup> {
    let (first, rest) = entries.split_first()?;
    let mut group = ColorGroup::new(first.clone());
    for entry in rest {
        group.add(entry.clone());
    }
    Some(group)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, Histogram};

    fn entry(rgb: [u8; 3], count: u32, percentage: f64) -> HistogramEntry {
        let [r, g, b] = rgb;
        HistogramEntry::new(ColorSample::new(r, g, b), count, percentage)
    }

    #[test]
    fn near_colors_are_grouped() {
        let entries = vec![
            entry([200, 0, 0], 50, 50.0),
            entry([0, 0, 200], 30, 30.0),
            entry([201, 1, 0], 15, 15.0),
            entry([0, 0, 201], 5, 5.0),
        ];
        let quantization = quantize(&entries, QuantizeOptions::new());
        let groups = quantization.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].total_count(), 65);
        assert_eq!(groups[1].total_count(), 35);
        assert_eq!(groups[0].members().len(), 2);
        assert_eq!(
            quantization.representatives(),
            vec![groups[0].representative().clone(), groups[1].representative().clone()]
        );
        assert_eq!(quantization.processed(), 4);
        assert!(quantization.uncovered_percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn first_match_wins_over_nearest() {
        // B is within range of both A and C's group, but A's group was created first
        let a = ColorSample::new(100, 100, 100);
        let c = ColorSample::new(106, 106, 106);
        let b = ColorSample::new(104, 104, 104);
        let threshold = a.delta_e(&c) - 0.01;
        assert!(b.delta_e(&a) <= threshold && b.delta_e(&c) < b.delta_e(&a));

        let entries = vec![
            HistogramEntry::new(a, 10, 50.0),
            HistogramEntry::new(c, 6, 30.0),
            HistogramEntry::new(b, 4, 20.0),
        ];
        let groups = quantize(&entries, QuantizeOptions::new().threshold(threshold)).into_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].total_count(), 14);
        assert_eq!(groups[1].total_count(), 6);
    }

    #[test]
    fn representative_is_weighted_lab_mean() {
        let entries = vec![entry([100, 100, 100], 3, 75.0), entry([102, 102, 102], 1, 25.0)];
        let group = single_group(&entries).unwrap();
        let mut expected = WeightedLabSum::default();
        expected.add(entries[0].lab_components(), 3);
        expected.add(entries[1].lab_components(), 1);
        let expected = ColorSample::from_lab_components(expected.mean().unwrap());
        assert_eq!(group.representative().rgb(), expected.rgb());
        assert!((group.total_percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn group_limit_stops_processing() {
        let entries = vec![
            entry([255, 0, 0], 40, 40.0),
            entry([0, 255, 0], 30, 30.0),
            entry([0, 0, 255], 20, 20.0),
            entry([255, 255, 0], 10, 10.0),
        ];
        let quantization = quantize(&entries, QuantizeOptions::new().max_groups(2));
        assert_eq!(quantization.groups().len(), 2);
        assert_eq!(quantization.processed(), 2);
        assert!((quantization.uncovered_percentage() - 30.0).abs() < 1e-9);
        assert!(quantization.to_string().contains("Ungrouped: 2 colors"));
    }

    #[test]
    fn counts_are_preserved() {
        let pixels = test_data_1024();
        let histogram = Histogram::new(buffer(32, 32, &pixels), 128);
        for threshold in [0.0, 3.0, 20.0, 100.0] {
            let options = QuantizeOptions::new()
                .threshold(threshold)
                .max_groups(usize::MAX);
            let quantization = quantize(histogram.entries(), options);
            let grouped = quantization
                .groups()
                .iter()
                .map(ColorGroup::total_count)
                .sum::<u32>();
            assert_eq!(grouped, histogram.visible_pixels());
            for pair in quantization.groups().windows(2) {
                assert!(pair[0].total_count() >= pair[1].total_count());
            }
        }
    }

    #[test]
    fn members_joined_within_threshold() {
        let pixels = test_data_1024();
        let histogram = Histogram::new(buffer(32, 32, &pixels), 128);
        for threshold in [3.0, 10.0, 25.0] {
            let options = QuantizeOptions::new().threshold(threshold).max_groups(usize::MAX);
            let quantization = quantize(histogram.entries(), options);
            assert!(quantization.groups().iter().any(|group| group.members().len() > 1));

            for group in quantization.groups() {
                // replay the group's growth, checking each member against the representative it saw
                let (first, rest) = group.members().split_first().unwrap();
                let mut sum = WeightedLabSum::default();
                sum.add(first.lab_components(), first.count());
                let mut representative = first.color().clone();
                for member in rest {
                    assert!(member.color().delta_e(&representative) <= threshold);
                    sum.add(member.lab_components(), member.count());
                    representative = ColorSample::from_lab_components(sum.mean().unwrap());
                }
                assert_eq!(&representative, group.representative());
            }
        }
    }

    #[test]
    fn zero_threshold_keeps_distinct_colors() {
        let pixels = test_data_1024();
        let histogram = Histogram::new(buffer(32, 32, &pixels), 128);
        let options = QuantizeOptions::new().threshold(0.0).max_groups(usize::MAX);
        let quantization = quantize(histogram.entries(), options);
        assert_eq!(quantization.groups().len(), histogram.len());
    }

    #[test]
    fn empty_input() {
        let quantization = quantize(&[], QuantizeOptions::new());
        assert!(quantization.groups().is_empty());
        assert!(single_group(&[]).is_none());
        assert!(quantization.compression_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn single_group_merges_everything() {
        let entries = vec![
            entry([255, 0, 0], 5, 50.0),
            entry([0, 255, 0], 3, 30.0),
            entry([0, 0, 255], 2, 20.0),
        ];
        let group = single_group(&entries).unwrap();
        assert_eq!(group.members().len(), 3);
        assert_eq!(group.total_count(), 10);
    }
}
