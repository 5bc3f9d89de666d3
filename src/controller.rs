//! The user-curated palette of an image.

use crate::{
    error::saturating_i64, region::PickedColor, ColorSample, DominantColor, EngineError, Result,
};
use log::{debug, info};
use std::fmt::{self, Display};

/// Where a palette color came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Provenance {
    /// Found by dominant color extraction.
    Extracted {
        /// The share of visible pixels the color represented, in percent.
        percentage: f64,
        /// The number of visible pixels the color represented.
        pixel_count: u32,
    },
    /// Picked by the user as a single pixel.
    ExactPick,
    /// Picked by the user as the average of a region.
    RegionPick,
}

impl Provenance {
    /// Whether the color was picked by the user, rather than extracted.
    #[must_use]
    pub fn is_user_picked(&self) -> bool {
        !matches!(self, Self::Extracted { .. })
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extracted { percentage, .. } => write!(f, "Dominant ({percentage:.1}%)"),
            Self::ExactPick => write!(f, "User Pick (Exact)"),
            Self::RegionPick => write!(f, "User Pick (Region)"),
        }
    }
}

/// A color in a [`PaletteController`] and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    /// The color.
    color: ColorSample,
    /// Where the color came from.
    provenance: Provenance,
}

impl PaletteEntry {
    /// The color.
    #[must_use]
    pub fn color(&self) -> &ColorSample {
        &self.color
    }

    /// Where the color came from.
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Whether the color was picked by the user.
    #[must_use]
    pub fn is_user_picked(&self) -> bool {
        self.provenance.is_user_picked()
    }
}

impl Display for PaletteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.color.hex(), self.provenance)
    }
}

/// Options for a [`PaletteController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteOptions {
    /// The maximum number of colors.
    capacity: usize,
    /// Colors within this Delta-E of an existing color are rejected.
    similarity_threshold: f32,
}

impl PaletteOptions {
    /// Create a new [`PaletteOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: 10,
            similarity_threshold: 10.0,
        }
    }

    /// Sets the maximum number of colors in the palette.
    ///
    /// The default is `10`.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the Delta-E distance at or below which two colors count as duplicates.
    ///
    /// The default is `10.0`.
    #[must_use]
    pub const fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered, capacity-bounded list of colors with no two colors
/// within the similarity threshold of each other.
///
/// # Examples
/// ```
/// # use huepick::{ColorSample, PaletteController, PaletteOptions, Provenance};
/// # fn main() -> Result<(), huepick::EngineError> {
/// let mut palette = PaletteController::new(PaletteOptions::new());
/// palette.add(ColorSample::new(255, 0, 0), Provenance::ExactPick)?;
///
/// let duplicate = palette.add(ColorSample::new(250, 5, 5), Provenance::ExactPick);
/// assert!(duplicate.unwrap_err().is_duplicate());
///
/// palette.remove(0)?;
/// palette.add(ColorSample::new(250, 5, 5), Provenance::ExactPick)?;
/// assert_eq!(palette.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteController {
    /// The colors, in insertion order.
    entries: Vec<PaletteEntry>,
    /// Capacity and similarity threshold.
    options: PaletteOptions,
    /// A label for the source image.
    image_name: String,
}

impl PaletteController {
    /// Creates an empty palette.
    #[must_use]
    pub fn new(options: PaletteOptions) -> Self {
        info!("created empty custom palette");
        Self {
            entries: Vec::new(),
            options,
            image_name: "Custom Palette".to_owned(),
        }
    }

    /// Creates a palette from the output of dominant color extraction.
    ///
    /// Colors are added in order. A color is skipped if the palette is full
    /// or it is too similar to a color added before it.
    #[must_use]
    pub fn from_dominant(colors: &[DominantColor], options: PaletteOptions) -> Self {
        let mut palette = Self {
            entries: Vec::new(),
            options,
            image_name: "Unnamed Image".to_owned(),
        };

        for color in colors {
            let provenance = Provenance::Extracted {
                percentage: color.percentage(),
                pixel_count: color.pixel_count(),
            };
            if let Err(err) = palette.check_add(color.color(), None) {
                debug!("skipping dominant color {}: {err}", color.color().hex());
            } else {
                palette.entries.push(PaletteEntry {
                    color: color.color().clone(),
                    provenance,
                });
            }
        }

        info!(
            "created palette with {} of {} dominant colors",
            palette.entries.len(),
            colors.len()
        );

        palette
    }

    /// Returns the first entry within the similarity threshold of `color`,
    /// skipping the entry at `exclude`.
    fn find_similar(&self, color: &ColorSample, exclude: Option<usize>) -> Option<(usize, f32)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|&(i, _)| Some(i) != exclude)
            .map(|(i, entry)| (i, color.delta_e(&entry.color)))
            .find(|&(_, delta_e)| delta_e <= self.options.similarity_threshold)
    }

    /// Rejects `color` if it would break the similarity invariant
    /// (or, when not replacing, the capacity invariant).
    fn check_add(&self, color: &ColorSample, replacing: Option<usize>) -> Result<()> {
        if replacing.is_none() && self.is_full() {
            return Err(EngineError::CapacityExceeded {
                capacity: self.options.capacity,
            });
        }

        match self.find_similar(color, replacing) {
            Some((index, delta_e)) => Err(EngineError::DuplicateRejected {
                index,
                existing: self.entries[index].color.hex(),
                delta_e,
            }),
            None => Ok(()),
        }
    }

    /// Ensures `index` refers to an entry.
    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(EngineError::out_of_range(
                "index",
                saturating_i64(index),
                0,
                saturating_i64(self.entries.len()) - 1,
            ))
        }
    }

    /// Appends a color to the palette.
    ///
    /// # Errors
    /// Returns [`EngineError::CapacityExceeded`] if the palette is full,
    /// or [`EngineError::DuplicateRejected`] naming the first entry within the similarity threshold.
    pub fn add(&mut self, color: ColorSample, provenance: Provenance) -> Result<&PaletteEntry> {
        self.check_add(&color, None)?;

        info!("added {} ({provenance}) to palette", color.hex());

        self.entries.push(PaletteEntry { color, provenance });
        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Appends a picked color to the palette.
    ///
    /// # Errors
    /// See [`PaletteController::add`].
    pub fn add_picked(&mut self, picked: PickedColor) -> Result<&PaletteEntry> {
        let (color, provenance) = picked.into_parts();
        self.add(color, provenance)
    }

    /// Removes and returns the entry at `index`, shifting later entries down.
    ///
    /// # Errors
    /// Returns [`EngineError::OutOfRange`] if `index` is not in `0..len`.
    pub fn remove(&mut self, index: usize) -> Result<PaletteEntry> {
        self.check_index(index)?;
        let removed = self.entries.remove(index);
        info!("removed {} from palette (was at index {index})", removed.color.hex());
        Ok(removed)
    }

    /// Replaces the entry at `index`, returning the old entry.
    ///
    /// The similarity check ignores the entry being replaced.
    ///
    /// # Errors
    /// Returns [`EngineError::OutOfRange`] if `index` is not in `0..len`,
    /// or [`EngineError::DuplicateRejected`] if `color` is within the similarity threshold
    /// of any other entry.
    pub fn replace(
        &mut self,
        index: usize,
        color: ColorSample,
        provenance: Provenance,
    ) -> Result<PaletteEntry> {
        self.check_index(index)?;
        self.check_add(&color, Some(index))?;

        let old = std::mem::replace(&mut self.entries[index], PaletteEntry { color, provenance });

        info!(
            "replaced {} with {} at index {index}",
            old.color.hex(),
            self.entries[index].color.hex()
        );

        Ok(old)
    }

    /// Replaces the entry at `index` with a picked color, returning the old entry.
    ///
    /// # Errors
    /// See [`PaletteController::replace`].
    pub fn replace_picked(&mut self, index: usize, picked: PickedColor) -> Result<PaletteEntry> {
        let (color, provenance) = picked.into_parts();
        self.replace(index, color, provenance)
    }

    /// The entries in order.
    #[must_use]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// The colors in order.
    pub fn colors(&self) -> impl Iterator<Item = &ColorSample> + '_ {
        self.entries.iter().map(PaletteEntry::color)
    }

    /// The number of colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette has no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether no more colors can be added.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.options.capacity
    }

    /// The maximum number of colors.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.options.capacity
    }

    /// The similarity threshold in Delta-E.
    #[must_use]
    pub fn similarity_threshold(&self) -> f32 {
        self.options.similarity_threshold
    }

    /// A label for the source image.
    #[must_use]
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Sets the label for the source image.
    pub fn set_image_name(&mut self, name: impl Into<String>) {
        self.image_name = name.into();
    }

    /// Counts of the palette's colors by origin.
    #[must_use]
    pub fn summary(&self) -> PaletteSummary {
        let user_picked = self.entries.iter().filter(|e| e.is_user_picked()).count();
        PaletteSummary {
            len: self.entries.len(),
            capacity: self.options.capacity,
            dominant: self.entries.len() - user_picked,
            user_picked,
        }
    }
}

/// Counts of a palette's colors by origin, see [`PaletteController::summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteSummary {
    /// The number of colors.
    pub len: usize,
    /// The maximum number of colors.
    pub capacity: usize,
    /// The number of extracted colors.
    pub dominant: usize,
    /// The number of user-picked colors.
    pub user_picked: usize,
}

impl Display for PaletteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            write!(f, "Empty palette")
        } else {
            write!(
                f,
                "Palette: {}/{} colors ({} dominant, {} user-picked)",
                self.len, self.capacity, self.dominant, self.user_picked
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{dominant_colors, region, tests::*};

    fn distinct_colors() -> Vec<ColorSample> {
        [
            [255, 0, 0],
            [0, 255, 0],
            [0, 0, 255],
            [255, 255, 0],
            [0, 255, 255],
            [255, 0, 255],
            [0, 0, 0],
            [255, 255, 255],
            [128, 64, 0],
            [0, 128, 128],
            [128, 128, 255],
        ]
        .into_iter()
        .map(|[r, g, b]| ColorSample::new(r, g, b))
        .collect()
    }

    fn assert_no_duplicates(palette: &PaletteController) {
        for (i, a) in palette.entries().iter().enumerate() {
            for b in &palette.entries()[i + 1..] {
                assert!(a.color().delta_e(b.color()) > palette.similarity_threshold());
            }
        }
    }

    #[test]
    fn capacity_is_enforced() {
        let mut palette = PaletteController::new(PaletteOptions::new());
        let colors = distinct_colors();
        for color in &colors[..10] {
            palette.add(color.clone(), Provenance::ExactPick).unwrap();
        }
        assert!(palette.is_full());
        assert_eq!(
            palette.add(colors[10].clone(), Provenance::ExactPick).unwrap_err(),
            EngineError::CapacityExceeded { capacity: 10 }
        );
        assert_eq!(palette.len(), 10);
        assert_no_duplicates(&palette);
    }

    #[test]
    fn duplicates_name_the_blocking_entry() {
        let mut palette = PaletteController::new(PaletteOptions::new());
        palette.add(ColorSample::new(0, 0, 255), Provenance::RegionPick).unwrap();
        palette.add(ColorSample::new(255, 0, 0), Provenance::ExactPick).unwrap();
        match palette.add(ColorSample::new(250, 2, 2), Provenance::ExactPick) {
            Err(EngineError::DuplicateRejected { index, existing, delta_e }) => {
                assert_eq!(index, 1);
                assert_eq!(existing, "#FF0000");
                assert!(delta_e <= 10.0);
            }
            other => panic!("expected a duplicate rejection, got {other:?}"),
        }
    }

    #[test]
    fn remove_then_add() {
        let mut palette = PaletteController::new(PaletteOptions::new());
        palette.add(ColorSample::new(255, 0, 0), Provenance::ExactPick).unwrap();
        let similar = ColorSample::new(252, 3, 3);
        assert!(palette.add(similar.clone(), Provenance::ExactPick).is_err());
        let removed = palette.remove(0).unwrap();
        assert_eq!(removed.color().rgb(), [255, 0, 0]);
        assert!(palette.add(similar, Provenance::ExactPick).is_ok());
    }

    #[test]
    fn remove_out_of_range() {
        let mut palette = PaletteController::new(PaletteOptions::new());
        assert!(matches!(
            palette.remove(0),
            Err(EngineError::OutOfRange { what: "index", .. })
        ));
        palette.add(ColorSample::new(1, 2, 3), Provenance::ExactPick).unwrap();
        assert_eq!(
            palette.remove(1).unwrap_err(),
            EngineError::out_of_range("index", 1, 0, 0)
        );
    }

    #[test]
    fn replace_ignores_own_entry() {
        let mut palette = PaletteController::new(PaletteOptions::new());
        palette.add(ColorSample::new(255, 0, 0), Provenance::ExactPick).unwrap();
        palette.add(ColorSample::new(0, 0, 255), Provenance::ExactPick).unwrap();

        // similar to itself, which is fine
        let old = palette
            .replace(0, ColorSample::new(250, 0, 0), Provenance::RegionPick)
            .unwrap();
        assert_eq!(old.color().rgb(), [255, 0, 0]);
        assert_eq!(palette.entries()[0].color().rgb(), [250, 0, 0]);
        assert_eq!(palette.entries()[0].provenance(), Provenance::RegionPick);

        // similar to the other entry
        assert!(palette
            .replace(0, ColorSample::new(0, 0, 250), Provenance::ExactPick)
            .unwrap_err()
            .is_duplicate());
        assert!(palette
            .replace(2, ColorSample::new(0, 255, 0), Provenance::ExactPick)
            .is_err());
        assert_no_duplicates(&palette);
    }

    #[test]
    fn replace_works_when_full() {
        let mut palette = PaletteController::new(PaletteOptions::new().capacity(2));
        palette.add(ColorSample::new(255, 0, 0), Provenance::ExactPick).unwrap();
        palette.add(ColorSample::new(0, 0, 255), Provenance::ExactPick).unwrap();
        assert!(palette
            .replace(1, ColorSample::new(0, 255, 0), Provenance::ExactPick)
            .is_ok());
    }

    #[test]
    fn from_dominant_skips_similar_colors() {
        let pixels = families(30, 30);
        let dominant = dominant_colors(buffer(30, 30, &pixels), 10).unwrap();
        let palette = PaletteController::from_dominant(&dominant, PaletteOptions::new());
        assert!(palette.len() <= dominant.len());
        assert!(!palette.is_empty());
        assert_no_duplicates(&palette);
        assert!(palette.entries().iter().all(|e| !e.is_user_picked()));
        assert_eq!(palette.image_name(), "Unnamed Image");
    }

    #[test]
    fn picked_colors_and_summary() {
        let pixels = split(10, 10, [255, 0, 0, 255], [0, 0, 255, 255], 70);
        let buffer = buffer(10, 10, &pixels);
        let dominant = dominant_colors(buffer, 10).unwrap();
        let mut palette = PaletteController::from_dominant(&dominant, PaletteOptions::new());
        assert_eq!(palette.len(), 2);

        // red is already in the palette
        assert!(palette
            .add_picked(region::pick_exact(buffer, 0, 0).unwrap())
            .unwrap_err()
            .is_duplicate());

        let green = ColorSample::new(0, 255, 0);
        palette.add(green, Provenance::ExactPick).unwrap();
        palette.set_image_name("flag.png");

        let summary = palette.summary();
        assert_eq!(summary.to_string(), "Palette: 3/10 colors (2 dominant, 1 user-picked)");
        assert_eq!(palette.entries()[0].to_string(), "#FF0000 - Dominant (70.0%)");
        assert_eq!(palette.entries()[2].to_string(), "#00FF00 - User Pick (Exact)");
        assert_eq!(palette.image_name(), "flag.png");

        // the bottom right corner is blue, which is already at index 1
        let picked = region::pick_region(buffer, 9, 9, crate::RegionSize::MIN).unwrap();
        assert_eq!(picked.color().rgb(), [0, 0, 255]);
        assert!(palette
            .replace_picked(2, picked.clone())
            .unwrap_err()
            .is_duplicate());
        let old = palette.replace_picked(1, picked).unwrap();
        assert_eq!(
            old.provenance(),
            Provenance::Extracted { percentage: 30.0, pixel_count: 30 }
        );
        assert_eq!(palette.summary().user_picked, 2);
    }

    #[test]
    fn empty_summary() {
        let palette = PaletteController::new(PaletteOptions::new());
        assert_eq!(palette.summary().to_string(), "Empty palette");
        assert_eq!(palette.image_name(), "Custom Palette");
        assert_eq!(palette.colors().count(), 0);
    }
}
