//! Weighted k-means clustering of histogram entries in CIELAB.
//!
//! Centers are seeded with k-means++: the first center is the most frequent color,
//! and each following center is drawn from the remaining colors with a probability
//! proportional to its squared distance to the nearest chosen center.
//! The random generator uses a fixed seed, so the same input always gives the same clusters.
//!
//! Each iteration then assigns every entry to its nearest center
//! (ties go to the earlier center) and moves each center to the pixel-weighted mean
//! of its members. A center without members stays where it is.
//! Iteration stops once no center moved more than the convergence threshold,
//! or after the maximum number of iterations.
//!
//! # Examples
//! ```
//! # use huepick::{kmeans::{cluster, KmeansOptions}, HistogramEntry, ColorSample};
//! # fn main() -> Result<(), huepick::EngineError> {
//! let entries = vec![
//!     HistogramEntry::new(ColorSample::new(250, 0, 0), 40, 40.0),
//!     HistogramEntry::new(ColorSample::new(0, 0, 250), 35, 35.0),
//!     HistogramEntry::new(ColorSample::new(245, 5, 5), 15, 15.0),
//!     HistogramEntry::new(ColorSample::new(5, 5, 245), 10, 10.0),
//! ];
//!
//! let clusters = cluster(&entries, 2, KmeansOptions::new())?;
//! assert_eq!(clusters.len(), 2);
//! assert_eq!(clusters[0].total_pixel_count(), 55);
//! assert_eq!(clusters[1].total_pixel_count(), 45);
//! # Ok(())
//! # }
//! ```

use crate::{
    by_count_desc,
    colorspace::{distance_squared, WeightedLabSum},
    error::saturating_i64,
    ColorSample, EngineError, HistogramEntry, Result,
};
use log::{debug, info};
use rand::{distributions::WeightedIndex, prelude::Distribution, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::fmt::{self, Display};

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Options for [`cluster`] and `cluster_par`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansOptions {
    /// The maximum number of assign-and-update iterations.
    max_iterations: u32,
    /// Centers moving less than this many Delta-E units count as converged.
    convergence_threshold: f32,
    /// The seed for the k-means++ center selection.
    seed: u64,
}

impl KmeansOptions {
    /// Create a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_iterations: 50,
            convergence_threshold: 0.1,
            seed: 42,
        }
    }

    /// Sets the maximum number of iterations.
    ///
    /// At least one iteration always runs, so a value of `0` is treated as `1`.
    ///
    /// The default is `50`.
    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = if max_iterations == 0 { 1 } else { max_iterations };
        self
    }

    /// Sets the distance in CIELAB under which a center is considered to not have moved.
    ///
    /// The default is `0.1`.
    #[must_use]
    pub const fn convergence_threshold(mut self, convergence_threshold: f32) -> Self {
        self.convergence_threshold = convergence_threshold;
        self
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default is `42`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The maximum number of iterations.
    #[must_use]
    pub const fn get_max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// The convergence threshold.
    #[must_use]
    pub const fn get_convergence_threshold(&self) -> f32 {
        self.convergence_threshold
    }

    /// The random seed.
    #[must_use]
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A group of entries around a center in CIELAB.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// The final center.
    lab_center: [f32; 3],
    /// `lab_center` mapped into sRGB.
    center_color: ColorSample,
    /// The entries assigned to this cluster in the last iteration.
    members: Vec<HistogramEntry>,
    /// The sum of member counts.
    total_pixel_count: u32,
    /// The sum of member percentages.
    total_percentage: f64,
}

impl Cluster {
    /// The center as CIELAB components.
    #[must_use]
    pub fn lab_center(&self) -> [f32; 3] {
        self.lab_center
    }

    /// The center as an sRGB color, clamped into gamut.
    #[must_use]
    pub fn center_color(&self) -> &ColorSample {
        &self.center_color
    }

    /// The entries in this cluster.
    #[must_use]
    pub fn members(&self) -> &[HistogramEntry] {
        &self.members
    }

    /// The number of pixels across all members.
    #[must_use]
    pub fn total_pixel_count(&self) -> u32 {
        self.total_pixel_count
    }

    /// The percentage of visible pixels across all members.
    #[must_use]
    pub fn total_percentage(&self) -> f64 {
        self.total_percentage
    }
}

impl Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [l, a, b] = self.lab_center;
        write!(
            f,
            "Cluster[LAB({l:.1}, {a:.1}, {b:.1}) {}, {} colors, {:.1}%]",
            self.center_color.hex(),
            self.members.len(),
            self.total_percentage
        )
    }
}

/// Returns the index of the nearest center, preferring the earliest on ties.
#[inline]
fn nearest(centers: &[[f32; 3]], lab: [f32; 3]) -> usize {
    let mut min_index = 0;
    let mut min_distance = f32::INFINITY;
    for (i, &center) in centers.iter().enumerate() {
        let distance = distance_squared(center, lab);
        if distance < min_distance {
            min_distance = distance;
            min_index = i;
        }
    }
    min_index
}

/// Picks `k` initial centers with k-means++.
///
/// `labs` must be non-empty and `k <= labs.len()`.
fn seed_centers(labs: &[[f32; 3]], k: usize, seed: u64) -> Vec<[f32; 3]> {
    let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed);

    let mut centers = Vec::with_capacity(k);
    centers.push(labs[0]);

    let mut remaining = labs[1..].to_vec();

    while centers.len() < k && !remaining.is_empty() {
        let weights = remaining
            .iter()
            .map(|&lab| {
                let min = centers
                    .iter()
                    .map(|&center| distance_squared(center, lab))
                    .fold(f32::INFINITY, f32::min);
                f64::from(min)
            })
            .collect::<Vec<_>>();

        // WeightedIndex::new fails only if every remaining color sits on a chosen center
        let i = WeightedIndex::new(&weights).map_or(0, |distribution| distribution.sample(rng));

        centers.push(remaining.remove(i));
    }

    debug!("initialized {} centers using k-means++", centers.len());

    centers
}

/// The mutable state of one k-means run.
struct State<'a> {
    /// The entries to cluster.
    entries: &'a [HistogramEntry],
    /// The CIELAB components of `entries`.
    labs: Vec<[f32; 3]>,
    /// The current center of each cluster.
    centers: Vec<[f32; 3]>,
    /// The cluster index of each entry.
    assignments: Vec<usize>,
}

impl<'a> State<'a> {
    /// Seeds the centers for `entries`.
    fn new(entries: &'a [HistogramEntry], k: usize, seed: u64) -> Self {
        info!(
            "starting k-means clustering: {} colors into {k} clusters",
            entries.len()
        );

        let labs = entries
            .iter()
            .map(HistogramEntry::lab_components)
            .collect::<Vec<_>>();

        let centers = seed_centers(&labs, k, seed);

        Self {
            entries,
            assignments: vec![0; labs.len()],
            labs,
            centers,
        }
    }

    /// Assigns each entry to its nearest center.
    fn assign(&mut self) {
        let Self { labs, centers, assignments, .. } = self;
        for (assignment, &lab) in assignments.iter_mut().zip(labs.iter()) {
            *assignment = nearest(centers, lab);
        }
    }

    /// Assigns each entry to its nearest center in parallel.
    #[cfg(feature = "threads")]
    fn assign_par(&mut self) {
        let Self { labs, centers, assignments, .. } = self;
        let centers = centers.as_slice();
        assignments
            .par_iter_mut()
            .zip(labs.par_iter())
            .for_each(|(assignment, &lab)| *assignment = nearest(centers, lab));
    }

    /// Moves each center to the weighted mean of its members.
    ///
    /// Returns whether any center moved more than `threshold`.
    fn update(&mut self, threshold: f32) -> bool {
        let mut sums = vec![WeightedLabSum::default(); self.centers.len()];
        for ((&cluster, &lab), entry) in self.assignments.iter().zip(&self.labs).zip(self.entries) {
            sums[cluster].add(lab, entry.count());
        }

        let mut moved = false;
        for (center, sum) in self.centers.iter_mut().zip(sums) {
            if let Some(mean) = sum.mean() {
                moved |= distance_squared(*center, mean).sqrt() > threshold;
                *center = mean;
            }
        }

        moved
    }

    /// Runs assign and update steps until convergence.
    ///
    /// Returns the number of iterations run.
    fn run(&mut self, options: KmeansOptions, assign: impl Fn(&mut Self)) -> u32 {
        let mut iteration = 0;
        let mut moved = true;
        while moved && iteration < options.max_iterations {
            iteration += 1;
            assign(self);
            moved = self.update(options.convergence_threshold);
            debug!(
                "k-means iteration {iteration}: centers {}",
                if moved { "moved" } else { "converged" }
            );
        }
        info!("k-means clustering complete after {iteration} iterations");
        iteration
    }

    /// Collects the final clusters, sorted by descending pixel count.
    fn into_clusters(self) -> Vec<Cluster> {
        let Self { entries, centers, assignments, .. } = self;

        let mut clusters = centers
            .into_iter()
            .map(|lab_center| Cluster {
                lab_center,
                center_color: ColorSample::from_lab_components(lab_center),
                members: Vec::new(),
                total_pixel_count: 0,
                total_percentage: 0.0,
            })
            .collect::<Vec<_>>();

        for (&i, entry) in assignments.iter().zip(entries) {
            let cluster = &mut clusters[i];
            cluster.total_pixel_count += entry.count();
            cluster.total_percentage += entry.percentage();
            cluster.members.push(entry.clone());
        }

        clusters.sort_by_key(|cluster| by_count_desc(cluster.total_pixel_count));
        clusters
    }
}

/// Checks that `k` clusters can be made from `entries`.
fn validate(entries: &[HistogramEntry], k: usize) -> Result<()> {
    if entries.is_empty() {
        Err(EngineError::InvalidInput(
            "cannot cluster an empty list of colors".to_owned(),
        ))
    } else if k == 0 || k > entries.len() {
        Err(EngineError::out_of_range(
            "k",
            saturating_i64(k),
            1,
            saturating_i64(entries.len()),
        ))
    } else {
        Ok(())
    }
}

/// Clusters count-sorted histogram entries into exactly `k` clusters.
///
/// The returned clusters are sorted by descending pixel count, and their counts
/// sum to the total count of `entries`. The result is deterministic for a given seed.
///
/// # Errors
/// Returns [`EngineError::InvalidInput`] if `entries` is empty,
/// or [`EngineError::OutOfRange`] if `k` is not in `1..=entries.len()`.
pub fn cluster(
    entries: &[HistogramEntry],
    k: usize,
    options: KmeansOptions,
) -> Result<Vec<Cluster>> {
    validate(entries, k)?;
    let mut state = State::new(entries, k, options.seed);
    let _ = state.run(options, State::assign);
    Ok(state.into_clusters())
}

/// Clusters count-sorted histogram entries into exactly `k` clusters in parallel.
///
/// The output is identical to [`cluster`] with the same arguments.
///
/// # Errors
/// Returns [`EngineError::InvalidInput`] if `entries` is empty,
/// or [`EngineError::OutOfRange`] if `k` is not in `1..=entries.len()`.
#[cfg(feature = "threads")]
pub fn cluster_par(
    entries: &[HistogramEntry],
    k: usize,
    options: KmeansOptions,
) -> Result<Vec<Cluster>> {
    validate(entries, k)?;
    let mut state = State::new(entries, k, options.seed);
    let _ = state.run(options, State::assign_par);
    Ok(state.into_clusters())
}
