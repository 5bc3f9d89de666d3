//! A library for perceptual color analysis and interactive palette curation.
//!
//! `huepick` turns a decoded raster image into a small set of representative colors,
//! and lets a caller curate that set by picking or removing colors at specific coordinates.
//! All color comparisons happen in CIELAB (D65) using the CIE76 Delta-E metric.
//!
//! # Features
//! To reduce dependencies and compile times, `huepick` has several `cargo` features
//! that can be turned off or on:
//! - `threads`: exposes a parallel version of k-means clustering via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # Overview
//! The data flows in one direction:
//! a [`PixelBuffer`] is counted into a [`Histogram`], which is then either
//! grouped by the greedy Delta-E [`quantize`](quantize::quantize)r or clustered by
//! [`kmeans`]. The [`DominantColorPipeline`] decides which path to take for a whole image,
//! and the [`region`] picker resolves a single color around a point.
//! Both feed a [`PaletteController`].
//!
//! ```
//! # use huepick::{DominantColorPipeline, PaletteController, PaletteOptions, PixelBuffer, region};
//! # use palette::Srgba;
//! # fn main() -> Result<(), huepick::EngineError> {
//! let pixels = vec![Srgba::new(200, 30, 30, 255); 64];
//! let buffer = PixelBuffer::new(8, 8, &pixels)?;
//!
//! let dominant = DominantColorPipeline::new(buffer)
//!     .max_colors(5u8.try_into()?)
//!     .dominant_colors();
//!
//! let mut palette = PaletteController::from_dominant(&dominant, PaletteOptions::new());
//! let picked = region::pick_exact(buffer, 3, 4)?;
//! assert!(palette.add_picked(picked).is_err()); // same red is already there
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod color;
mod colorspace;
mod controller;
mod dominant;
mod error;
mod histogram;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub mod kmeans;
pub mod quantize;
pub mod region;

pub use color::ColorSample;
pub use colorspace::delta_e;
pub use controller::*;
pub use dominant::*;
pub use error::*;
pub use histogram::*;
pub use types::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// Pixels with an alpha value below this threshold are treated as transparent.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;

/// The maximum number of dominant colors that can be requested for an image.
pub const MAX_DOMINANT_COLORS: u8 = 10;

/// Below this many distinct colors, an image is returned as-is instead of being clustered.
pub const MIN_COLORS_FOR_CLUSTERING: usize = 15;
