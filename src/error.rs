//! The error type shared by every fallible operation in the crate.

use thiserror::Error;

/// The ways an engine operation can be rejected.
///
/// All variants are deterministic validation outcomes and are never retried internally.
/// [`EngineError::DuplicateRejected`] is a business rule rather than a fault:
/// it tells the caller which existing palette entry blocked the operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The input is malformed, e.g., a pixel buffer whose length disagrees with its dimensions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A numeric parameter lies outside its valid (inclusive) range.
    #[error("{what} ({value}) must be between {min} and {max}")]
    OutOfRange {
        /// The name of the offending parameter.
        what: &'static str,
        /// The value that was supplied.
        value: i64,
        /// The smallest accepted value.
        min: i64,
        /// The largest accepted value.
        max: i64,
    },

    /// A color was added to a palette that is already full.
    #[error("palette is full ({capacity} colors), remove a color first")]
    CapacityExceeded {
        /// The capacity of the palette.
        capacity: usize,
    },

    /// A color is within the similarity threshold of an existing palette entry.
    #[error("similar color already exists at index {index}: {existing} (delta E {delta_e:.2})")]
    DuplicateRejected {
        /// The index of the blocking palette entry.
        index: usize,
        /// The hex code of the blocking palette entry.
        existing: String,
        /// The Delta-E distance between the rejected color and the blocking entry.
        delta_e: f32,
    },
}

impl EngineError {
    /// Creates an [`EngineError::OutOfRange`] from any integer-like values.
    pub(crate) fn out_of_range(
        what: &'static str,
        value: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Self {
        Self::OutOfRange {
            what,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Whether this error is a similarity rejection rather than a validation failure.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateRejected { .. })
    }
}

/// Converts a length or index for use in [`EngineError::OutOfRange`].
pub(crate) fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// A `Result` alias with [`EngineError`] as the error type.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_the_range() {
        let err = EngineError::out_of_range("x", 60_u32, 0_u32, 49_u32);
        assert_eq!(err.to_string(), "x (60) must be between 0 and 49");
    }

    #[test]
    fn duplicate_is_distinguishable() {
        let err = EngineError::DuplicateRejected {
            index: 2,
            existing: "#FF0000".to_owned(),
            delta_e: 1.5,
        };
        assert!(err.is_duplicate());
        assert!(!EngineError::CapacityExceeded { capacity: 10 }.is_duplicate());
        assert_eq!(
            err.to_string(),
            "similar color already exists at index 2: #FF0000 (delta E 1.50)"
        );
    }
}
