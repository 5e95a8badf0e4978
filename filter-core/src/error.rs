//! # Error Module
//!
//! Precondition failures for the filter toolkit. Numerical degeneracy
//! (NaN at a response null, a zero normalisation maximum) is never reported
//! here; it is substituted locally where it happens.

use thiserror::Error;

/// Errors raised when a filter or analysis is handed inconsistent input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// An FIR filter was built from an empty coefficient set.
    #[error("filter needs at least one coefficient")]
    EmptyCoefficients,

    /// A cascade was built without any sections.
    #[error("cascade needs at least one biquad section")]
    EmptyCascade,

    /// The input buffer is shorter than the operation requires.
    #[error("input of {actual} samples is shorter than the required {required}")]
    InputTooShort {
        /// Minimum number of samples needed
        required: usize,
        /// Number of samples supplied
        actual: usize,
    },

    /// Sample rate is invalid (must be > 0).
    #[error("invalid sample rate: {sample_rate} Hz (must be > 0)")]
    InvalidSampleRate {
        /// The invalid sample rate value
        sample_rate: f64,
    },

    /// Q factor is invalid (must be > 0).
    #[error("invalid Q factor: {q} (must be > 0)")]
    InvalidQ {
        /// The invalid Q value
        q: f64,
    },

    /// Frequency is invalid (must be > 0 and < Nyquist).
    #[error("invalid frequency: {freq} Hz (must be > 0 and < Nyquist frequency {nyquist} Hz)")]
    InvalidFrequency {
        /// The invalid frequency value
        freq: f64,
        /// The Nyquist frequency (sample_rate / 2)
        nyquist: f64,
    },

    /// Raw feedback coefficients cannot be normalised because `a0` is zero.
    #[error("leading feedback coefficient a0 must be non-zero")]
    ZeroLeadingCoefficient,

    /// A frequency sweep was configured with unusable bounds.
    #[error("invalid sweep: {reason}")]
    InvalidSweep {
        /// What was wrong with the sweep parameters
        reason: String,
    },
}

/// A specialized `Result` type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    /// Returns `true` if the error came from a buffer that was too short.
    pub fn is_length_error(&self) -> bool {
        matches!(self, FilterError::InputTooShort { .. })
    }

    /// Returns `true` if the error came from rejected design parameters.
    pub fn is_design_error(&self) -> bool {
        matches!(
            self,
            FilterError::InvalidSampleRate { .. }
                | FilterError::InvalidQ { .. }
                | FilterError::InvalidFrequency { .. }
        )
    }
}

/// Fails with [`FilterError::InputTooShort`] when `actual < required`.
pub(crate) fn ensure_len(actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(FilterError::InputTooShort { required, actual });
    }
    Ok(())
}
