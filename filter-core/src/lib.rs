// filter-core/src/lib.rs

//! Digital filter toolkit.
//! Biquad design and cascades, FIR convolution, window functions,
//! FFT-based spectral analysis and an empirical response harness.
//! It is completely headless: callers render whatever it returns.

pub mod biquad;
pub mod config;
pub mod error;
pub mod fft;
pub mod filter;
pub mod fir;
pub mod response;
pub mod sweep;
pub mod window;

pub use biquad::{BiQuad, BiQuadCascade, FilterType};
pub use error::{FilterError, Result};
pub use fft::{DitherSource, NoDither, RandomDither};
pub use filter::StatefulFilter;
pub use fir::Fir;
pub use response::{QuadratureResponse, impulse_response, step_response};
pub use sweep::FrequencySweep;
pub use window::{WindowFunction, WindowType};

/// Magnitude versus frequency, as produced by every response and spectrum
/// routine in the crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCurve {
    /// X axis in Hz.
    pub frequencies: Vec<f64>,
    /// Linear magnitude at each frequency.
    pub magnitudes: Vec<f64>,
}

impl ResponseCurve {
    /// Empty curve with room for `points` entries.
    pub fn with_capacity(points: usize) -> Self {
        Self {
            frequencies: Vec::with_capacity(points),
            magnitudes: Vec::with_capacity(points),
        }
    }

    /// Appends one point to the end of the curve.
    pub fn push(&mut self, frequency: f64, magnitude: f64) {
        self.frequencies.push(frequency);
        self.magnitudes.push(magnitude);
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    /// True when the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Largest magnitude, or 0 for an empty curve.
    pub fn max_magnitude(&self) -> f64 {
        self.magnitudes.iter().copied().fold(0.0, f64::max)
    }

    /// Raises every magnitude to at least `floor`.
    pub fn clamp_floor(&mut self, floor: f64) {
        for magnitude in &mut self.magnitudes {
            *magnitude = magnitude.max(floor);
        }
    }

    /// `(frequency, magnitude)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }
}
