//! # Window Function Module
//!
//! Classical analysis windows used to taper a buffer before it is handed to
//! the FFT. A [`WindowFunction`] binds one formula when it is created and then
//! evaluates `f(N, n)` for any length.
//!
//! The cosine-sum windows (Hamming through Flat-Top) share a single evaluator;
//! their coefficient sets live in a lazily built table so each set is derived
//! exactly once per process.

use crate::error::{FilterError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Supported window shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WindowType {
    /// All ones.
    Rectangular,
    /// Hamming window (0.53836 / 0.46164).
    Hamming,
    /// Hann window (raised cosine).
    Hann,
    /// Cosine (sine) window.
    Cosine,
    /// Lanczos window (normalised sinc lobe).
    Lanczos,
    /// Bartlett window, zero at both ends.
    Bartlett,
    /// Triangular window, non-zero at both ends.
    Triangular,
    /// Gaussian window with sigma 0.4.
    Gauss,
    /// Bartlett-Hann window.
    BartlettHann,
    /// Blackman window (alpha = 0.16).
    Blackman,
    /// Nuttall window.
    Nuttall,
    /// Blackman-Harris window.
    BlackmanHarris,
    /// Blackman-Nuttall window.
    BlackmanNuttall,
    /// Flat-top window.
    FlatTop,
}

impl WindowType {
    /// Every window shape, in declaration order.
    pub const ALL: [WindowType; 14] = [
        WindowType::Rectangular,
        WindowType::Hamming,
        WindowType::Hann,
        WindowType::Cosine,
        WindowType::Lanczos,
        WindowType::Bartlett,
        WindowType::Triangular,
        WindowType::Gauss,
        WindowType::BartlettHann,
        WindowType::Blackman,
        WindowType::Nuttall,
        WindowType::BlackmanHarris,
        WindowType::BlackmanNuttall,
        WindowType::FlatTop,
    ];
}

/// Shape parameter of the Gaussian window.
const GAUSS_SIGMA: f64 = 0.4;

/// Cosine-sum coefficients `a0..ak`, applied as `Σ (-1)^k a_k cos(2πkn/(N-1))`.
static COSINE_SUMS: Lazy<BTreeMap<WindowType, Vec<f64>>> = Lazy::new(|| {
    let blackman_alpha = 0.16;
    BTreeMap::from([
        (WindowType::Hamming, vec![0.53836, 0.46164]),
        (WindowType::Hann, vec![0.5, 0.5]),
        (
            WindowType::Blackman,
            vec![(1.0 - blackman_alpha) / 2.0, 0.5, blackman_alpha / 2.0],
        ),
        (WindowType::Nuttall, vec![0.355768, 0.487396, 0.144232, 0.012604]),
        (WindowType::BlackmanHarris, vec![0.35875, 0.48829, 0.14128, 0.01168]),
        (
            WindowType::BlackmanNuttall,
            vec![0.3635819, 0.4891775, 0.1365995, 0.0106411],
        ),
        (WindowType::FlatTop, vec![1.0, 1.93, 1.29, 0.388, 0.032]),
    ])
});

/// Table entry for a cosine-sum window; empty (an all-zero window) if the
/// table lacks it.
fn cosine_sum_terms(window_type: WindowType) -> &'static [f64] {
    COSINE_SUMS.get(&window_type).map(Vec::as_slice).unwrap_or(&[])
}

#[derive(Debug, Clone)]
enum Shape {
    Rectangular,
    CosineSum(&'static [f64]),
    Cosine,
    Lanczos,
    Bartlett,
    Triangular,
    Gauss,
    BartlettHann,
}

/// A window formula bound to one [`WindowType`].
#[derive(Debug, Clone)]
pub struct WindowFunction {
    window_type: WindowType,
    shape: Shape,
}

impl WindowFunction {
    /// Selects the formula for `window_type`.
    pub fn new(window_type: WindowType) -> Self {
        let shape = match window_type {
            WindowType::Rectangular => Shape::Rectangular,
            WindowType::Cosine => Shape::Cosine,
            WindowType::Lanczos => Shape::Lanczos,
            WindowType::Bartlett => Shape::Bartlett,
            WindowType::Triangular => Shape::Triangular,
            WindowType::Gauss => Shape::Gauss,
            WindowType::BartlettHann => Shape::BartlettHann,
            WindowType::Hamming
            | WindowType::Hann
            | WindowType::Blackman
            | WindowType::Nuttall
            | WindowType::BlackmanHarris
            | WindowType::BlackmanNuttall
            | WindowType::FlatTop => Shape::CosineSum(cosine_sum_terms(window_type)),
        };
        Self { window_type, shape }
    }

    /// The bound window type.
    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Evaluates the `n`-th coefficient of a window of length `len`.
    ///
    /// Windows of length 0 or 1 degenerate to a single unit coefficient.
    pub fn evaluate(&self, len: usize, n: usize) -> f64 {
        if len <= 1 {
            return 1.0;
        }
        let big_n = len as f64;
        let span = big_n - 1.0;
        let n = n as f64;
        let half = span / 2.0;

        match self.shape {
            Shape::Rectangular => 1.0,
            Shape::CosineSum(terms) => terms
                .iter()
                .enumerate()
                .map(|(k, a)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * a * (2.0 * PI * k as f64 * n / span).cos()
                })
                .sum(),
            Shape::Cosine => (PI * n / span).sin(),
            Shape::Lanczos => sinc(2.0 * n / span - 1.0),
            Shape::Bartlett => 2.0 / span * (half - (n - half).abs()),
            Shape::Triangular => 2.0 / big_n * (big_n / 2.0 - (n - half).abs()),
            Shape::Gauss => (-0.5 * ((n - half) / (GAUSS_SIGMA * half)).powi(2)).exp(),
            Shape::BartlettHann => {
                0.62 - 0.48 * (n / span - 0.5).abs() - 0.38 * (2.0 * PI * n / span).cos()
            }
        }
    }

    /// All `len` coefficients of the window.
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        (0..len).map(|n| self.evaluate(len, n)).collect()
    }

    /// Center-crops `input` to `req_len` samples and weights them by the
    /// window of that length.
    ///
    /// The crop offset is `(input.len() - req_len) / 2` rounded half to even.
    ///
    /// # Errors
    /// * [`FilterError::InputTooShort`] if `input` holds fewer than `req_len` samples
    pub fn apply(&self, input: &[f64], req_len: usize) -> Result<Vec<f64>> {
        if input.len() < req_len {
            return Err(FilterError::InputTooShort {
                required: req_len,
                actual: input.len(),
            });
        }
        let offset = ((input.len() - req_len) as f64 / 2.0).round_ties_even() as usize;
        Ok(input[offset..offset + req_len]
            .iter()
            .enumerate()
            .map(|(i, &sample)| sample * self.evaluate(req_len, i))
            .collect())
    }
}

/// One-shot form of [`WindowFunction::apply`].
pub fn apply_window(input: &[f64], req_len: usize, window_type: WindowType) -> Result<Vec<f64>> {
    WindowFunction::new(window_type).apply(input, req_len)
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}
