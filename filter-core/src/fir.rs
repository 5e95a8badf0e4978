//! # FIR Filter Module
//!
//! Fixed-coefficient convolution over a circular delay line. The taps are
//! stored reversed so the ring can be read forward from the write position.

use crate::error::{FilterError, Result, ensure_len};
use crate::filter::StatefulFilter;

/// Finite impulse response filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Fir {
    /// Taps in reversed order.
    coeff: Vec<f64>,
    ring: Vec<f64>,
    offset: usize,
}

impl Fir {
    /// Builds a filter from its taps.
    ///
    /// # Errors
    /// * [`FilterError::EmptyCoefficients`] if `coefficients` is empty
    pub fn new(coefficients: &[f64]) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(FilterError::EmptyCoefficients);
        }
        let coeff: Vec<f64> = coefficients.iter().rev().copied().collect();
        let ring = vec![0.0; coeff.len()];
        Ok(Self {
            coeff,
            ring,
            offset: 0,
        })
    }

    /// The taps in the order they were supplied.
    pub fn coefficients(&self) -> Vec<f64> {
        self.coeff.iter().rev().copied().collect()
    }

    /// Straight finite convolution of a whole buffer, without the ring.
    ///
    /// Produces `input.len() - taps` outputs; output `i` covers
    /// `input[i..i + taps]`.
    ///
    /// # Errors
    /// * [`FilterError::InputTooShort`] if `input` is shorter than the filter
    pub fn convolve(&self, input: &[f64]) -> Result<Vec<f64>> {
        let taps = self.coeff.len();
        ensure_len(input.len(), taps)?;
        Ok((0..input.len() - taps)
            .map(|i| {
                self.coeff
                    .iter()
                    .zip(&input[i..i + taps])
                    .map(|(c, x)| c * x)
                    .sum()
            })
            .collect())
    }
}

impl StatefulFilter for Fir {
    fn process(&mut self, input: f64) -> f64 {
        let len = self.ring.len();
        self.ring[self.offset] = input;

        let sum: f64 = self
            .coeff
            .iter()
            .enumerate()
            .map(|(i, c)| c * self.ring[(self.offset + i) % len])
            .sum();

        self.offset = if self.offset == 0 { len - 1 } else { self.offset - 1 };
        sum
    }

    fn length(&self) -> usize {
        self.coeff.len()
    }

    fn load(&mut self, value: f64) {
        self.ring.fill(value);
        self.offset = self.ring.len() - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_ramp() {
        let mut fir = Fir::new(&[0.25; 4]).unwrap();
        fir.load(0.0);
        let out = fir.process_block(&[1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let expected = [0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25, 0.0];
        for (o, e) in out.iter().zip(expected) {
            assert!((o - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linearity() {
        let taps = [0.1, -0.3, 0.7, 0.2, 0.05];
        let input: Vec<f64> = (0..32).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();

        let mut a = Fir::new(&taps).unwrap();
        let mut b = a.clone();
        let base = a.process_block(&input);
        let scaled_input: Vec<f64> = input.iter().map(|x| x * -2.5).collect();
        let scaled = b.process_block(&scaled_input);

        for (x, y) in base.iter().zip(&scaled) {
            assert!((x * -2.5 - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_time_invariance() {
        let taps = [0.4, 0.3, 0.2, 0.1];
        let input: Vec<f64> = (0..16).map(|i| (i as f64 * 0.7).sin()).collect();
        let delay = 3;
        let mut delayed = vec![0.0; delay];
        delayed.extend_from_slice(&input);

        let mut a = Fir::new(&taps).unwrap();
        let mut b = Fir::new(&taps).unwrap();
        a.load(0.0);
        b.load(0.0);
        let direct = a.process_block(&input);
        let shifted = b.process_block(&delayed);

        for (i, y) in direct.iter().enumerate() {
            assert!((y - shifted[i + delay]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_load_fills_delay_line() {
        let mut fir = Fir::new(&[0.5, 0.25, 0.25]).unwrap();
        fir.load(2.0);
        // a full ring of 2.0 plus the new sample replacing one slot
        assert!((fir.process(2.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_convolve_block() {
        let fir = Fir::new(&[1.0, 2.0]).unwrap();
        let out = fir.convolve(&[1.0, 0.0, 0.0, 3.0]).unwrap();
        // taps reversed: y[i] = 2*x[i] + 1*x[i+1]
        assert_eq!(out, vec![2.0, 0.0]);
    }

    #[test]
    fn test_length_errors() {
        assert_eq!(Fir::new(&[]).unwrap_err(), FilterError::EmptyCoefficients);
        let fir = Fir::new(&[1.0, 1.0, 1.0]).unwrap();
        assert!(fir.convolve(&[1.0]).unwrap_err().is_length_error());
    }

    #[test]
    fn test_coefficients_roundtrip_order() {
        let fir = Fir::new(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(fir.coefficients(), vec![1.0, 2.0, 3.0]);
        assert_eq!(fir.length(), 3);
    }
}
