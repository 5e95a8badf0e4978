//! # Frequency Sweep Module
//!
//! A phase accumulator that emits sine, cosine or quadrature samples while
//! its frequency steps every sample, either linearly or geometrically.

use crate::error::{FilterError, Result};
use std::f64::consts::PI;

/// Number of steps used when none is given.
pub const DEFAULT_POINTS: usize = 2000;

/// One sample of a single-phase sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSample {
    pub value: f64,
    /// Phase in radians at which the sample was taken.
    pub phase: f64,
    /// Instantaneous frequency in Hz of the sample.
    pub frequency: f64,
}

/// One in-phase/quadrature pair of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureSample {
    pub sine: f64,
    pub cosine: f64,
    /// Instantaneous frequency in Hz of the pair.
    pub frequency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    /// Added to the phase increment every sample.
    Linear(f64),
    /// Multiplies the phase increment every sample.
    Geometric(f64),
}

/// Swept oscillator running from a start to a stop frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySweep {
    phase: f64,
    increment: f64,
    step: Step,
    delta_t: f64,
}

impl FrequencySweep {
    /// Linear sweep over [`DEFAULT_POINTS`] samples.
    ///
    /// # Errors
    /// * [`FilterError::InvalidSweep`] for a non-positive `delta_t`
    pub fn new(start: f64, stop: f64, delta_t: f64) -> Result<Self> {
        Self::with_points(start, stop, delta_t, DEFAULT_POINTS, false)
    }

    /// Sweep reaching `stop` after `points` samples.
    ///
    /// With `geometric` the increment is multiplied by a constant ratio each
    /// sample (equal time per octave); otherwise it grows by a constant step.
    ///
    /// # Arguments
    /// * `start` - Frequency in Hz of the first sample
    /// * `stop` - Frequency in Hz reached after `points` samples
    /// * `delta_t` - Sample period in seconds
    /// * `points` - Number of steps from `start` to `stop`
    /// * `geometric` - Multiply rather than add a constant step
    ///
    /// # Errors
    /// * [`FilterError::InvalidSweep`] for `points == 0`, a non-positive
    ///   `delta_t`, or non-positive bounds on a geometric sweep
    pub fn with_points(
        start: f64,
        stop: f64,
        delta_t: f64,
        points: usize,
        geometric: bool,
    ) -> Result<Self> {
        if points == 0 {
            return Err(FilterError::InvalidSweep {
                reason: "sweep needs at least one point".into(),
            });
        }
        if !(delta_t > 0.0) {
            return Err(FilterError::InvalidSweep {
                reason: format!("time step {delta_t} must be positive"),
            });
        }
        if geometric && !(start > 0.0 && stop > 0.0) {
            return Err(FilterError::InvalidSweep {
                reason: format!("geometric sweep bounds {start}..{stop} must be positive"),
            });
        }

        let inc_start = 2.0 * PI * delta_t * start;
        let inc_stop = 2.0 * PI * delta_t * stop;
        let step = if geometric {
            Step::Geometric((stop / start).powf(1.0 / points as f64))
        } else {
            Step::Linear((inc_stop - inc_start) / points as f64)
        };

        Ok(Self {
            phase: 0.0,
            increment: inc_start,
            step,
            delta_t,
        })
    }

    /// Frequency in Hz of the next sample.
    pub fn frequency(&self) -> f64 {
        self.increment / (2.0 * PI * self.delta_t)
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    fn advance(&mut self) {
        self.phase += self.increment;
        self.increment = match self.step {
            Step::Linear(delta) => self.increment + delta,
            Step::Geometric(ratio) => self.increment * ratio,
        };
    }

    /// Cosine of the current phase, then advances the sweep.
    pub fn next_cosine(&mut self) -> SweepSample {
        let sample = SweepSample {
            value: self.phase.cos(),
            phase: self.phase,
            frequency: self.frequency(),
        };
        self.advance();
        sample
    }

    /// Sine of the current phase, then advances the sweep.
    pub fn next_sine(&mut self) -> SweepSample {
        let sample = SweepSample {
            value: self.phase.sin(),
            phase: self.phase,
            frequency: self.frequency(),
        };
        self.advance();
        sample
    }

    /// Sine and cosine at the same phase.
    pub fn next_quadrature(&mut self) -> QuadratureSample {
        let sample = QuadratureSample {
            sine: self.phase.sin(),
            cosine: self.phase.cos(),
            frequency: self.frequency(),
        };
        self.advance();
        sample
    }
}
