//! # Response Harness Module
//!
//! Characterises any [`StatefulFilter`] empirically by driving it with a
//! synthesised excitation: an impulse, a step, or a swept sine/cosine pair.
//!
//! ## Features
//! - Impulse and step responses of caller-chosen length
//! - Quadrature sweep measurement of the magnitude response
//! - Settling-time estimate from the decay of the impulse response

use crate::ResponseCurve;
use crate::error::Result;
use crate::filter::StatefulFilter;
use crate::sweep::FrequencySweep;
use linreg::linear_regression;

/// Impulse response over `filter.length()` samples.
pub fn impulse_response<F: StatefulFilter>(filter: &mut F) -> Vec<f64> {
    let length = filter.length();
    impulse_response_with_length(filter, length)
}

/// Impulse response over `length` samples, starting from a zeroed delay line.
pub fn impulse_response_with_length<F: StatefulFilter>(
    filter: &mut F,
    length: usize,
) -> Vec<f64> {
    filter.load(0.0);
    (0..length)
        .map(|n| filter.process(if n == 0 { 1.0 } else { 0.0 }))
        .collect()
}

/// Step response over `filter.length()` samples.
pub fn step_response<F: StatefulFilter>(filter: &mut F) -> Vec<f64> {
    let length = filter.length();
    step_response_with_length(filter, length)
}

/// Step response over `length` samples, starting from a zeroed delay line.
pub fn step_response_with_length<F: StatefulFilter>(filter: &mut F, length: usize) -> Vec<f64> {
    filter.load(0.0);
    (0..length).map(|_| filter.process(1.0)).collect()
}

/// Magnitude response measured by running a sweep through two copies of a
/// filter, one fed the sine and one the cosine of the same phase.
///
/// This is how a black-box filter would be measured on a bench: nothing
/// about its transfer function is evaluated analytically.
#[derive(Debug, Clone)]
pub struct QuadratureResponse<F: StatefulFilter> {
    sweep: FrequencySweep,
    in_phase: F,
    quadrature: F,
    points: usize,
}

impl<F: StatefulFilter> QuadratureResponse<F> {
    /// Prepares a sweep from `start` to `stop` Hz lasting `run_time` seconds
    /// at `sample_rate`.
    ///
    /// The in-phase copy is settled at 0 and the quadrature copy at 1, the
    /// values sine and cosine start from.
    ///
    /// # Arguments
    /// * `filter` - Filter to measure; it is cloned twice and left untouched
    /// * `start` - First sweep frequency in Hz
    /// * `stop` - Last sweep frequency in Hz
    /// * `sample_rate` - Rate the sweep is generated at
    /// * `run_time` - Duration in seconds; the sweep has `run_time * sample_rate` points
    ///
    /// # Errors
    /// * [`crate::FilterError::InvalidSweep`] if the sweep would have no points
    pub fn new(
        filter: &F,
        start: f64,
        stop: f64,
        sample_rate: f64,
        run_time: f64,
    ) -> Result<Self> {
        let points = (run_time * sample_rate) as usize;
        let sweep = FrequencySweep::with_points(start, stop, 1.0 / sample_rate, points, false)?;

        let mut in_phase = filter.clone();
        let mut quadrature = filter.clone();
        in_phase.load(0.0);
        quadrature.load(1.0);

        Ok(Self {
            sweep,
            in_phase,
            quadrature,
            points,
        })
    }

    /// One-shot measurement.
    ///
    /// # Errors
    /// * [`crate::FilterError::InvalidSweep`] if the sweep would have no points
    pub fn measure(
        filter: &F,
        start: f64,
        stop: f64,
        sample_rate: f64,
        run_time: f64,
    ) -> Result<Option<ResponseCurve>> {
        Ok(Self::new(filter, start, stop, sample_rate, run_time)?.response())
    }

    /// Number of samples pushed through each copy.
    pub fn size(&self) -> usize {
        self.points
    }

    /// The in-phase and quadrature copies, in that order.
    pub fn filters(&self) -> (&F, &F) {
        (&self.in_phase, &self.quadrature)
    }

    /// Runs the whole sweep. Returns `None` as soon as any sample is NaN;
    /// a partially valid measurement is never returned.
    pub fn response(&mut self) -> Option<ResponseCurve> {
        let mut curve = ResponseCurve::with_capacity(self.points);
        for n in 0..self.points {
            let pair = self.sweep.next_quadrature();
            let i = self.in_phase.process(pair.sine);
            let q = self.quadrature.process(pair.cosine);
            let magnitude = (i * i + q * q).sqrt();
            if magnitude.is_nan() {
                log::warn!("quadrature measurement aborted at sample {n} ({} Hz)", pair.frequency);
                return None;
            }
            curve.push(pair.frequency, magnitude);
        }
        Some(curve)
    }
}

/// Decay fitted to a filter's impulse response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlingEstimate {
    /// Natural-log decay of the envelope per sample (negative when stable).
    pub decay_per_sample: f64,
    /// Samples until the envelope falls below the requested floor.
    pub samples: usize,
}

/// Envelope blocks used for the fit.
const ENVELOPE_BLOCK: usize = 64;

/// Estimates how long `filter` rings by fitting a line to the log of its
/// impulse-response envelope over `max_len` samples.
///
/// # Arguments
/// * `filter` - Filter to probe; a clone is driven, the original is untouched
/// * `max_len` - Number of impulse-response samples to analyse
/// * `floor_db` - Envelope level, in dB below the fitted start, that counts as settled
///
/// # Returns
/// * `Option<SettlingEstimate>` - `None` when the response does not decay, or
///   vanishes too fast to fit (fewer than three non-zero envelope blocks)
pub fn estimate_settling<F: StatefulFilter>(
    filter: &F,
    max_len: usize,
    floor_db: f64,
) -> Option<SettlingEstimate> {
    let mut probe = filter.clone();
    let response = impulse_response_with_length(&mut probe, max_len);

    let (xs, ys): (Vec<f64>, Vec<f64>) = response
        .chunks(ENVELOPE_BLOCK)
        .enumerate()
        .filter_map(|(block, chunk)| {
            let peak = chunk.iter().fold(0.0f64, |m, s| m.max(s.abs()));
            (peak > f64::MIN_POSITIVE && peak.is_finite()).then(|| {
                let centre = (block * ENVELOPE_BLOCK) as f64 + ENVELOPE_BLOCK as f64 / 2.0;
                (centre, peak.ln())
            })
        })
        .unzip();

    if xs.len() < 3 {
        log::debug!("settling estimate skipped: {} usable envelope blocks", xs.len());
        return None;
    }

    let (slope, intercept): (f64, f64) = linear_regression(&xs, &ys).ok()?;
    if !(slope < 0.0) {
        log::debug!("settling estimate skipped: envelope slope {slope} does not decay");
        return None;
    }

    let floor = floor_db / 20.0 * std::f64::consts::LN_10;
    let samples = ((floor - intercept) / slope).max(0.0).ceil() as usize;
    Some(SettlingEstimate {
        decay_per_sample: slope,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biquad::{BiQuad, BiQuadCascade, FilterType};
    use crate::fir::Fir;

    const FS: f64 = 44100.0;

    #[test]
    fn test_impulse_of_fir_walks_taps_backwards() {
        let mut fir = Fir::new(&[0.5, 0.3, 0.2]).unwrap();
        let response = impulse_response(&mut fir);
        assert_eq!(response.len(), 3);
        // newest sample meets the last tap
        assert_eq!(response, vec![0.2, 0.3, 0.5]);
    }

    #[test]
    fn test_step_is_running_sum_of_impulse() {
        let mut cascade = BiQuadCascade::new(vec![
            BiQuad::new(1200.0, 0.9, FS, 0.0, FilterType::Lpf),
            BiQuad::new(400.0, 3.0, FS, 4.0, FilterType::PeakingEq),
        ])
        .unwrap();
        let mut fresh = cascade.clone();
        let impulse = impulse_response(&mut cascade);
        let step = step_response(&mut fresh);
        assert_eq!(impulse.len(), 1000);

        let mut running = 0.0;
        for (h, s) in impulse.iter().zip(&step) {
            running += h;
            assert!((running - s).abs() < 1e-9);
        }
    }

    #[test]
    fn test_quadrature_tracks_lowpass() {
        let lpf = BiQuad::new(2205.0, 0.707, FS, 0.0, FilterType::Lpf);
        let mut measurement = QuadratureResponse::new(&lpf, 20.0, 20000.0, FS, 1.0).unwrap();
        assert_eq!(measurement.size(), 44100);

        let curve = measurement.response().unwrap();
        assert_eq!(curve.len(), 44100);
        assert!((curve.magnitudes[1000] - 1.0).abs() < 0.05);
        assert!(*curve.magnitudes.last().unwrap() < 0.05);
        assert!(curve.frequencies.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_quadrature_reports_nan_as_failure() {
        let broken = BiQuad::from_coefficients(1.0, [1.0, f64::NAN, 0.0], [1.0, 0.0, 0.0]).unwrap();
        let curve = QuadratureResponse::measure(&broken, 20.0, 2000.0, 8000.0, 0.1).unwrap();
        assert!(curve.is_none());
    }

    #[test]
    fn test_quadrature_copies_are_independent() {
        let lpf = BiQuad::new(500.0, 0.707, FS, 0.0, FilterType::Lpf);
        let measurement = QuadratureResponse::new(&lpf, 20.0, 200.0, FS, 0.01).unwrap();
        let (i, q) = measurement.filters();
        assert_ne!(i, q);
        assert_eq!(i.a(), lpf.a());
    }

    #[test]
    fn test_settling_grows_with_q() {
        let broad = BiQuad::new(1000.0, 0.707, FS, 0.0, FilterType::BpfQPeak);
        let narrow = BiQuad::new(1000.0, 30.0, FS, 0.0, FilterType::BpfQPeak);
        let broad = estimate_settling(&broad, 8192, -60.0).unwrap();
        let narrow = estimate_settling(&narrow, 8192, -60.0).unwrap();
        assert!(broad.decay_per_sample < narrow.decay_per_sample);
        assert!(narrow.samples > broad.samples);
    }

    #[test]
    fn test_settling_of_non_decaying_filter() {
        let passthrough = BiQuad::new(1000.0, 1.0, FS, 0.0, FilterType::Off);
        assert!(estimate_settling(&passthrough, 1024, -60.0).is_none());
    }
}
