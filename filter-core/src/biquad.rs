//! # Biquad Module
//!
//! Second-order IIR sections designed from closed-form cookbook formulas,
//! run in direct-form-II-transposed, plus a serial cascade of sections.
//!
//! ## Features
//! - RBJ cookbook designs (LPF, HPF, band-pass, notch, peaking, shelves)
//! - Bilinear-transform Butterworth low/high pass
//! - Coefficient rescaling that balances `scale` against the `B` taps
//! - Closed-form magnitude response without complex arithmetic
//! - Log-spaced frequency response sweeps over whole cascades

use crate::ResponseCurve;
use crate::error::{FilterError, Result};
use crate::filter::StatefulFilter;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Fixed settling budget assumed per section.
pub const SECTION_LENGTH: usize = 500;

/// Upper bound on the amplification folded into the `B` taps by rescaling.
const MAX_RESCALE: f64 = 8.0;

/// Biquad response shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    /// Unity passthrough.
    Off,
    /// Low-pass filter
    Lpf,
    /// High-pass filter
    Hpf,
    /// Band-pass with peak gain Q
    BpfQPeak,
    /// Band-pass with 0 dB peak gain
    Bpf0Peak,
    /// Notch filter
    Notch,
    /// All-pass (implemented as an attenuating passthrough)
    Apf,
    /// Peaking EQ
    PeakingEq,
    /// Low-shelf filter
    LowShelf,
    /// High-shelf filter
    HighShelf,
    /// Raw coefficients supplied by the caller
    Custom,
    /// Butterworth low-pass via bilinear transform
    ButterworthLp,
    /// Butterworth high-pass via bilinear transform
    ButterworthHp,
}

impl FilterType {
    /// Returns the long string representation of the filter type.
    pub fn name(&self) -> &'static str {
        match self {
            FilterType::Off => "Off",
            FilterType::Lpf => "LPF",
            FilterType::Hpf => "HPF",
            FilterType::BpfQPeak => "BPF_Q_Peak",
            FilterType::Bpf0Peak => "BPF_0_Peak",
            FilterType::Notch => "Notch",
            FilterType::Apf => "APF",
            FilterType::PeakingEq => "PeakingEQ",
            FilterType::LowShelf => "LowShelf",
            FilterType::HighShelf => "HighShelf",
            FilterType::Custom => "Custom",
            FilterType::ButterworthLp => "ButterworthLP",
            FilterType::ButterworthHp => "ButterworthHP",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw (unnormalised) numerator and denominator of one design.
struct Taps {
    b: [f64; 3],
    a: [f64; 3],
}

impl Taps {
    /// Divides all six taps by `a0`.
    fn normalized(self) -> ([f64; 3], [f64; 3]) {
        let a0 = self.a[0];
        (
            [self.a[0] / a0, self.a[1] / a0, self.a[2] / a0],
            [self.b[0] / a0, self.b[1] / a0, self.b[2] / a0],
        )
    }
}

fn lpf(omega: f64, alpha: f64, gain_db: f64) -> Taps {
    let cos = omega.cos();
    let g = 10f64.powf(gain_db / 20.0);
    Taps {
        b: [(1.0 - cos) / 2.0 * g, (1.0 - cos) * g, (1.0 - cos) / 2.0 * g],
        a: [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
    }
}

fn hpf(omega: f64, alpha: f64, gain_db: f64) -> Taps {
    let cos = omega.cos();
    let g = 10f64.powf(gain_db / 20.0);
    Taps {
        b: [(1.0 + cos) / 2.0 * g, -(1.0 + cos) * g, (1.0 + cos) / 2.0 * g],
        a: [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
    }
}

fn bpf_q_peak(omega: f64, alpha: f64, q: f64) -> Taps {
    Taps {
        b: [q * alpha, 0.0, -q * alpha],
        a: [1.0 + alpha, -2.0 * omega.cos(), 1.0 - alpha],
    }
}

fn bpf_0_peak(omega: f64, alpha: f64) -> Taps {
    Taps {
        b: [alpha, 0.0, -alpha],
        a: [1.0 + alpha, -2.0 * omega.cos(), 1.0 - alpha],
    }
}

fn notch(omega: f64, alpha: f64) -> Taps {
    let cos = omega.cos();
    Taps {
        b: [1.0, -2.0 * cos, 1.0],
        a: [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
    }
}

/// Passthrough attenuated by `min(0, gain)` dB; not a true all-pass.
fn apf(gain_db: f64) -> Taps {
    Taps {
        b: [10f64.powf((gain_db / 20.0).min(0.0)), 0.0, 0.0],
        a: [1.0, 0.0, 0.0],
    }
}

fn peaking_eq(omega: f64, alpha: f64, amp: f64) -> Taps {
    let cos = omega.cos();
    Taps {
        b: [1.0 + alpha * amp, -2.0 * cos, 1.0 - alpha * amp],
        a: [1.0 + alpha / amp, -2.0 * cos, 1.0 - alpha / amp],
    }
}

fn low_shelf(omega: f64, alpha: f64, amp: f64) -> Taps {
    let cos = omega.cos();
    let root = 2.0 * amp.sqrt() * alpha;
    Taps {
        b: [
            amp * ((amp + 1.0) - (amp - 1.0) * cos + root),
            2.0 * amp * ((amp - 1.0) - (amp + 1.0) * cos),
            amp * ((amp + 1.0) - (amp - 1.0) * cos - root),
        ],
        a: [
            (amp + 1.0) + (amp - 1.0) * cos + root,
            -2.0 * ((amp - 1.0) + (amp + 1.0) * cos),
            (amp + 1.0) + (amp - 1.0) * cos - root,
        ],
    }
}

fn high_shelf(omega: f64, alpha: f64, amp: f64) -> Taps {
    let cos = omega.cos();
    let root = 2.0 * amp.sqrt() * alpha;
    Taps {
        b: [
            amp * ((amp + 1.0) + (amp - 1.0) * cos + root),
            -2.0 * amp * ((amp - 1.0) + (amp + 1.0) * cos),
            amp * ((amp + 1.0) + (amp - 1.0) * cos - root),
        ],
        a: [
            (amp + 1.0) - (amp - 1.0) * cos + root,
            2.0 * ((amp - 1.0) - (amp + 1.0) * cos),
            (amp + 1.0) - (amp - 1.0) * cos - root,
        ],
    }
}

fn butterworth(center: f64, q: f64, sample_rate: f64, highpass: bool) -> Taps {
    let k = (PI * center / sample_rate).tan();
    let k2 = k * k;
    let b = if highpass {
        [1.0, -2.0, 1.0]
    } else {
        [k2, 2.0 * k2, k2]
    };
    Taps {
        b,
        a: [k2 + k / q + 1.0, 2.0 * (k2 - 1.0), k2 - k / q + 1.0],
    }
}

/// `sin²(w/2)`
fn phi(w: f64) -> f64 {
    let s = (w / 2.0).sin();
    s * s
}

/// `(c0+c1+c2)² - 4(c0c1 + 4c0c2 + c1c2)φ + 16c0c2φ²`, i.e. `|C(e^jw)|²`.
fn power_term(c: [f64; 3], phi: f64) -> f64 {
    let sum = c[0] + c[1] + c[2];
    sum * sum - 4.0 * (c[0] * c[1] + 4.0 * c[0] * c[2] + c[1] * c[2]) * phi
        + 16.0 * c[0] * c[2] * phi * phi
}

fn log_frequencies(start: f64, stop: f64, points: usize) -> impl Iterator<Item = f64> {
    let log_start = start.log10();
    let delta = (stop.log10() - log_start) / points as f64;
    (0..points).map(move |i| 10f64.powf(log_start + delta * i as f64))
}

/// One second-order IIR section.
///
/// Deserialization goes through [`BiQuad::from_coefficients`], so stored taps
/// are re-normalised and a zero `a[0]` is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredBiQuad")]
pub struct BiQuad {
    /// Feedback taps, `a[0]` is always 1.
    a: [f64; 3],
    /// Feed-forward taps.
    b: [f64; 3],
    /// Input gain applied before the taps.
    scale: f64,
    #[serde(skip)]
    z1: f64,
    #[serde(skip)]
    z2: f64,
    center_frequency: f64,
    sample_rate: f64,
    q: f64,
    gain_db: f64,
    filter_type: FilterType,
}

/// Serialized form of a [`BiQuad`], without its delay line.
#[derive(Deserialize)]
struct StoredBiQuad {
    a: [f64; 3],
    b: [f64; 3],
    scale: f64,
    center_frequency: f64,
    sample_rate: f64,
    q: f64,
    gain_db: f64,
    filter_type: FilterType,
}

impl TryFrom<StoredBiQuad> for BiQuad {
    type Error = FilterError;

    fn try_from(stored: StoredBiQuad) -> Result<Self> {
        let mut biquad = BiQuad::from_coefficients(stored.scale, stored.a, stored.b)?;
        biquad.center_frequency = stored.center_frequency;
        biquad.sample_rate = stored.sample_rate;
        biquad.q = stored.q;
        biquad.gain_db = stored.gain_db;
        biquad.filter_type = stored.filter_type;
        Ok(biquad)
    }
}

impl Default for BiQuad {
    fn default() -> Self {
        Self::peaking(1000.0, 48000.0)
    }
}

impl BiQuad {
    /// Designs a section from its centre frequency, Q, sample rate and gain.
    ///
    /// Passing [`FilterType::Custom`] yields a unity passthrough; use
    /// [`from_coefficients`](Self::from_coefficients) for raw taps.
    ///
    /// # Arguments
    /// * `center` - Corner, centre or shelf frequency in Hz
    /// * `q` - Quality factor; the Butterworth designs expect `1/√2` for a flat passband
    /// * `sample_rate` - Sample rate in Hz
    /// * `gain_db` - Gain in dB; used by the peaking, shelf, LPF/HPF and APF designs
    /// * `filter_type` - Response shape
    pub fn new(
        center: f64,
        q: f64,
        sample_rate: f64,
        gain_db: f64,
        filter_type: FilterType,
    ) -> Self {
        let mut biquad = Self {
            a: [1.0, 0.0, 0.0],
            b: [1.0, 0.0, 0.0],
            scale: 1.0,
            z1: 0.0,
            z2: 0.0,
            center_frequency: center,
            sample_rate,
            q,
            gain_db,
            filter_type,
        };
        biquad.design(center, q, sample_rate, gain_db, filter_type);
        biquad
    }

    /// Like [`new`](Self::new) but rejects parameters the formulas cannot honour.
    ///
    /// # Errors
    /// * [`FilterError::InvalidSampleRate`] if `sample_rate <= 0`
    /// * [`FilterError::InvalidQ`] if `q <= 0`
    /// * [`FilterError::InvalidFrequency`] if `center` is outside `(0, sample_rate / 2)`
    pub fn try_new(
        center: f64,
        q: f64,
        sample_rate: f64,
        gain_db: f64,
        filter_type: FilterType,
    ) -> Result<Self> {
        if !(sample_rate > 0.0) {
            return Err(FilterError::InvalidSampleRate { sample_rate });
        }
        if !(q > 0.0) {
            return Err(FilterError::InvalidQ { q });
        }
        let nyquist = sample_rate / 2.0;
        if !(center > 0.0 && center < nyquist) {
            return Err(FilterError::InvalidFrequency { freq: center, nyquist });
        }
        Ok(Self::new(center, q, sample_rate, gain_db, filter_type))
    }

    /// A flat peaking section (Q 4, 0 dB) at `center`.
    pub fn peaking(center: f64, sample_rate: f64) -> Self {
        Self::new(center, 4.0, sample_rate, 0.0, FilterType::PeakingEq)
    }

    /// Wraps caller-supplied taps. No rescaling is applied.
    ///
    /// `a` is normalised so that `a[0] == 1`.
    ///
    /// # Errors
    /// * [`FilterError::ZeroLeadingCoefficient`] if `a[0]` is zero
    pub fn from_coefficients(scale: f64, a: [f64; 3], b: [f64; 3]) -> Result<Self> {
        if a[0] == 0.0 {
            return Err(FilterError::ZeroLeadingCoefficient);
        }
        let (a, b) = Taps { b, a }.normalized();
        Ok(Self {
            a,
            b,
            scale,
            z1: 0.0,
            z2: 0.0,
            center_frequency: 0.0,
            sample_rate: 0.0,
            q: 0.0,
            gain_db: 0.0,
            filter_type: FilterType::Custom,
        })
    }

    /// Raw taps tagged with the design point they were measured at.
    ///
    /// # Errors
    /// * [`FilterError::ZeroLeadingCoefficient`] if `a[0]` is zero
    pub fn with_design_point(
        a: [f64; 3],
        b: [f64; 3],
        center: f64,
        sample_rate: f64,
    ) -> Result<Self> {
        let mut biquad = Self::from_coefficients(1.0, a, b)?;
        biquad.center_frequency = center;
        biquad.sample_rate = sample_rate;
        biquad.q = 1.0;
        Ok(biquad)
    }

    /// Replaces the taps with raw coefficients, folding `scale` into `b`.
    ///
    /// # Errors
    /// * [`FilterError::ZeroLeadingCoefficient`] if `a[0]` is zero
    pub fn set_coefficients(
        &mut self,
        scale: f64,
        a: [f64; 3],
        b: [f64; 3],
        sample_rate: f64,
    ) -> Result<()> {
        if a[0] == 0.0 {
            return Err(FilterError::ZeroLeadingCoefficient);
        }
        let (a, b) = Taps {
            b: [b[0] * scale, b[1] * scale, b[2] * scale],
            a,
        }
        .normalized();
        self.a = a;
        self.b = b;
        self.scale = 1.0;
        self.sample_rate = sample_rate;
        self.filter_type = FilterType::Custom;
        Ok(())
    }

    /// Recomputes all six taps from the given design parameters.
    ///
    /// A [`FilterType::Custom`] section keeps its taps; only the design point
    /// moves, and its gain is re-measured there.
    fn design(
        &mut self,
        center: f64,
        q: f64,
        sample_rate: f64,
        gain_db: f64,
        filter_type: FilterType,
    ) {
        self.center_frequency = center;
        self.sample_rate = sample_rate;
        if self.filter_type == FilterType::Custom {
            self.gain_db = 20.0 * self.amplitude(self.omega()).log10();
            self.q = 0.0;
            return;
        }

        self.q = q;
        self.gain_db = gain_db;
        self.filter_type = filter_type;
        self.scale = 1.0;

        let amp = 10f64.powf(gain_db / 40.0);
        let omega = 2.0 * PI * center / sample_rate;
        let alpha = omega.sin() / (2.0 * q);

        let taps = match filter_type {
            FilterType::Lpf => lpf(omega, alpha, gain_db),
            FilterType::Hpf => hpf(omega, alpha, gain_db),
            FilterType::BpfQPeak => bpf_q_peak(omega, alpha, q),
            FilterType::Bpf0Peak => bpf_0_peak(omega, alpha),
            FilterType::Notch => notch(omega, alpha),
            FilterType::Apf => apf(gain_db),
            FilterType::PeakingEq => peaking_eq(omega, alpha, amp),
            FilterType::LowShelf => low_shelf(omega, alpha, amp),
            FilterType::HighShelf => high_shelf(omega, alpha, amp),
            FilterType::ButterworthLp => butterworth(center, q, sample_rate, false),
            FilterType::ButterworthHp => butterworth(center, q, sample_rate, true),
            FilterType::Off | FilterType::Custom => apf(0.0),
        };
        let (a, b) = taps.normalized();
        self.a = a;
        self.b = b;
        self.rescale();

        log::debug!(
            "designed {} @{}Hz q={} gain={}dB scale={}",
            filter_type,
            center,
            q,
            gain_db,
            self.scale
        );
    }

    /// Balances the dynamic range of `scale` and the `B` taps.
    ///
    /// Folds `min(1/max(B), 1/sqrt(|scale·min(B)|), 8)` into `B` and divides
    /// it back out of `scale`, so `scale·B` is unchanged.
    fn rescale(&mut self) {
        let max_b = self.b[0].max(self.b[1]).max(self.b[2]);
        let min_b = self.b[0].min(self.b[1]).min(self.b[2]);
        let max_scale = 1.0 / max_b;
        let req_scale = 1.0 / (self.scale * min_b).abs().sqrt();

        let mut act_scale = max_scale.min(req_scale).min(MAX_RESCALE);
        if act_scale < 1.0 && self.filter_type == FilterType::Hpf {
            act_scale *= 2.0;
        }
        // all-negative or NaN taps leave nothing sensible to fold in
        if !(act_scale.is_finite() && act_scale > 0.0) {
            return;
        }

        for tap in &mut self.b {
            *tap *= act_scale;
        }
        self.scale /= act_scale;
    }

    /// Redesigns at the current parameters.
    fn redesign(&mut self) {
        self.design(
            self.center_frequency,
            self.q,
            self.sample_rate,
            self.gain_db,
            self.filter_type,
        );
    }

    /// Redesigns in place with new parameters; `Custom` sections only move
    /// their design point.
    pub fn set_design(
        &mut self,
        center: f64,
        q: f64,
        sample_rate: f64,
        gain_db: f64,
        filter_type: FilterType,
    ) {
        self.design(center, q, sample_rate, gain_db, filter_type);
    }

    /// Sets the bandwidth in octaves and redesigns.
    pub fn set_bandwidth(&mut self, bandwidth: f64) {
        let omega = self.omega();
        let inv_q = 2.0 * (0.34657359 * bandwidth * omega / omega.sin()).sinh();
        self.q = 1.0 / inv_q;
        self.redesign();
    }

    /// Sets the gain in dB and redesigns.
    pub fn set_gain(&mut self, gain_db: f64) {
        self.gain_db = gain_db;
        self.redesign();
    }

    /// Switches the response shape and redesigns.
    ///
    /// Leaving `Custom` this way discards the raw taps.
    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        if self.filter_type == FilterType::Custom && filter_type != FilterType::Custom {
            // the design formulas skip custom sections
            self.filter_type = FilterType::Off;
        }
        let q = if self.q > 0.0 { self.q } else { 1.0 };
        self.design(self.center_frequency, q, self.sample_rate, self.gain_db, filter_type);
    }

    /// Changes the sample rate; designed sections are redesigned.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        if self.filter_type != FilterType::Custom {
            self.redesign();
        }
    }

    /// Feedback taps (`a[0] == 1`).
    pub fn a(&self) -> [f64; 3] {
        self.a
    }

    /// Feed-forward taps, without `scale`.
    pub fn b(&self) -> [f64; 3] {
        self.b
    }

    /// Input gain applied ahead of the taps.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Design frequency in Hz; 0 for taps built without one.
    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    /// Sample rate in Hz the taps were designed for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Quality factor; 0 for custom taps.
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Requested gain, or for custom taps the gain measured at the design point.
    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    /// Response shape the taps came from.
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Normalised angular centre frequency in radians per sample.
    pub fn omega(&self) -> f64 {
        2.0 * PI * self.center_frequency / self.sample_rate
    }

    /// Bandwidth in octaves implied by the current Q.
    pub fn bandwidth(&self) -> f64 {
        let omega = self.omega();
        (1.0 / (2.0 * self.q)).asinh() * 2.8854 * omega.sin() / omega
    }

    /// Magnitude response `|H(w)|` at angular frequency `w` (radians/sample).
    ///
    /// Returns 0 when the expression is undefined.
    pub fn amplitude(&self, w: f64) -> f64 {
        let phi = phi(w);
        let b = self.b.map(|tap| tap * self.scale);
        let y = power_term(b, phi).sqrt() / power_term(self.a, phi).sqrt();
        if y.is_nan() { 0.0 } else { y }
    }

    /// Magnitude response at `points` log-spaced frequencies from `start`
    /// towards `stop` (exclusive), clamped to at least `floor` when given.
    ///
    /// A NaN or exact zero repeats the previous point.
    ///
    /// # Arguments
    /// * `start` - First frequency in Hz, must be positive
    /// * `stop` - Upper end of the sweep in Hz, never reached
    /// * `sample_rate` - Rate used to map Hz onto radians per sample
    /// * `points` - Number of log-spaced points
    /// * `floor` - Optional lower bound on every magnitude
    ///
    /// # Returns
    /// * `ResponseCurve` - Linear magnitudes on the log-spaced axis
    pub fn frequency_response(
        &self,
        start: f64,
        stop: f64,
        sample_rate: f64,
        points: usize,
        floor: Option<f64>,
    ) -> ResponseCurve {
        let mut curve = self.raw_response(start, stop, sample_rate, points);
        if let Some(floor) = floor {
            curve.clamp_floor(floor);
        }
        curve
    }

    fn raw_response(
        &self,
        start: f64,
        stop: f64,
        sample_rate: f64,
        points: usize,
    ) -> ResponseCurve {
        let b = self.b.map(|tap| tap * self.scale);
        let mut curve = ResponseCurve::with_capacity(points);
        let mut previous = 0.0;

        for freq in log_frequencies(start, stop, points) {
            let phi = phi(freq / sample_rate * 2.0 * PI);
            let mut magnitude = power_term(b, phi).sqrt() / power_term(self.a, phi).sqrt();
            if magnitude.is_nan() || magnitude == 0.0 {
                magnitude = previous;
            }
            previous = magnitude;
            curve.push(freq, magnitude);
        }
        curve
    }

    /// Largest absolute tap of this section.
    pub fn max_coefficient(&self) -> f64 {
        self.a
            .iter()
            .chain(&self.b)
            .fold(0.0, |max, tap| max.max(tap.abs()))
    }

    /// Clears the delay line.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl StatefulFilter for BiQuad {
    fn process(&mut self, input: f64) -> f64 {
        let scaled = input * self.scale;
        let out = scaled * self.b[0] + self.z2;
        self.z2 = self.z1 + self.b[1] * scaled - self.a[1] * out;
        self.z1 = self.b[2] * scaled - self.a[2] * out;
        out
    }

    fn length(&self) -> usize {
        SECTION_LENGTH
    }

    fn load(&mut self, value: f64) {
        for _ in 0..self.length() {
            self.process(value);
        }
    }
}

impl fmt::Display for BiQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} biquad(s) @{}Hz, {}dB",
            self.filter_type, self.center_frequency, self.gain_db
        )
    }
}

/// Biquad sections applied in series; each output feeds the next section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredCascade")]
pub struct BiQuadCascade {
    sections: Vec<BiQuad>,
}

#[derive(Deserialize)]
struct StoredCascade {
    sections: Vec<BiQuad>,
}

impl TryFrom<StoredCascade> for BiQuadCascade {
    type Error = FilterError;

    fn try_from(stored: StoredCascade) -> Result<Self> {
        BiQuadCascade::new(stored.sections)
    }
}

impl BiQuadCascade {
    /// # Errors
    /// * [`FilterError::EmptyCascade`] if `sections` is empty
    pub fn new(sections: Vec<BiQuad>) -> Result<Self> {
        if sections.is_empty() {
            return Err(FilterError::EmptyCascade);
        }
        Ok(Self { sections })
    }

    /// `count` identical copies of `section` in series.
    pub fn repeated(section: BiQuad, count: usize) -> Result<Self> {
        Self::new(vec![section; count])
    }

    /// Appends a section at the end of the chain.
    pub fn push(&mut self, section: BiQuad) {
        self.sections.push(section);
    }

    /// Sections in processing order.
    pub fn sections(&self) -> &[BiQuad] {
        &self.sections
    }

    /// Sections in processing order, for in-place redesign.
    pub fn sections_mut(&mut self) -> &mut [BiQuad] {
        &mut self.sections
    }

    /// Product of every section's magnitude at `w`.
    pub fn amplitude(&self, w: f64) -> f64 {
        self.sections.iter().map(|s| s.amplitude(w)).product()
    }

    /// Pointwise product of the sections' responses, floored at the end.
    pub fn frequency_response(
        &self,
        start: f64,
        stop: f64,
        sample_rate: f64,
        points: usize,
        floor: Option<f64>,
    ) -> ResponseCurve {
        let mut sections = self.sections.iter();
        let mut curve = match sections.next() {
            Some(first) => first.raw_response(start, stop, sample_rate, points),
            None => return ResponseCurve::default(),
        };
        for section in sections {
            let next = section.raw_response(start, stop, sample_rate, points);
            for (magnitude, factor) in curve.magnitudes.iter_mut().zip(next.magnitudes) {
                *magnitude *= factor;
            }
        }
        if let Some(floor) = floor {
            curve.clamp_floor(floor);
        }
        curve
    }

    /// Largest absolute tap across the whole chain.
    pub fn max_coefficient(&self) -> f64 {
        self.sections
            .iter()
            .map(BiQuad::max_coefficient)
            .fold(0.0, f64::max)
    }

    /// Clears every section's delay line.
    pub fn reset(&mut self) {
        self.sections.iter_mut().for_each(BiQuad::reset);
    }
}

impl StatefulFilter for BiQuadCascade {
    fn process(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.process(sample))
    }

    fn length(&self) -> usize {
        self.sections.iter().map(StatefulFilter::length).sum()
    }

    fn load(&mut self, value: f64) {
        for _ in 0..self.length() {
            self.process(value);
        }
    }
}

impl fmt::Display for BiQuadCascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sections.first() {
            Some(first) => write!(
                f,
                "{} {} biquad(s) @{}Hz, {}dB",
                self.sections.len(),
                first.filter_type,
                first.center_frequency,
                first.gain_db
            ),
            None => f.write_str("empty cascade"),
        }
    }
}
