//! # Configuration Module
//!
//! Serializable descriptions of filters and analyses, so a caller can keep
//! its filter bank or measurement setup in a JSON file instead of code.
//!
//! ```json
//! {
//!   "cascade": { "sections": [
//!     { "center": 2205.0, "q": 0.707, "sample_rate": 44100.0, "filter_type": "Lpf" }
//!   ]},
//!   "spectrum": { "sample_rate": 44100.0, "window": "Hann", "dither": { "Seeded": 7 } }
//! }
//! ```

use crate::ResponseCurve;
use crate::biquad::{BiQuad, BiQuadCascade, FilterType};
use crate::error::Result;
use crate::fft::{self, DitherSource, NoDither, RandomDither};
use crate::filter::StatefulFilter;
use crate::response::QuadratureResponse;
use crate::window::WindowType;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of one designed biquad section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiQuadDesign {
    pub center: f64,
    pub q: f64,
    pub sample_rate: f64,
    #[serde(default)]
    pub gain_db: f64,
    pub filter_type: FilterType,
}

impl BiQuadDesign {
    pub fn build(&self) -> BiQuad {
        BiQuad::new(self.center, self.q, self.sample_rate, self.gain_db, self.filter_type)
    }
}

/// Sections of a cascade, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeDesign {
    pub sections: Vec<BiQuadDesign>,
}

impl CascadeDesign {
    /// # Errors
    /// * [`crate::FilterError::EmptyCascade`] if no sections are listed
    pub fn build(&self) -> Result<BiQuadCascade> {
        BiQuadCascade::new(self.sections.iter().map(BiQuadDesign::build).collect())
    }
}

/// How spectral analysis perturbs its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DitherMode {
    /// OS-seeded random dither.
    #[default]
    Random,
    /// Reproducible dither from a fixed seed.
    Seeded(u64),
    /// No dither; silent buffers yield an all-zero spectrum.
    Off,
}

impl DitherMode {
    pub fn dither_source(&self) -> Box<dyn DitherSource> {
        match *self {
            DitherMode::Random => Box::new(RandomDither::new()),
            DitherMode::Seeded(seed) => Box::new(RandomDither::seeded(seed)),
            DitherMode::Off => Box::new(NoDither),
        }
    }
}

/// Spectral analysis setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    pub sample_rate: f64,
    /// Window applied before transforming; `None` gives a plain normalised
    /// spectrum.
    #[serde(default)]
    pub window: Option<WindowType>,
    #[serde(default)]
    pub dither: DitherMode,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            window: None,
            dither: DitherMode::Random,
        }
    }
}

impl SpectrumConfig {
    /// Spectrum of `samples` according to this setup.
    ///
    /// # Errors
    /// * [`crate::FilterError::InputTooShort`] for fewer than 4 samples
    pub fn analyze(&self, samples: &[f64]) -> Result<ResponseCurve> {
        let mut dither = self.dither.dither_source();
        match self.window {
            Some(window) => {
                fft::windowed_spectrum(samples, self.sample_rate, window, dither.as_mut())
            }
            None => fft::spectrum(samples, self.sample_rate, dither.as_mut()),
        }
    }
}

/// Quadrature sweep measurement setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub start: f64,
    pub stop: f64,
    pub sample_rate: f64,
    /// Duration of the sweep in seconds.
    pub run_time: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: 20.0,
            stop: 20000.0,
            sample_rate: 44100.0,
            run_time: 1.0,
        }
    }
}

impl SweepConfig {
    /// Measures `filter`; `Ok(None)` if the measurement produced NaN.
    ///
    /// # Errors
    /// * [`crate::FilterError::InvalidSweep`] if the sweep would have no points
    pub fn measure<F: StatefulFilter>(&self, filter: &F) -> Result<Option<ResponseCurve>> {
        QuadratureResponse::measure(filter, self.start, self.stop, self.sample_rate, self.run_time)
    }
}

/// Everything a caller may keep in one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    #[serde(default)]
    pub cascade: Option<CascadeDesign>,
    #[serde(default)]
    pub spectrum: Option<SpectrumConfig>,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

impl ToolkitConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse toolkit config")
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize toolkit config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"{
        "cascade": { "sections": [
            { "center": 2205.0, "q": 0.707, "sample_rate": 44100.0, "filter_type": "Lpf" },
            { "center": 2205.0, "q": 0.707, "sample_rate": 44100.0, "filter_type": "Lpf" }
        ]},
        "spectrum": { "sample_rate": 8000.0, "window": "Hann", "dither": { "Seeded": 7 } }
    }"#;

    #[test]
    fn test_parse_example() {
        let config = ToolkitConfig::from_json_str(EXAMPLE).unwrap();
        let cascade = config.cascade.unwrap().build().unwrap();
        assert_eq!(cascade.sections().len(), 2);
        assert_eq!(cascade.sections()[0].filter_type(), FilterType::Lpf);
        assert_eq!(cascade.sections()[0].gain_db(), 0.0);

        let spectrum = config.spectrum.unwrap();
        assert_eq!(spectrum.window, Some(WindowType::Hann));
        assert_eq!(spectrum.dither, DitherMode::Seeded(7));
        assert!(config.sweep.is_none());
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = ToolkitConfig {
            cascade: Some(CascadeDesign {
                sections: vec![BiQuadDesign {
                    center: 60.0,
                    q: 10.0,
                    sample_rate: 48000.0,
                    gain_db: 0.0,
                    filter_type: FilterType::Notch,
                }],
            }),
            spectrum: None,
            sweep: Some(SweepConfig::default()),
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(ToolkitConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_json_reports_context() {
        let err = ToolkitConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().contains("toolkit config"));
    }

    #[test]
    fn test_missing_file() {
        let err = ToolkitConfig::from_path("/nonexistent/filters.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/filters.json"));
    }

    #[test]
    fn test_empty_cascade_is_rejected() {
        assert!(CascadeDesign::default().build().is_err());
    }

    #[test]
    fn test_spectrum_config_analyze() {
        let config = SpectrumConfig {
            sample_rate: 64.0,
            window: None,
            dither: DitherMode::Off,
        };
        let signal: Vec<f64> = (0..64)
            .map(|n| (2.0 * std::f64::consts::PI * 4.0 * n as f64 / 64.0).cos())
            .collect();
        let curve = config.analyze(&signal).unwrap();
        assert_eq!(curve.max_magnitude(), 1.0);
        assert!((curve.magnitudes[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sweep_config_measure() {
        let sweep = SweepConfig {
            start: 20.0,
            stop: 200.0,
            sample_rate: 8000.0,
            run_time: 0.05,
        };
        let filter = BiQuad::new(1000.0, 0.707, 8000.0, 0.0, FilterType::Lpf);
        let curve = sweep.measure(&filter).unwrap().unwrap();
        assert_eq!(curve.len(), 400);
    }
}
