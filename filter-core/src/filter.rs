//! # Stateful Filter Contract
//!
//! Every time-domain filter in this crate consumes one sample and produces
//! one sample while carrying its delay-line state between calls. The
//! response harness in [`crate::response`] is written against this trait
//! only, so it can characterise a biquad, a cascade or an FIR alike.
//!
//! Instances are not meant to be shared between threads. Each caller that
//! needs an independent run clones its own copy; `Clone` is a deep copy that
//! includes every cascaded section and the full delay line.

/// A single-input single-output filter with internal state.
pub trait StatefulFilter: Clone {
    /// Feeds one sample through the filter and returns the output sample.
    fn process(&mut self, input: f64) -> f64;

    /// Number of samples the filter (and everything chained after it) is
    /// expected to need before its transient dies out.
    fn length(&self) -> usize;

    /// Pre-loads the delay line with `value`, flushing earlier state.
    fn load(&mut self, value: f64);

    /// Runs a whole buffer through [`process`](Self::process).
    fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&sample| self.process(sample)).collect()
    }
}
