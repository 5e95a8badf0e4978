//! End-to-end checks of the filter toolkit on the buffers the demos use.

use filter_core::fft::{self, NoDither, RandomDither};
use filter_core::response::{impulse_response_with_length, step_response_with_length};
use filter_core::{BiQuad, BiQuadCascade, FilterType, Fir, StatefulFilter, WindowType, window};
use std::f64::consts::PI;

const FS: f64 = 44100.0;

fn rms(samples: &[f64]) -> f64 {
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| (2.0 * PI * freq * n as f64 / sample_rate).sin())
        .collect()
}

#[test]
fn lowpass_cascade_attenuates_oversampled_sine() {
    let section = BiQuad::new(2205.0, 0.707, FS, 0.0, FilterType::Lpf);
    let mut cascade = BiQuadCascade::repeated(section, 2).unwrap();

    let input = sine(1000.0, FS, 441);
    let output = cascade.process_block(&input);
    assert_eq!(output.len(), 441);
    assert!(rms(&output) < rms(&input));

    let section = BiQuad::new(2205.0, 0.707, FS, 0.0, FilterType::Lpf);
    let mut cascade = BiQuadCascade::repeated(section, 2).unwrap();
    let loud = sine(8000.0, FS, 882);
    let quiet = cascade.process_block(&loud);
    assert!(rms(&quiet[441..]) < 0.1 * rms(&loud[441..]));
}

#[test]
fn notch_removes_its_center() {
    let f0 = 1000.0;
    let notch = BiQuad::new(f0, 2.0, FS, 0.0, FilterType::Notch);
    assert!(notch.amplitude(2.0 * PI * f0 / FS) < 1e-4);

    let mut notch = notch;
    let output = notch.process_block(&sine(f0, FS, 8820));
    assert!(rms(&output[4410..]) < 1e-3);
}

#[test]
fn every_design_has_unit_a0() {
    let types = [
        FilterType::Off,
        FilterType::Lpf,
        FilterType::Hpf,
        FilterType::BpfQPeak,
        FilterType::Bpf0Peak,
        FilterType::Notch,
        FilterType::Apf,
        FilterType::PeakingEq,
        FilterType::LowShelf,
        FilterType::HighShelf,
        FilterType::ButterworthLp,
        FilterType::ButterworthHp,
    ];
    for filter_type in types {
        for center in [50.0, 1000.0, 15000.0] {
            let bq = BiQuad::new(center, 1.3, 48000.0, -4.0, filter_type);
            assert_eq!(bq.a()[0], 1.0);
            assert!(bq.b().iter().all(|b| b.is_finite()));
        }
    }
}

#[test]
fn lowshelf_dc_gain_matches_request() {
    for gain in [-12.0, -3.0, 3.0, 12.0] {
        let bq = BiQuad::new(300.0, 0.707, FS, gain, FilterType::LowShelf);
        assert!((20.0 * bq.amplitude(0.0).log10() - gain).abs() < 1e-6);
    }
}

#[test]
fn cascade_response_is_product_of_sections() {
    let sections = vec![
        BiQuad::new(120.0, 0.707, FS, 0.0, FilterType::Hpf),
        BiQuad::new(9000.0, 0.707, FS, 0.0, FilterType::Lpf),
    ];
    let cascade = BiQuadCascade::new(sections.clone()).unwrap();
    let whole = cascade.frequency_response(20.0, 20000.0, FS, 256, None);
    let first = sections[0].frequency_response(20.0, 20000.0, FS, 256, None);
    let second = sections[1].frequency_response(20.0, 20000.0, FS, 256, None);

    for i in 0..256 {
        let product = first.magnitudes[i] * second.magnitudes[i];
        assert!((whole.magnitudes[i] - product).abs() <= 1e-12 * product.max(1.0));
    }
}

#[test]
fn fir_moving_average_ramp() {
    let mut fir = Fir::new(&[0.25, 0.25, 0.25, 0.25]).unwrap();
    fir.load(0.0);
    let output = fir.process_block(&[1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    let expected = [0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25, 0.0];
    for (o, e) in output.iter().zip(expected) {
        assert!((o - e).abs() < 1e-12);
    }
}

#[test]
fn step_response_integrates_impulse_response() {
    let filters = [
        BiQuad::new(700.0, 0.5, FS, 0.0, FilterType::Lpf),
        BiQuad::new(5000.0, 4.0, FS, 6.0, FilterType::PeakingEq),
        BiQuad::new(250.0, 0.707, FS, 0.0, FilterType::ButterworthHp),
    ];
    for filter in filters {
        let impulse = impulse_response_with_length(&mut filter.clone(), 400);
        let step = step_response_with_length(&mut filter.clone(), 400);
        let mut sum = 0.0;
        for (h, s) in impulse.iter().zip(&step) {
            sum += h;
            assert!((sum - s).abs() < 1e-9, "{filter}");
        }
    }

    let fir = Fir::new(&[0.1, 0.2, 0.4, 0.2, 0.1]).unwrap();
    let impulse = impulse_response_with_length(&mut fir.clone(), 5);
    let step = step_response_with_length(&mut fir.clone(), 5);
    let mut sum = 0.0;
    for (h, s) in impulse.iter().zip(&step) {
        sum += h;
        assert!((sum - s).abs() < 1e-12);
    }
}

#[test]
fn rectangular_window_keeps_samples() {
    let input = sine(1000.0, FS, 441);
    let output = window::apply_window(&input, 441, WindowType::Rectangular).unwrap();
    assert_eq!(output, input);
}

#[test]
fn windowed_buffer_feeds_the_spectrum() {
    let input = sine(1000.0, FS, 882);
    let cropped = window::apply_window(&input, 441, WindowType::BlackmanHarris).unwrap();
    let curve = fft::spectrum(&cropped, FS, &mut RandomDither::seeded(11)).unwrap();
    assert_eq!(curve.max_magnitude(), 1.0);

    let (peak, _) = curve
        .points()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap();
    assert!((peak - 1000.0).abs() <= FS / 441.0);
}

#[test]
fn normalised_spectrum_of_silence_is_finite() {
    let silence = vec![0.0; 441];
    let curve = fft::spectrum(&silence, FS, &mut NoDither).unwrap();
    assert!(curve.magnitudes.iter().all(|m| *m == 0.0));
}
