// src/core/dsp/fft.rs
//
// Real-input FFT helpers shared by the spectral analyzer and the resampler.

use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;

/// Forward real-to-complex FFT. Returns `n/2 + 1` spectrum bins.
pub fn forward(samples: &[f64]) -> Vec<Complex<f64>> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);

    let mut input = samples.to_vec();
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut input, &mut spectrum)
        .expect("planner-sized FFT buffers");
    spectrum
}

/// Inverse complex-to-real FFT producing `len` samples, normalized by
/// `1/len` so a forward/inverse pair is the identity.
///
/// The imaginary parts of the DC bin (and the Nyquist bin for even
/// `len`) are discarded; a spectrum that is only approximately
/// Hermitian still inverts to a real signal.
pub fn inverse(spectrum: &[Complex<f64>], len: usize) -> Vec<f64> {
    if len == 0 || spectrum.len() != len / 2 + 1 {
        return vec![0.0; len];
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let c2r = planner.plan_fft_inverse(len);

    let mut input = spectrum.to_vec();
    input[0].im = 0.0;
    if len % 2 == 0 {
        let last = input.len() - 1;
        input[last].im = 0.0;
    }

    let mut output = c2r.make_output_vec();
    c2r.process(&mut input, &mut output)
        .expect("planner-sized FFT buffers");

    let scale = 1.0 / len as f64;
    for v in &mut output {
        *v *= scale;
    }
    output
}

/// Frequency axis for the first `bins` bins of an `n`-point transform:
/// `k * sample_rate / n`.
pub fn bin_frequencies(n: usize, sample_rate: f64, bins: usize) -> Vec<f64> {
    (0..bins)
        .map(|k| k as f64 * sample_rate / n as f64)
        .collect()
}
