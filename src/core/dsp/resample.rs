// src/core/dsp/resample.rs
//
// Spectral resampling of a real signal to an arbitrary sample count.
//
// The signal is transformed to the frequency domain, the spectrum is
// truncated or zero-padded to the target length (with the Nyquist bin
// split or folded to keep the result real), and transformed back. For
// the fixed 32-second analysis window this resamples a whole record
// in one shot and preserves its band content exactly up to the new
// Nyquist frequency.

use num_complex::Complex;

use super::fft;

/// Resample `x` to exactly `num` samples in the frequency domain.
///
/// Resampling to the input length returns the input values unchanged
/// (up to floating-point round-trip error).
pub fn resample(x: &[f64], num: usize) -> Vec<f64> {
    let nx = x.len();
    if num == 0 || nx == 0 {
        return Vec::new();
    }
    if num == nx {
        return x.to_vec();
    }

    let spectrum = fft::forward(x);
    let mut out_spectrum = vec![Complex::new(0.0, 0.0); num / 2 + 1];

    // Shared non-negative bins
    let n_min = num.min(nx);
    let nyq = n_min / 2 + 1;
    out_spectrum[..nyq].copy_from_slice(&spectrum[..nyq]);

    // Conjugate symmetry at the boundary bin
    if n_min % 2 == 0 {
        if num < nx {
            // Downsampling folds the implicit negative-frequency half
            // onto the new Nyquist bin. The inverse transform keeps
            // only its real part.
            out_spectrum[num / 2] *= 2.0;
        } else {
            // Upsampling splits the old Nyquist bin between the
            // positive and (implicit) negative halves.
            out_spectrum[nx / 2] *= 0.5;
        }
    }

    let mut y = fft::inverse(&out_spectrum, num);
    let gain = num as f64 / nx as f64;
    for v in &mut y {
        *v *= gain;
    }
    y
}
