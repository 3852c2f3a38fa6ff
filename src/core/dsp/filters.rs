// src/core/dsp/filters.rs
//
// IIR filter design and zero-phase filtering.
//
// Butterworth design follows the classic analog-prototype route:
// unit-circle pole placement, lowpass-to-highpass transform at the
// prewarped cutoff, then the bilinear transform back to the z-domain.
// Zero-phase filtering runs the filter forward and backward over an
// odd-extended signal with steady-state initial conditions, so the
// output has no phase distortion and no startup transient.

use num_complex::Complex;
use std::f64::consts::PI;
use thiserror::Error;

/// Filter design and application failures
#[derive(Debug, Error)]
pub enum DspError {
    #[error("normalized cutoff {0} outside the open interval (0, 1)")]
    InvalidCutoff(f64),
    #[error("filter order must be at least 1")]
    InvalidOrder,
    #[error("input of {len} samples too short for zero-phase filtering (needs more than {min})")]
    InputTooShort { len: usize, min: usize },
    #[error("singular system while solving filter initial conditions")]
    SingularSystem,
}

/// Digital high-pass Butterworth filter as transfer-function
/// coefficients (b, a), both of length `order + 1` with `a[0] == 1`.
///
/// `cutoff` is normalized to the Nyquist frequency, e.g. 10 Hz at a
/// 16384 Hz sample rate is `10.0 / 8192.0`.
pub fn butter_highpass(order: usize, cutoff: f64) -> Result<(Vec<f64>, Vec<f64>), DspError> {
    if order == 0 {
        return Err(DspError::InvalidOrder);
    }
    if !(cutoff > 0.0 && cutoff < 1.0) {
        return Err(DspError::InvalidCutoff(cutoff));
    }

    // Analog Butterworth prototype: poles evenly spaced on the left
    // half of the unit circle, no zeros, unity gain.
    let n = order as i64;
    let proto_poles: Vec<Complex<f64>> = (0..order)
        .map(|k| {
            let m = (2 * k as i64 + 1 - n) as f64;
            -(Complex::new(0.0, PI * m / (2.0 * n as f64))).exp()
        })
        .collect();

    // Prewarp the cutoff for the bilinear transform (fs = 2, so the
    // normalized frequency maps straight onto [0, 1]).
    let fs = 2.0;
    let warped = 2.0 * fs * (PI * cutoff / fs).tan();

    // Lowpass-to-highpass: poles invert around the cutoff, the n
    // prototype zeros at infinity land at the origin. The prototype
    // pole product is unity so the gain stays 1.
    let hp_poles: Vec<Complex<f64>> = proto_poles.iter().map(|&p| warped / p).collect();
    let hp_zeros: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); order];

    // Bilinear transform of the zpk system.
    let fs2 = 2.0 * fs;
    let z_digital: Vec<Complex<f64>> = hp_zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    let p_digital: Vec<Complex<f64>> = hp_poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    let num: Complex<f64> = hp_zeros
        .iter()
        .fold(Complex::new(1.0, 0.0), |acc, &z| acc * (fs2 - z));
    let den: Complex<f64> = hp_poles
        .iter()
        .fold(Complex::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
    let gain = (num / den).re;

    let mut b: Vec<f64> = poly_from_roots(&z_digital)
        .iter()
        .map(|c| gain * c.re)
        .collect();
    let mut a: Vec<f64> = poly_from_roots(&p_digital).iter().map(|c| c.re).collect();

    let a0 = a[0];
    for v in b.iter_mut().chain(&mut a) {
        *v /= a0;
    }
    Ok((b, a))
}

/// Expand a monic polynomial from its roots.
fn poly_from_roots(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for r in roots {
        coeffs.push(Complex::new(0.0, 0.0));
        for i in (1..coeffs.len()).rev() {
            let prev = coeffs[i - 1];
            coeffs[i] -= r * prev;
        }
    }
    coeffs
}

/// Direct-form II transposed IIR filter with explicit initial state.
///
/// `state` must hold `max(len(b), len(a)) - 1` values; it is updated
/// in place so a caller can continue filtering across chunks.
pub fn lfilter(b: &[f64], a: &[f64], x: &[f64], state: &mut [f64]) -> Vec<f64> {
    let order = b.len().max(a.len()) - 1;
    debug_assert_eq!(state.len(), order);

    let coeff = |c: &[f64], i: usize| if i < c.len() { c[i] } else { 0.0 };

    let mut y = Vec::with_capacity(x.len());
    for &xn in x {
        let yn = coeff(b, 0) * xn + state.first().copied().unwrap_or(0.0);
        for i in 0..order {
            let next = if i + 1 < order { state[i + 1] } else { 0.0 };
            state[i] = coeff(b, i + 1) * xn + next - coeff(a, i + 1) * yn;
        }
        y.push(yn);
    }
    y
}

/// Steady-state initial conditions for `lfilter`.
///
/// Scaled by the first input sample, these start the filter in its
/// step-response steady state so a constant input produces a constant
/// output from the very first sample.
pub fn lfilter_zi(b: &[f64], a: &[f64]) -> Result<Vec<f64>, DspError> {
    let n = b.len().max(a.len());
    if n < 2 {
        return Ok(Vec::new());
    }
    let order = n - 1;
    let coeff = |c: &[f64], i: usize| if i < c.len() { c[i] } else { 0.0 };

    // Solve (I - A^T) zi = B where A is the companion matrix of `a`
    // and B folds the feed-forward path: B[i] = b[i+1] - a[i+1] * b[0].
    let mut m = vec![vec![0.0; order]; order];
    let mut rhs = vec![0.0; order];
    for i in 0..order {
        m[i][i] = 1.0;
        m[i][0] += coeff(a, i + 1);
        if i + 1 < order {
            m[i][i + 1] -= 1.0;
        }
        rhs[i] = coeff(b, i + 1) - coeff(a, i + 1) * coeff(b, 0);
    }
    solve_linear(m, rhs)
}

/// Gaussian elimination with partial pivoting for the small dense
/// systems produced by `lfilter_zi`.
fn solve_linear(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>, DspError> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .ok_or(DspError::SingularSystem)?;
        if m[pivot][col].abs() < 1e-300 {
            return Err(DspError::SingularSystem);
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = rhs[row];
        for k in row + 1..n {
            acc -= m[row][k] * x[k];
        }
        x[row] = acc / m[row][row];
    }
    Ok(x)
}

/// Zero-phase filtering: forward and backward passes over an
/// odd-extended input, with steady-state initial conditions at each
/// end. Output length equals input length.
pub fn filtfilt(b: &[f64], a: &[f64], x: &[f64]) -> Result<Vec<f64>, DspError> {
    let ntaps = b.len().max(a.len());
    let padlen = 3 * ntaps;
    if x.len() <= padlen {
        return Err(DspError::InputTooShort {
            len: x.len(),
            min: padlen,
        });
    }

    let first = x[0];
    let last = x[x.len() - 1];

    // Odd extension at both ends reflects the signal through its
    // endpoint values, which keeps the filter transient off the data.
    let mut ext = Vec::with_capacity(x.len() + 2 * padlen);
    for i in 0..padlen {
        ext.push(2.0 * first - x[padlen - i]);
    }
    ext.extend_from_slice(x);
    for i in 0..padlen {
        ext.push(2.0 * last - x[x.len() - 2 - i]);
    }

    let zi = lfilter_zi(b, a)?;

    let mut state: Vec<f64> = zi.iter().map(|z| z * ext[0]).collect();
    let forward = lfilter(b, a, &ext, &mut state);

    let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
    let mut state: Vec<f64> = zi.iter().map(|z| z * reversed[0]).collect();
    let backward = lfilter(b, a, &reversed, &mut state);

    reversed.clear();
    reversed.extend(backward.into_iter().rev());
    Ok(reversed[padlen..padlen + x.len()].to_vec())
}
