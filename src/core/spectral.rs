// src/core/spectral.rs
//
// Frequency-domain views of a strain record: a normalized one-sided
// magnitude spectrum and a Welch power spectral density estimate.

use serde::{Deserialize, Serialize};

use super::dsp::{fft, windows};
use crate::config::Settings;

/// One-sided FFT magnitude spectrum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FftSpectrum {
    pub frequencies: Vec<f64>,
    pub magnitude: Vec<f64>,
}

impl FftSpectrum {
    /// Width of one frequency bin in Hz.
    pub fn bin_width(&self) -> f64 {
        if self.frequencies.len() < 2 {
            return 0.0;
        }
        self.frequencies[1] - self.frequencies[0]
    }
}

/// Welch power spectral density estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsdEstimate {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
}

impl PsdEstimate {
    pub fn bin_width(&self) -> f64 {
        if self.frequencies.len() < 2 {
            return 0.0;
        }
        self.frequencies[1] - self.frequencies[0]
    }
}

/// Computes FFT and PSD views of a sample sequence.
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    settings: Settings,
}

impl SpectralAnalyzer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// One-sided magnitude spectrum, normalized by the sample count.
    ///
    /// The analysis window is applied here unconditionally, so input
    /// that was already windowed upstream is windowed twice. Returns
    /// `None` for empty input.
    pub fn fft_spectrum(&self, samples: &[f64], sample_rate: u32) -> Option<FftSpectrum> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len();
        let window = windows::create_window(n, self.settings.window);
        let windowed: Vec<f64> = samples.iter().zip(&window).map(|(x, w)| x * w).collect();

        let spectrum = fft::forward(&windowed);
        let bins = n / 2;
        let magnitude: Vec<f64> = spectrum[..bins].iter().map(|c| c.norm() / n as f64).collect();
        let frequencies = fft::bin_frequencies(n, f64::from(sample_rate), bins);

        Some(FftSpectrum {
            frequencies,
            magnitude,
        })
    }

    /// Welch PSD with 50% segment overlap and density scaling.
    ///
    /// Segment length is `welch_max_segment` capped at half the input
    /// so the average always spans at least two segments. Each segment
    /// is mean-removed before windowing. Returns `None` when the input
    /// is empty or too short to form a segment.
    pub fn psd(&self, samples: &[f64], sample_rate: u32) -> Option<PsdEstimate> {
        let nperseg = self.settings.welch_max_segment.min(samples.len() / 2);
        if nperseg < 2 {
            return None;
        }

        let fs = f64::from(sample_rate);
        let window = windows::create_window(nperseg, self.settings.window);
        let win_power = windows::window_power(&window);
        let hop = nperseg - nperseg / 2;

        let bins = nperseg / 2 + 1;
        let mut accum = vec![0.0; bins];
        let mut segments = 0usize;
        let mut buffer = vec![0.0; nperseg];

        let mut start = 0;
        while start + nperseg <= samples.len() {
            let segment = &samples[start..start + nperseg];
            let mean = segment.iter().sum::<f64>() / nperseg as f64;
            for (slot, (x, w)) in buffer.iter_mut().zip(segment.iter().zip(&window)) {
                *slot = (x - mean) * w;
            }

            let spectrum = fft::forward(&buffer);
            for (k, (acc, bin)) in accum.iter_mut().zip(&spectrum).enumerate() {
                let mut p = bin.norm_sqr() / (fs * win_power);
                // One-sided estimate: double everything except DC and
                // the Nyquist bin.
                if k != 0 && !(nperseg % 2 == 0 && k == nperseg / 2) {
                    p *= 2.0;
                }
                *acc += p;
            }

            segments += 1;
            start += hop;
        }

        if segments == 0 {
            return None;
        }
        let inv = 1.0 / segments as f64;
        for v in &mut accum {
            *v *= inv;
        }

        Some(PsdEstimate {
            frequencies: fft::bin_frequencies(nperseg, fs, bins),
            power: accum,
        })
    }
}
