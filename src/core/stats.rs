// src/core/stats.rs
//
// Summary statistics over a strain record: time-domain moments,
// dominant spectral content, and PSD-derived figures.

use serde::{Deserialize, Serialize};

use super::peaks::local_maxima;
use super::spectral::SpectralAnalyzer;
use crate::config::Settings;

/// Ratio defining the half-power (-3 dB) level.
const HALF_POWER: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Relative height floor for dominant-frequency peaks.
const SPECTRAL_PEAK_FLOOR: f64 = 0.05;

/// Number of dominant frequencies reported.
const MAIN_FREQUENCY_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeDomainStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
    pub rms: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FrequencyDomainStats {
    /// Up to five dominant frequencies, strongest first
    pub main_frequencies: Vec<f64>,
    pub main_magnitudes: Vec<f64>,
    /// Width of the band at or above half power, in Hz
    pub bandwidth: f64,
    pub total_power: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PsdStats {
    pub mean_power: f64,
    pub max_power: f64,
    pub power_bandwidth: f64,
    /// Peak-to-mean power ratio. Not a matched-filter SNR; it only
    /// ranks how strongly the spectrum is dominated by its peak.
    pub snr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsBundle {
    pub time_domain: TimeDomainStats,
    pub frequency_domain: FrequencyDomainStats,
    pub psd: PsdStats,
}

/// Computes the statistics bundle for a sample sequence.
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    spectral: SpectralAnalyzer,
}

impl StatisticsEngine {
    pub fn new(settings: Settings) -> Self {
        Self {
            spectral: SpectralAnalyzer::new(settings),
        }
    }

    /// `None` only for empty input; every returned value is finite.
    pub fn compute(&self, samples: &[f64], sample_rate: u32) -> Option<StatisticsBundle> {
        if samples.is_empty() {
            return None;
        }

        Some(StatisticsBundle {
            time_domain: time_domain_stats(samples),
            frequency_domain: self.frequency_domain_stats(samples, sample_rate),
            psd: self.psd_stats(samples, sample_rate),
        })
    }

    fn frequency_domain_stats(&self, samples: &[f64], sample_rate: u32) -> FrequencyDomainStats {
        let Some(spectrum) = self.spectral.fft_spectrum(samples, sample_rate) else {
            return FrequencyDomainStats::default();
        };
        if spectrum.magnitude.is_empty() {
            return FrequencyDomainStats::default();
        }

        let max_mag = spectrum.magnitude.iter().copied().fold(0.0_f64, f64::max);

        let mut peaks: Vec<usize> =
            local_maxima(&spectrum.magnitude, max_mag * SPECTRAL_PEAK_FLOOR);
        peaks.sort_by(|&a, &b| spectrum.magnitude[b].total_cmp(&spectrum.magnitude[a]));
        peaks.truncate(MAIN_FREQUENCY_COUNT);

        let half_power = max_mag * HALF_POWER;
        let above = spectrum
            .magnitude
            .iter()
            .filter(|&&m| m >= half_power)
            .count();

        FrequencyDomainStats {
            main_frequencies: peaks.iter().map(|&i| spectrum.frequencies[i]).collect(),
            main_magnitudes: peaks.iter().map(|&i| spectrum.magnitude[i]).collect(),
            bandwidth: above as f64 * spectrum.bin_width(),
            total_power: spectrum.magnitude.iter().map(|m| m * m).sum(),
        }
    }

    fn psd_stats(&self, samples: &[f64], sample_rate: u32) -> PsdStats {
        let Some(psd) = self.spectral.psd(samples, sample_rate) else {
            return PsdStats::default();
        };
        if psd.power.is_empty() {
            return PsdStats::default();
        }

        let max_power = psd.power.iter().copied().fold(0.0_f64, f64::max);
        let mean_power = psd.power.iter().sum::<f64>() / psd.power.len() as f64;

        let half_power = max_power * HALF_POWER;
        let above = psd.power.iter().filter(|&&p| p >= half_power).count();

        PsdStats {
            mean_power,
            max_power,
            power_bandwidth: above as f64 * psd.bin_width(),
            snr: if mean_power > 0.0 {
                max_power / mean_power
            } else {
                0.0
            },
        }
    }
}

/// Population moments; a constant record reports zero skewness and
/// zero excess kurtosis rather than a 0/0.
fn time_domain_stats(samples: &[f64]) -> TimeDomainStats {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &x in samples {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    } else {
        (0.0, 0.0)
    };

    TimeDomainStats {
        mean,
        std: m2.sqrt(),
        min,
        max,
        peak_to_peak: max - min,
        rms: (samples.iter().map(|x| x * x).sum::<f64>() / n).sqrt(),
        skewness,
        kurtosis,
    }
}
