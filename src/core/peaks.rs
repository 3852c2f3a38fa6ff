// src/core/peaks.rs
//
// Local-maxima detection over the rectified signal, thresholded
// relative to the record's absolute maximum.

use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// A detected signal peak
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peak {
    /// Sample index into the record
    pub index: usize,
    /// Peak time in seconds from the record start
    pub time: f64,
    /// Signed sample value at the peak
    pub amplitude: f64,
    /// Detection height, `|x[index]|`
    pub prominence: f64,
}

/// Finds local maxima of `|x|` above a relative amplitude threshold.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    settings: Settings,
}

impl PeakDetector {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Detect peaks in ascending index order. Empty and all-zero
    /// input produce an empty list.
    pub fn detect(&self, samples: &[f64], sample_rate: u32) -> Vec<Peak> {
        detect_peaks(samples, sample_rate, self.settings.peak_threshold)
    }
}

/// Peaks of `|samples|` whose height is at least
/// `threshold * max(|samples|)`, plateau midpoints included.
pub fn detect_peaks(samples: &[f64], sample_rate: u32, threshold: f64) -> Vec<Peak> {
    let rectified: Vec<f64> = samples.iter().map(|x| x.abs()).collect();
    let max = rectified.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }

    local_maxima(&rectified, threshold * max)
        .into_iter()
        .map(|index| Peak {
            index,
            time: index as f64 / f64::from(sample_rate),
            amplitude: samples[index],
            prominence: rectified[index],
        })
        .collect()
}

/// Indices of local maxima of `values` with height at least
/// `min_height`, in ascending order. A plateau counts once, at its
/// midpoint; plateaus touching either edge are not maxima.
pub fn local_maxima(values: &[f64], min_height: f64) -> Vec<usize> {
    let n = values.len();
    if n < 3 {
        return Vec::new();
    }

    let mut maxima = Vec::new();
    let mut i = 1;
    while i < n - 1 {
        if values[i - 1] < values[i] {
            // Walk across a possible plateau
            let mut ahead = i + 1;
            while ahead < n - 1 && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                let index = (i + ahead - 1) / 2;
                if values[index] >= min_height {
                    maxima.push(index);
                }
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    maxima
}
