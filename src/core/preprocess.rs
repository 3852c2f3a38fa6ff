// src/core/preprocess.rs
//
// Conditioning ahead of spectral analysis: mean removal, windowing,
// and a zero-phase high-pass to strip the low-frequency seismic wall.

use log::warn;

use super::dsp::{filters, windows};
use crate::config::Settings;

/// Detrends, windows, and high-pass filters a strain record.
///
/// Preprocessing never fails: if the filter cannot be designed or
/// applied, the input samples are returned unmodified and the problem
/// is logged.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    settings: Settings,
}

impl Preprocessor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn preprocess(&self, samples: &[f64], sample_rate: u32) -> Vec<f64> {
        if samples.is_empty() {
            return Vec::new();
        }

        match self.run(samples, sample_rate) {
            Ok(processed) => processed,
            Err(err) => {
                warn!("preprocessing failed ({err}); passing data through unmodified");
                samples.to_vec()
            }
        }
    }

    fn run(&self, samples: &[f64], sample_rate: u32) -> Result<Vec<f64>, filters::DspError> {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let window = windows::create_window(samples.len(), self.settings.window);
        let windowed: Vec<f64> = samples
            .iter()
            .zip(&window)
            .map(|(x, w)| (x - mean) * w)
            .collect();

        let nyquist = f64::from(sample_rate) / 2.0;
        let (b, a) =
            filters::butter_highpass(self.settings.filter_order, self.settings.highpass_hz / nyquist)?;
        filters::filtfilt(&b, &a, &windowed)
    }
}
