//! Runtime configuration for the analysis pipeline
//!
//! A `Settings` value is built once and handed to each component at
//! construction; components keep no other state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::dsp::WindowType;

/// GWOSC strain records in this catalog are fixed 32-second windows.
pub const RECORD_DURATION_SECS: u32 = 32;

/// Pipeline-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root directory holding one subdirectory per event
    pub data_dir: PathBuf,
    /// Fallback sample rate when the filename does not declare one
    pub default_sample_rate: u32,
    /// Record length in seconds
    pub duration_secs: u32,
    /// High-pass cutoff in Hz
    pub highpass_hz: f64,
    /// High-pass Butterworth order
    pub filter_order: usize,
    /// Peak height threshold relative to the absolute maximum
    pub peak_threshold: f64,
    /// Upper bound on the Welch segment length
    pub welch_max_segment: usize,
    /// Analysis window function
    pub window: WindowType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_sample_rate: 16384,
            duration_secs: RECORD_DURATION_SECS,
            highpass_hz: 10.0,
            filter_order: 4,
            peak_threshold: 0.1,
            welch_max_segment: 8192,
            window: WindowType::Hann,
        }
    }
}

impl Settings {
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load settings from a JSON file, filling unspecified fields
    /// with defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    /// Sample count a full record is expected to hold at `rate`.
    pub fn expected_samples(&self, rate: u32) -> usize {
        rate as usize * self.duration_secs as usize
    }

    /// Directory holding one event's strain files.
    pub fn event_dir(&self, event_name: &str) -> PathBuf {
        self.data_dir.join(event_name)
    }

    /// Path of the flat-file event catalog.
    pub fn events_file(&self) -> PathBuf {
        self.data_dir.join("events.json")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("straincheckr").join("data"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_samples() {
        let settings = Settings::default();
        assert_eq!(settings.expected_samples(16384), 524288);
        assert_eq!(settings.expected_samples(4096), 131072);
    }

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let parsed: Settings = serde_json::from_str(r#"{"highpass_hz": 20.0}"#).unwrap();
        assert_eq!(parsed.highpass_hz, 20.0);
        assert_eq!(parsed.default_sample_rate, 16384);
        assert_eq!(parsed.duration_secs, 32);
    }
}
