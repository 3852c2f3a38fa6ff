// src/core/analyzer.rs
//
// Per-event analysis driver with builder-style configuration.
//
// One `analyze` call resolves the event's metadata, loads each
// selected detector's strain file, and runs the full chain:
// preprocess, FFT, PSD, peak detection, statistics. A detector that
// fails to load is skipped; only missing metadata or a total lack of
// data files fails the call.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::loader::{LoadError, SampleLoader};
use super::peaks::{Peak, PeakDetector};
use super::preprocess::Preprocessor;
use super::spectral::{FftSpectrum, PsdEstimate, SpectralAnalyzer};
use super::stats::{StatisticsBundle, StatisticsEngine};
use crate::catalog::{Catalog, DataFileInfo, EventInfo};
use crate::config::Settings;
use crate::core::dsp::WindowType;

/// Everything derived from one detector's strain record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorAnalysis {
    pub raw: Vec<f64>,
    pub processed: Vec<f64>,
    pub time: Vec<f64>,
    pub sample_rate: u32,
    pub fft: Option<FftSpectrum>,
    pub psd: Option<PsdEstimate>,
    pub peaks: Vec<Peak>,
    pub statistics: Option<StatisticsBundle>,
    pub source_path: PathBuf,
    pub resampled: bool,
}

/// Aggregate analysis for one event, keyed by detector id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAnalysis {
    pub event: EventInfo,
    pub detectors: BTreeMap<String, DetectorAnalysis>,
}

/// The wire shape consumed by the plotting front ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationData {
    pub detectors: BTreeMap<String, DetectorView>,
    pub metadata: VisualizationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorView {
    pub time_series: TimeSeriesView,
    pub fft: FftSpectrum,
    pub psd: PsdEstimate,
    pub statistics: Option<StatisticsBundle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesView {
    pub time: Vec<f64>,
    pub raw_data: Vec<f64>,
    pub processed_data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationMetadata {
    pub event_name: Option<String>,
    pub gps_time: Option<f64>,
    pub detectors: Vec<String>,
}

impl EventAnalysis {
    /// Convert to the nested wire shape. Missing spectra become empty
    /// arrays so the front ends always see the same structure.
    pub fn visualization(&self) -> VisualizationData {
        let detectors = self
            .detectors
            .iter()
            .map(|(id, det)| {
                let view = DetectorView {
                    time_series: TimeSeriesView {
                        time: det.time.clone(),
                        raw_data: det.raw.clone(),
                        processed_data: det.processed.clone(),
                    },
                    fft: det.fft.clone().unwrap_or_else(|| FftSpectrum {
                        frequencies: Vec::new(),
                        magnitude: Vec::new(),
                    }),
                    psd: det.psd.clone().unwrap_or_else(|| PsdEstimate {
                        frequencies: Vec::new(),
                        power: Vec::new(),
                    }),
                    statistics: det.statistics.clone(),
                };
                (id.clone(), view)
            })
            .collect();

        VisualizationData {
            detectors,
            metadata: VisualizationMetadata {
                event_name: self
                    .event
                    .record
                    .common_name
                    .clone()
                    .or_else(|| self.event.record.event_id.clone()),
                gps_time: self.event.record.gps_time,
                detectors: self.detectors.keys().cloned().collect(),
            },
        }
    }
}

/// Persisted alongside the event's strain files after a saved run
#[derive(Debug, Serialize)]
struct AnalysisDocument<'a> {
    run_id: String,
    analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    analysis: &'a EventAnalysis,
}

/// Builder for a configured `EventAnalyzer`
pub struct EventAnalyzerBuilder {
    settings: Settings,
}

impl EventAnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.settings.data_dir = dir.into();
        self
    }

    pub fn peak_threshold(mut self, threshold: f64) -> Self {
        self.settings.peak_threshold = threshold;
        self
    }

    pub fn highpass_hz(mut self, cutoff: f64) -> Self {
        self.settings.highpass_hz = cutoff;
        self
    }

    pub fn default_sample_rate(mut self, rate: u32) -> Self {
        self.settings.default_sample_rate = rate;
        self
    }

    pub fn window(mut self, window: WindowType) -> Self {
        self.settings.window = window;
        self
    }

    pub fn build(self) -> EventAnalyzer {
        EventAnalyzer::new(self.settings)
    }
}

impl Default for EventAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the full analysis chain for one event at a time.
///
/// Holds only configuration; calls are independent, so one analyzer
/// may serve concurrent analyses of different events.
#[derive(Debug, Clone)]
pub struct EventAnalyzer {
    settings: Settings,
    catalog: Catalog,
    loader: SampleLoader,
    preprocessor: Preprocessor,
    spectral: SpectralAnalyzer,
    peaks: PeakDetector,
    stats: StatisticsEngine,
}

impl EventAnalyzer {
    pub fn new(settings: Settings) -> Self {
        Self {
            catalog: Catalog::new(settings.clone()),
            loader: SampleLoader::new(settings.clone()),
            preprocessor: Preprocessor::new(settings.clone()),
            spectral: SpectralAnalyzer::new(settings.clone()),
            peaks: PeakDetector::new(settings.clone()),
            stats: StatisticsEngine::new(settings.clone()),
            settings,
        }
    }

    pub fn builder() -> EventAnalyzerBuilder {
        EventAnalyzerBuilder::new()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Analyze one event, optionally restricted to a detector subset.
    ///
    /// Returns `None` when the event has no metadata or no data files
    /// at all. Per-detector failures are logged and skipped, so the
    /// returned bundle holds whatever subset succeeded.
    pub fn analyze(
        &self,
        event_name: &str,
        detector_filter: Option<&[String]>,
    ) -> Option<EventAnalysis> {
        let Some(info) = self.catalog.event_info(event_name) else {
            error!("no metadata for event {event_name}");
            return None;
        };

        let mut selected = info.detectors();
        if selected.is_empty() {
            error!("event {event_name} has no local data files");
            return None;
        }
        if let Some(filter) = detector_filter {
            selected.retain(|d| filter.iter().any(|f| f == d));
        }

        let mut detectors = BTreeMap::new();
        for detector in &selected {
            let Some(file) = info.data_file(detector) else {
                continue;
            };
            match self.analyze_detector(file) {
                Ok(analysis) => {
                    detectors.insert(detector.clone(), analysis);
                }
                Err(err) => {
                    error!("skipping detector {detector} for {event_name}: {err}");
                }
            }
        }

        info!(
            "event {event_name}: analyzed {}/{} selected detectors",
            detectors.len(),
            selected.len()
        );
        Some(EventAnalysis {
            event: info,
            detectors,
        })
    }

    fn analyze_detector(&self, file: &DataFileInfo) -> Result<DetectorAnalysis, LoadError> {
        let series = self.loader.load(&file.file_path)?;
        let rate = series.sample_rate;

        let processed = self.preprocessor.preprocess(&series.samples, rate);
        let fft = self.spectral.fft_spectrum(&processed, rate);
        let psd = self.spectral.psd(&processed, rate);
        let peaks = self.peaks.detect(&processed, rate);
        let statistics = self.stats.compute(&processed, rate);

        let step = 1.0 / f64::from(rate);
        let time = (0..processed.len()).map(|i| i as f64 * step).collect();

        let mut analysis = DetectorAnalysis {
            raw: series.samples,
            processed,
            time,
            sample_rate: rate,
            fft,
            psd,
            peaks,
            statistics,
            source_path: series.source_path,
            resampled: series.resampled,
        };

        let dropped = analysis.scrub();
        if dropped > 0 {
            warn!(
                "replaced {dropped} non-finite values in {} before serialization",
                analysis.source_path.display()
            );
        }
        Ok(analysis)
    }

    /// Persist the full bundle and its visualization view next to the
    /// event's strain files (or under `output_dir` when given).
    /// Returns the directory written to.
    pub fn save_results(
        &self,
        event_name: &str,
        analysis: &EventAnalysis,
        output_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.event_dir(event_name).join("analysis"));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let document = AnalysisDocument {
            run_id: Uuid::new_v4().to_string(),
            analyzed_at: Utc::now(),
            analysis,
        };
        let results_path = dir.join("analysis_results.json");
        std::fs::write(&results_path, serde_json::to_string_pretty(&document)?)
            .with_context(|| format!("failed to write {}", results_path.display()))?;

        let viz_path = dir.join("visualization_data.json");
        std::fs::write(
            &viz_path,
            serde_json::to_string_pretty(&analysis.visualization())?,
        )
        .with_context(|| format!("failed to write {}", viz_path.display()))?;

        info!("analysis results saved under {}", dir.display());
        Ok(dir)
    }
}

impl DetectorAnalysis {
    /// Replace every non-finite value with 0.0 so the bundle is
    /// JSON-clean. Returns how many values were replaced.
    fn scrub(&mut self) -> usize {
        let mut dropped = 0usize;

        scrub_slice(&mut self.raw, &mut dropped);
        scrub_slice(&mut self.processed, &mut dropped);
        scrub_slice(&mut self.time, &mut dropped);

        if let Some(fft) = &mut self.fft {
            scrub_slice(&mut fft.frequencies, &mut dropped);
            scrub_slice(&mut fft.magnitude, &mut dropped);
        }
        if let Some(psd) = &mut self.psd {
            scrub_slice(&mut psd.frequencies, &mut dropped);
            scrub_slice(&mut psd.power, &mut dropped);
        }
        for peak in &mut self.peaks {
            scrub_value(&mut peak.time, &mut dropped);
            scrub_value(&mut peak.amplitude, &mut dropped);
            scrub_value(&mut peak.prominence, &mut dropped);
        }
        if let Some(stats) = &mut self.statistics {
            let time = &mut stats.time_domain;
            let freq = &mut stats.frequency_domain;
            let psd = &mut stats.psd;
            for value in [
                &mut time.mean,
                &mut time.std,
                &mut time.min,
                &mut time.max,
                &mut time.peak_to_peak,
                &mut time.rms,
                &mut time.skewness,
                &mut time.kurtosis,
                &mut freq.bandwidth,
                &mut freq.total_power,
                &mut psd.mean_power,
                &mut psd.max_power,
                &mut psd.power_bandwidth,
                &mut psd.snr,
            ] {
                scrub_value(value, &mut dropped);
            }
            scrub_slice(&mut freq.main_frequencies, &mut dropped);
            scrub_slice(&mut freq.main_magnitudes, &mut dropped);
        }

        dropped
    }
}

fn scrub_value(value: &mut f64, dropped: &mut usize) {
    if !value.is_finite() {
        *value = 0.0;
        *dropped += 1;
    }
}

fn scrub_slice(values: &mut [f64], dropped: &mut usize) {
    for value in values {
        scrub_value(value, dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EventRecord;
    use std::f64::consts::PI;
    use std::io::Write;

    fn seed_event(data_dir: &Path, event: &str, files: &[(&str, Vec<f64>)]) {
        let settings = Settings::with_data_dir(data_dir);
        let catalog = Catalog::new(settings);
        catalog
            .insert_event(
                event,
                EventRecord {
                    common_name: Some(event.to_string()),
                    gps_time: Some(1_369_419_318.7),
                    ..Default::default()
                },
            )
            .unwrap();

        let event_dir = data_dir.join(event);
        std::fs::create_dir_all(&event_dir).unwrap();
        for (name, values) in files {
            let mut file = std::fs::File::create(event_dir.join(name)).unwrap();
            for v in values {
                writeln!(file, "{v:e}").unwrap();
            }
        }
    }

    fn analyzer(data_dir: &Path) -> EventAnalyzer {
        let mut settings = Settings::with_data_dir(data_dir);
        settings.duration_secs = 1; // keep fixtures small
        EventAnalyzer::new(settings)
    }

    fn sine_file(freq: f64, rate: u32) -> Vec<f64> {
        (0..rate as usize)
            .map(|i| (2.0 * PI * freq * i as f64 / f64::from(rate)).sin())
            .collect()
    }

    #[test]
    fn test_unknown_event_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        seed_event(dir.path(), "GW230529_181500", &[]);
        assert!(analyzer(dir.path()).analyze("GW150914", None).is_none());
    }

    #[test]
    fn test_event_without_data_files_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        seed_event(dir.path(), "GW230529_181500", &[]);
        assert!(analyzer(dir.path())
            .analyze("GW230529_181500", None)
            .is_none());
    }

    #[test]
    fn test_full_chain_over_one_detector() {
        let dir = tempfile::tempdir().unwrap();
        seed_event(
            dir.path(),
            "GW230529_181500",
            &[(
                "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt",
                sine_file(300.0, 4096),
            )],
        );

        let result = analyzer(dir.path())
            .analyze("GW230529_181500", None)
            .unwrap();
        assert_eq!(result.detectors.len(), 1);

        let det = &result.detectors["L1"];
        assert_eq!(det.raw.len(), 4096);
        assert_eq!(det.processed.len(), 4096);
        assert_eq!(det.time.len(), 4096);
        assert!((det.time[4095] - 4095.0 / 4096.0).abs() < 1e-12);
        assert!(det.fft.is_some());
        assert!(det.psd.is_some());
        assert!(det.statistics.is_some());
        assert!(!det.resampled);

        let stats = det.statistics.as_ref().unwrap();
        assert!((stats.frequency_domain.main_frequencies[0] - 300.0).abs() < 2.0);
    }

    #[test]
    fn test_detector_filter() {
        let dir = tempfile::tempdir().unwrap();
        seed_event(
            dir.path(),
            "GW230529_181500",
            &[
                (
                    "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt",
                    sine_file(300.0, 4096),
                ),
                (
                    "H-H1_GWOSC_4KHZ_R1-1369419303-32.txt",
                    sine_file(250.0, 4096),
                ),
            ],
        );

        let filter = vec!["H1".to_string()];
        let result = analyzer(dir.path())
            .analyze("GW230529_181500", Some(&filter))
            .unwrap();
        assert_eq!(result.detectors.len(), 1);
        assert!(result.detectors.contains_key("H1"));
    }

    #[test]
    fn test_bad_detector_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        seed_event(
            dir.path(),
            "GW230529_181500",
            &[
                (
                    "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt",
                    sine_file(300.0, 4096),
                ),
                ("H-H1_GWOSC_4KHZ_R1-1369419303-32.txt", Vec::new()),
            ],
        );

        let result = analyzer(dir.path())
            .analyze("GW230529_181500", None)
            .unwrap();
        assert_eq!(result.detectors.len(), 1);
        assert!(result.detectors.contains_key("L1"));
        assert!(!result.detectors.contains_key("H1"));
    }

    #[test]
    fn test_scrub_counts_and_replaces() {
        let mut analysis = DetectorAnalysis {
            raw: vec![1.0, f64::NAN, 3.0],
            processed: vec![f64::INFINITY, 2.0],
            time: vec![0.0, 0.1],
            sample_rate: 4096,
            fft: None,
            psd: None,
            peaks: Vec::new(),
            statistics: None,
            source_path: PathBuf::from("test"),
            resampled: false,
        };
        assert_eq!(analysis.scrub(), 2);
        assert_eq!(analysis.raw[1], 0.0);
        assert_eq!(analysis.processed[0], 0.0);
    }

    #[test]
    fn test_save_results_writes_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        seed_event(
            dir.path(),
            "GW230529_181500",
            &[(
                "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt",
                sine_file(300.0, 4096),
            )],
        );

        let analyzer = analyzer(dir.path());
        let result = analyzer.analyze("GW230529_181500", None).unwrap();
        let out = analyzer
            .save_results("GW230529_181500", &result, None)
            .unwrap();

        assert!(out.join("analysis_results.json").is_file());
        let viz_text = std::fs::read_to_string(out.join("visualization_data.json")).unwrap();
        let viz: VisualizationData = serde_json::from_str(&viz_text).unwrap();
        assert_eq!(viz.metadata.detectors, vec!["L1".to_string()]);
        assert_eq!(viz.metadata.event_name.as_deref(), Some("GW230529_181500"));
    }
}
