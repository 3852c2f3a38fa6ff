//! StrainCheckr - analyze public gravitational-wave strain data
//!
//! A local analysis pipeline for GWOSC bulk strain files: load a
//! detector's 32-second strain record, validate it against the sample
//! rate its filename declares, condition it (mean removal, Hann
//! window, 10 Hz high-pass), and derive FFT magnitude spectra, Welch
//! power spectral densities, signal peaks, and summary statistics in
//! a JSON-serializable per-event bundle.
//!
//! ## Module Structure
//!
//! - `core` - the analysis pipeline (loader, preprocessor, spectral
//!   analyzer, peak detector, statistics engine, orchestrator) and
//!   its DSP primitives
//! - `catalog` - flat-file event store and strain-file discovery
//! - `config` - the settings context handed to every component
//! - `cli` - terminal output formatting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use straincheckr::core::EventAnalyzer;
//!
//! let analyzer = EventAnalyzer::builder()
//!     .data_dir("data")
//!     .build();
//!
//! let result = analyzer.analyze("GW230529_181500", None)
//!     .expect("event has local strain data");
//! let bundle = result.visualization();
//! println!("{}", serde_json::to_string(&bundle)?);
//! ```
//!
//! Per-detector failures (missing or unparseable files) are skipped
//! with a logged notice; `analyze` returns `None` only when an event
//! has no metadata or no local data at all.

// Flat-file event catalog
pub mod catalog;

// Command-line interface
pub mod cli;

// Settings context
pub mod config;

// Analysis pipeline
pub mod core;

// Re-export commonly used types at crate root for convenience
pub use catalog::{Catalog, DataFileInfo, EventInfo, EventRecord};
pub use config::Settings;
pub use crate::core::{
    EventAnalysis, EventAnalyzer, EventAnalyzerBuilder, FftSpectrum, LoadError, Peak,
    PeakDetector, Preprocessor, PsdEstimate, SampleLoader, SpectralAnalyzer, StatisticsBundle,
    StatisticsEngine, StrainSeries, VisualizationData,
};
