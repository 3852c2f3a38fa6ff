//! Core analysis pipeline modules

pub mod analyzer;
pub mod dsp;
pub mod loader;
pub mod peaks;
pub mod preprocess;
pub mod spectral;
pub mod stats;

pub use analyzer::{EventAnalysis, EventAnalyzer, EventAnalyzerBuilder, VisualizationData};
pub use loader::{LoadError, SampleLoader, StrainSeries};
pub use peaks::{Peak, PeakDetector};
pub use preprocess::Preprocessor;
pub use spectral::{FftSpectrum, PsdEstimate, SpectralAnalyzer};
pub use stats::{StatisticsBundle, StatisticsEngine};
