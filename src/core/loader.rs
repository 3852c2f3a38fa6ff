// src/core/loader.rs
//
// Strain file loading: path probing, sample-rate inference, sample
// parsing, and length normalization.
//
// GWOSC bulk files are whitespace-delimited text, one strain value
// per line, optionally gzip-compressed, with the detector and sample
// rate encoded in the filename (e.g. H-H1_GWOSC_16KHZ_R1-<gps>-32.txt).

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::dsp::resample::resample;
use crate::config::Settings;

/// Loading failures
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("strain file not found: {path} ({probed} candidate paths probed)")]
    FileNotFound { path: PathBuf, probed: usize },
    #[error("malformed sample data in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One detector's strain record, normalized to the expected length
#[derive(Debug, Clone)]
pub struct StrainSeries {
    pub samples: Vec<f64>,
    /// Sample rate in Hz (4096 or 16384 for this catalog)
    pub sample_rate: u32,
    /// Record length in seconds
    pub duration_secs: u32,
    /// Detector id parsed from the filename ("H1", "L1", ...)
    pub detector: String,
    /// The file the samples were actually read from
    pub source_path: PathBuf,
    /// Whether a length mismatch was corrected by resampling
    pub resampled: bool,
}

impl StrainSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Infer the sample rate from a GWOSC-style filename.
pub fn infer_sample_rate(file_name: &str) -> Option<u32> {
    let upper = file_name.to_uppercase();
    if upper.contains("16KHZ") {
        Some(16384)
    } else if upper.contains("4KHZ") {
        Some(4096)
    } else {
        None
    }
}

/// Infer the detector id from a GWOSC-style filename
/// (`H-H1_GWOSC_...` -> `H1`).
pub fn infer_detector(file_name: &str) -> Option<String> {
    let head = file_name.split('_').next()?;
    let id = head.split('-').nth(1)?;
    let valid = id.len() == 2
        && id.starts_with(|c: char| c.is_ascii_alphabetic())
        && id.ends_with(|c: char| c.is_ascii_digit());
    valid.then(|| id.to_string())
}

/// Loads strain files and normalizes them against the expected
/// sample count.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    settings: Settings,
}

impl SampleLoader {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Load the strain record at `path`, probing sibling suffixes if
    /// the file is missing, and resample it to the expected count if
    /// its length disagrees with the rate the filename declares.
    pub fn load(&self, path: &Path) -> Result<StrainSeries, LoadError> {
        let resolved = self.resolve_path(path)?;
        let file_name = resolved
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let sample_rate = match infer_sample_rate(&file_name) {
            Some(rate) => rate,
            None => {
                warn!(
                    "cannot determine sample rate from {file_name:?}, assuming {} Hz",
                    self.settings.default_sample_rate
                );
                self.settings.default_sample_rate
            }
        };

        let mut samples = read_samples(&resolved)?;
        if samples.is_empty() {
            return Err(LoadError::Malformed {
                path: resolved,
                reason: "file holds no samples".into(),
            });
        }

        let expected = self.settings.expected_samples(sample_rate);
        let mut resampled = false;
        if samples.len() != expected {
            warn!(
                "length mismatch in {}: expected {expected} samples, found {}; resampling",
                resolved.display(),
                samples.len()
            );
            samples = resample(&samples, expected);
            resampled = true;
        }

        debug!(
            "loaded {} samples at {sample_rate} Hz from {}",
            samples.len(),
            resolved.display()
        );

        Ok(StrainSeries {
            samples,
            sample_rate,
            duration_secs: self.settings.duration_secs,
            detector: infer_detector(&file_name).unwrap_or_default(),
            source_path: resolved,
            resampled,
        })
    }

    /// Resolve a possibly stale path: the crawler records compressed
    /// names while files may be stored decompressed (or vice versa),
    /// so a miss probes the base name with each known suffix.
    fn resolve_path(&self, path: &Path) -> Result<PathBuf, LoadError> {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }

        let raw = path.to_string_lossy();
        let base = raw
            .strip_suffix(".gz")
            .or_else(|| raw.strip_suffix("-z"))
            .unwrap_or(&raw);
        let candidates = [
            PathBuf::from(base),
            PathBuf::from(format!("{base}.gz")),
            PathBuf::from(format!("{base}.txt")),
            PathBuf::from(format!("{base}.txt.gz")),
        ];

        for candidate in &candidates {
            if candidate.is_file() {
                info!("resolved {} via {}", path.display(), candidate.display());
                return Ok(candidate.clone());
            }
        }
        Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
            probed: candidates.len(),
        })
    }
}

/// Parse whitespace-separated float samples, skipping blank lines and
/// `#` comment lines. Reads gzip-compressed files transparently.
fn read_samples(path: &Path) -> Result<Vec<f64>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let reader: Box<dyn BufRead> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut samples = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        for token in text.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| LoadError::Malformed {
                path: path.to_path_buf(),
                reason: format!("invalid value {token:?} on line {}", line_no + 1),
            })?;
            samples.push(value);
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_series(dir: &Path, name: &str, values: &[f64]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for v in values {
            writeln!(file, "{v:e}").unwrap();
        }
        path
    }

    fn loader(dir: &Path) -> SampleLoader {
        let mut settings = Settings::with_data_dir(dir);
        // Short records keep the fixtures small
        settings.duration_secs = 1;
        SampleLoader::new(settings)
    }

    #[test]
    fn test_infer_sample_rate() {
        assert_eq!(infer_sample_rate("H-H1_GWOSC_16KHZ_R1-1369419303-32.txt"), Some(16384));
        assert_eq!(infer_sample_rate("L-L1_GWOSC_4KHZ_R1-1369419303-32.txt"), Some(4096));
        assert_eq!(infer_sample_rate("l-l1_gwosc_4khz_r1-1369419303-32.txt"), Some(4096));
        assert_eq!(infer_sample_rate("strain.txt"), None);
    }

    #[test]
    fn test_infer_detector() {
        assert_eq!(
            infer_detector("H-H1_GWOSC_16KHZ_R1-1369419303-32.txt").as_deref(),
            Some("H1")
        );
        assert_eq!(
            infer_detector("V-V1_GWOSC_4KHZ_R1-1369419303-32.txt.gz").as_deref(),
            Some("V1")
        );
        assert_eq!(infer_detector("strain.txt"), None);
    }

    #[test]
    fn test_load_exact_count() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<f64> = (0..4096).map(|i| i as f64 * 1e-21).collect();
        let path = write_series(dir.path(), "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt", &values);

        let series = loader(dir.path()).load(&path).unwrap();
        assert_eq!(series.len(), 4096);
        assert_eq!(series.sample_rate, 4096);
        assert_eq!(series.detector, "L1");
        assert!(!series.resampled);
        assert!((series.samples[100] - 100e-21).abs() < 1e-30);
    }

    #[test]
    fn test_load_length_mismatch_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let values = vec![0.5; 4196];
        let path = write_series(dir.path(), "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt", &values);

        let series = loader(dir.path()).load(&path).unwrap();
        assert_eq!(series.len(), 4096);
        assert!(series.resampled);
    }

    #[test]
    fn test_probe_suffix_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let values = vec![1.0; 4096];
        write_series(dir.path(), "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt", &values);

        // The recorded path points at the compressed name
        let stale = dir.path().join("L-L1_GWOSC_4KHZ_R1-1369419303-32.txt.gz");
        let series = loader(dir.path()).load(&stale).unwrap();
        assert_eq!(series.len(), 4096);
        assert!(!series.resampled);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("H-H1_GWOSC_4KHZ_R1-0-32.txt");
        assert!(matches!(
            loader(dir.path()).load(&missing),
            Err(LoadError::FileNotFound { probed: 4, .. })
        ));
    }

    #[test]
    fn test_malformed_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("L-L1_GWOSC_4KHZ_R1-0-32.txt");
        std::fs::write(&path, "1.0\n2.0\nnot-a-number\n").unwrap();
        assert!(matches!(
            loader(dir.path()).load(&path),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_comment_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("L-L1_GWOSC_4KHZ_R1-0-32.txt");
        let mut body = String::from("# strain channel L1\n");
        for _ in 0..4096 {
            body.push_str("0.25\n");
        }
        std::fs::write(&path, body).unwrap();

        let series = loader(dir.path()).load(&path).unwrap();
        assert_eq!(series.len(), 4096);
        assert!(!series.resampled);
    }

    #[test]
    fn test_gzip_transparent_read() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("L-L1_GWOSC_4KHZ_R1-0-32.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        for _ in 0..4096 {
            writeln!(encoder, "3.5e-20").unwrap();
        }
        encoder.finish().unwrap();

        let series = loader(dir.path()).load(&path).unwrap();
        assert_eq!(series.len(), 4096);
        assert!((series.samples[0] - 3.5e-20).abs() < 1e-32);
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("L-L1_GWOSC_4KHZ_R1-0-32.txt");
        std::fs::write(&path, "# header only\n").unwrap();
        assert!(matches!(
            loader(dir.path()).load(&path),
            Err(LoadError::Malformed { .. })
        ));
    }
}
