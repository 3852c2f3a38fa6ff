// tests/event_store_test.rs
//
// Store-driven flows: compressed strain files, detector filtering
// semantics, and persisted result documents.

use std::io::Write;
use std::path::Path;

use straincheckr::catalog::{Catalog, EventRecord};
use straincheckr::config::Settings;
use straincheckr::core::EventAnalyzer;

const EVENT: &str = "GW230529_181500";

fn seed_catalog(data_dir: &Path) {
    let catalog = Catalog::new(Settings::with_data_dir(data_dir));
    catalog
        .insert_event(
            EVENT,
            EventRecord {
                common_name: Some(EVENT.to_string()),
                gps_time: Some(1_369_419_318.7),
                ..Default::default()
            },
        )
        .unwrap();
}

fn write_gzip_strain(data_dir: &Path, file_name: &str, values: &[f64]) {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let event_dir = data_dir.join(EVENT);
    std::fs::create_dir_all(&event_dir).unwrap();
    let file = std::fs::File::create(event_dir.join(file_name)).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::fast());
    for v in values {
        writeln!(encoder, "{v:e}").unwrap();
    }
    encoder.finish().unwrap();
}

fn sine(freq: f64, rate: u32, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / f64::from(rate)).sin() * 1e-21)
        .collect()
}

#[test]
fn compressed_strain_files_analyze_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    write_gzip_strain(
        dir.path(),
        "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt.gz",
        &sine(200.0, 4096, 131_072),
    );

    let analyzer = EventAnalyzer::builder().data_dir(dir.path()).build();
    let result = analyzer.analyze(EVENT, None).unwrap();

    let det = &result.detectors["L1"];
    assert_eq!(det.raw.len(), 131_072);
    let stats = det.statistics.as_ref().unwrap();
    assert!((stats.frequency_domain.main_frequencies[0] - 200.0).abs() < 1.0);
}

/// Filtering to a detector with no data yields an empty-but-valid
/// bundle: the event itself had data, so this is not a total failure.
#[test]
fn filter_to_absent_detector_yields_empty_bundle() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    write_gzip_strain(
        dir.path(),
        "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt.gz",
        &sine(200.0, 4096, 131_072),
    );

    let analyzer = EventAnalyzer::builder().data_dir(dir.path()).build();
    let filter = vec!["V1".to_string()];
    let result = analyzer.analyze(EVENT, Some(&filter)).unwrap();
    assert!(result.detectors.is_empty());
}

#[test]
fn saved_documents_parse_and_carry_run_metadata() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    write_gzip_strain(
        dir.path(),
        "L-L1_GWOSC_4KHZ_R1-1369419303-32.txt.gz",
        &sine(150.0, 4096, 131_072),
    );

    let analyzer = EventAnalyzer::builder().data_dir(dir.path()).build();
    let result = analyzer.analyze(EVENT, None).unwrap();
    let out_dir = analyzer.save_results(EVENT, &result, None).unwrap();
    assert_eq!(out_dir, dir.path().join(EVENT).join("analysis"));

    let document: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join("analysis_results.json")).unwrap(),
    )
    .unwrap();
    assert!(document["run_id"].is_string());
    assert!(document["analyzed_at"].is_string());
    assert!(document["detectors"]["L1"]["statistics"]["psd"]["snr"].is_number());
    assert!(document["event"]["common_name"].as_str() == Some(EVENT));

    let viz: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join("visualization_data.json")).unwrap(),
    )
    .unwrap();
    assert!(viz["detectors"]["L1"]["time_series"]["raw_data"].is_array());
    assert!(viz["detectors"]["L1"]["fft"]["frequencies"].is_array());
    assert!(viz["detectors"]["L1"]["psd"]["power"].is_array());
    assert_eq!(viz["metadata"]["event_name"].as_str(), Some(EVENT));
}

/// Detector availability reflects what is on disk, not what the
/// metadata promises.
#[test]
fn available_detectors_follow_disk_contents() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());

    let analyzer = EventAnalyzer::builder().data_dir(dir.path()).build();
    assert!(analyzer.catalog().available_detectors(EVENT).is_empty());
    assert!(analyzer.analyze(EVENT, None).is_none());

    write_gzip_strain(
        dir.path(),
        "H-H1_GWOSC_4KHZ_R1-1369419303-32.txt.gz",
        &sine(100.0, 4096, 131_072),
    );
    assert_eq!(
        analyzer.catalog().available_detectors(EVENT),
        vec!["H1".to_string()]
    );
}
