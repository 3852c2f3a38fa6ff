//! Terminal formatting for analysis results

use colorful::Colorful;

use crate::core::analyzer::{DetectorAnalysis, EventAnalysis};

/// Format an analysis bundle for terminal output.
pub fn format_summary(analysis: &EventAnalysis, verbose: bool) -> String {
    let mut output = String::new();

    let name = analysis.event.display_name().to_string();
    output.push_str(&format!("{}\n", name.cyan()));
    if let Some(gps) = analysis.event.record.gps_time {
        output.push_str(&format!("  GPS time: {gps:.1}\n"));
    }

    if analysis.detectors.is_empty() {
        output.push_str(&format!("  {}\n", "no usable detector data".red()));
        return output;
    }

    for (id, det) in &analysis.detectors {
        output.push_str(&format_detector(id, det, verbose));
    }
    output
}

fn format_detector(id: &str, det: &DetectorAnalysis, verbose: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "  {} {} Hz, {} samples{}\n",
        id.to_string().green(),
        det.sample_rate,
        det.raw.len(),
        if det.resampled {
            format!(" {}", "(resampled)".yellow())
        } else {
            String::new()
        }
    ));
    output.push_str(&format!("    Peaks: {}\n", det.peaks.len()));

    if let Some(stats) = &det.statistics {
        if let Some(freq) = stats.frequency_domain.main_frequencies.first() {
            output.push_str(&format!("    Dominant frequency: {freq:.1} Hz\n"));
        }
        output.push_str(&format!(
            "    Bandwidth: {:.1} Hz | PSD peak/mean: {:.1}\n",
            stats.frequency_domain.bandwidth, stats.psd.snr
        ));

        if verbose {
            let time = &stats.time_domain;
            output.push_str(&format!(
                "    RMS: {:.3e} | p-p: {:.3e} | skew: {:.3} | kurtosis: {:.3}\n",
                time.rms, time.peak_to_peak, time.skewness, time.kurtosis
            ));
            output.push_str(&format!("    Source: {}\n", det.source_path.display()));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EventInfo, EventRecord};
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_bundle_reports_no_data() {
        let analysis = EventAnalysis {
            event: EventInfo {
                record: EventRecord {
                    common_name: Some("GW230529_181500".into()),
                    ..Default::default()
                },
                data_files: Vec::new(),
            },
            detectors: BTreeMap::new(),
        };
        let text = format_summary(&analysis, false);
        assert!(text.contains("GW230529_181500"));
        assert!(text.contains("no usable detector data"));
    }
}
