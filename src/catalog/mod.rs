//! Flat-file event catalog
//!
//! `events.json` under the data directory maps event names to their
//! metadata records. Strain files live in one subdirectory per event,
//! named by the GWOSC convention
//! (`H-H1_GWOSC_16KHZ_R1-<gps>-32.txt[.gz]`); the store discovers
//! them by scanning the event directory instead of trusting paths
//! recorded at download time.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::core::loader::{infer_detector, infer_sample_rate};

/// Catalog metadata for one event. Unknown fields written by the
/// crawler (parameter bounds, units, ...) are carried through `extra`
/// so a read-modify-write cycle loses nothing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EventRecord {
    pub event_id: Option<String>,
    pub common_name: Option<String>,
    pub version: Option<i64>,
    pub catalog: Option<String>,
    pub gps_time: Option<f64>,
    pub gracedb_id: Option<String>,
    pub reference: Option<String>,
    pub json_url: Option<String>,
    pub mass_1_source: Option<f64>,
    pub mass_2_source: Option<f64>,
    pub total_mass_source: Option<f64>,
    pub chirp_mass_source: Option<f64>,
    pub network_matched_filter_snr: Option<f64>,
    pub luminosity_distance: Option<f64>,
    pub chi_eff: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One locally available strain file for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFileInfo {
    pub detector: String,
    pub file_path: PathBuf,
    pub sampling_rate: u32,
    pub duration: u32,
}

/// An event record joined with its locally available strain files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    #[serde(flatten)]
    pub record: EventRecord,
    pub data_files: Vec<DataFileInfo>,
}

impl EventInfo {
    pub fn display_name(&self) -> &str {
        self.record
            .common_name
            .as_deref()
            .or(self.record.event_id.as_deref())
            .unwrap_or("")
    }

    /// Detector ids with at least one data file, first-seen order.
    pub fn detectors(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for file in &self.data_files {
            if !seen.contains(&file.detector) {
                seen.push(file.detector.clone());
            }
        }
        seen
    }

    /// The preferred data file for a detector (files are kept sorted
    /// with the higher sample rate first).
    pub fn data_file(&self, detector: &str) -> Option<&DataFileInfo> {
        self.data_files.iter().find(|f| f.detector == detector)
    }
}

/// Read/write access to the flat-file event store.
#[derive(Debug, Clone)]
pub struct Catalog {
    settings: Settings,
}

impl Catalog {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// All stored event records. A missing or unreadable store reads
    /// as empty.
    pub fn load_events(&self) -> BTreeMap<String, EventRecord> {
        let path = self.settings.events_file();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&text) {
            Ok(events) => events,
            Err(err) => {
                warn!("event store {} is not readable: {err}", path.display());
                BTreeMap::new()
            }
        }
    }

    pub fn save_events(&self, events: &BTreeMap<String, EventRecord>) -> anyhow::Result<()> {
        let path = self.settings.events_file();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(events)?;
        std::fs::write(&path, text)?;
        Ok(())
    }

    /// Insert or replace one event record.
    pub fn insert_event(&self, name: &str, record: EventRecord) -> anyhow::Result<()> {
        let mut events = self.load_events();
        events.insert(name.to_string(), record);
        self.save_events(&events)
    }

    pub fn list_events(&self) -> Vec<String> {
        self.load_events().into_keys().collect()
    }

    /// Metadata plus discovered strain files for one event, or `None`
    /// if the event is not in the store.
    pub fn event_info(&self, event_name: &str) -> Option<EventInfo> {
        let record = self.load_events().remove(event_name)?;
        Some(EventInfo {
            record,
            data_files: self.discover_data_files(event_name),
        })
    }

    /// Detector ids with locally available data for one event.
    pub fn available_detectors(&self, event_name: &str) -> Vec<String> {
        self.event_info(event_name)
            .map(|info| info.detectors())
            .unwrap_or_default()
    }

    /// Scan `<data_dir>/<event>/` for strain files. Higher sample
    /// rates sort first within a detector so they are preferred.
    fn discover_data_files(&self, event_name: &str) -> Vec<DataFileInfo> {
        let event_dir = self.settings.event_dir(event_name);
        let mut files = Vec::new();

        for entry in WalkDir::new(&event_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.contains("_GWOSC_") || !(name.ends_with(".txt") || name.ends_with(".txt.gz"))
            {
                continue;
            }

            let (Some(detector), Some(rate)) = (infer_detector(&name), infer_sample_rate(&name))
            else {
                warn!("skipping unrecognized strain file {name:?}");
                continue;
            };

            files.push(DataFileInfo {
                detector,
                file_path: entry.path().to_path_buf(),
                sampling_rate: rate,
                duration: self.settings.duration_secs,
            });
        }

        files.sort_by(|a, b| {
            a.detector
                .cmp(&b.detector)
                .then(b.sampling_rate.cmp(&a.sampling_rate))
        });
        files
    }
}
