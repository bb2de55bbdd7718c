// src/index/snapshot.rs
use crate::edinet::models::Filing;
use crate::utils::error::SnapshotError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SNAPSHOT_VERSION: u32 = 1;

/// The per-year precomputed index: security code -> deduplicated filings.
/// Written once by the builder, immutable thereafter.
#[derive(Debug, Serialize, Deserialize)]
pub struct YearSnapshot {
    pub version: u32,
    pub year: u16,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    #[serde(rename = "bySecCode")]
    pub by_sec_code: BTreeMap<String, Vec<Filing>>,
}

/// Probe for the version tag alone, so an unreadable future schema is
/// reported as a version mismatch rather than a field error.
#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u32,
}

impl YearSnapshot {
    pub fn new(year: u16, by_sec_code: BTreeMap<String, Vec<Filing>>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            year,
            generated_at: chrono::Utc::now().to_rfc3339(),
            by_sec_code,
        }
    }

    /// Parses a snapshot from JSON. Any `version` other than the supported
    /// one makes the file unreadable; the schema is never guessed.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let probe: VersionProbe = serde_json::from_str(json)?;
        if probe.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(probe.version));
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Filings recorded under one security code, in build order.
    pub fn filings_for_code(&self, code: &str) -> &[Filing] {
        self.by_sec_code.get(code).map(Vec::as_slice).unwrap_or(&[])
    }
}
