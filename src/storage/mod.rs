// src/storage/mod.rs
use crate::index::resolver::SnapshotSource;
use crate::index::snapshot::YearSnapshot;
use crate::utils::error::SnapshotError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Owns the snapshot directory: one `yuho_index_<year>.json` file per year.
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a new SnapshotStore with the specified base directory.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, SnapshotError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn path_for_year(&self, year: u16) -> PathBuf {
        self.base_dir.join(format!("yuho_index_{}.json", year))
    }

    pub fn exists(&self, year: u16) -> bool {
        self.path_for_year(year).exists()
    }

    /// Writes a year's snapshot. An existing file is an error unless `force`
    /// is set; snapshots are only ever fully regenerated, never patched.
    pub fn write(&self, snapshot: &YearSnapshot, force: bool) -> Result<PathBuf, SnapshotError> {
        let file_path = self.path_for_year(snapshot.year);
        if file_path.exists() && !force {
            return Err(SnapshotError::FileExists(file_path));
        }

        fs::write(&file_path, snapshot.to_json()?)?;
        tracing::info!("Saved snapshot for {} to {}", snapshot.year, file_path.display());

        Ok(file_path)
    }

    /// Scans the directory for snapshot files and returns the resolver's
    /// year -> source mapping.
    pub fn source_map(&self) -> Result<HashMap<u16, SnapshotSource>, SnapshotError> {
        let mut sources = HashMap::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(year) = name
                .strip_prefix("yuho_index_")
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|y| y.parse::<u16>().ok())
            else {
                continue;
            };
            sources.insert(year, SnapshotSource::File(path));
        }

        Ok(sources)
    }
}
