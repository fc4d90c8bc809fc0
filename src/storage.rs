//! Point record sources for point layers.
//!
//! A point layer loads its records once, at construction, and never again.
//! This module abstracts where those records come from so layers can be fed
//! from memory in tests and from an exported JSON file in production.

use crate::error::{GeocodeError, Result};
use geocode_types::point::PointRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Trait for point record sources
pub trait PointSource: Send + Sync {
    /// Fetch every point record. Called once per layer construction.
    fn fetch_points(&self) -> Result<Vec<PointRecord>>;
}

/// Records held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPointSource {
    records: Vec<PointRecord>,
}

impl MemoryPointSource {
    pub fn new(records: Vec<PointRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PointSource for MemoryPointSource {
    fn fetch_points(&self) -> Result<Vec<PointRecord>> {
        Ok(self.records.clone())
    }
}

impl From<Vec<PointRecord>> for MemoryPointSource {
    fn from(records: Vec<PointRecord>) -> Self {
        Self::new(records)
    }
}

/// Records read from a JSON array file.
///
/// Each element carries `id`, `title`, `source`, `latitude`, `longitude` and
/// an optional `isoCountryCode2Digit`.
#[derive(Debug, Clone)]
pub struct JsonPointSource {
    path: PathBuf,
}

impl JsonPointSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse records from any reader holding a JSON array.
    pub fn read_from<R: Read>(reader: R) -> Result<Vec<PointRecord>> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl PointSource for JsonPointSource {
    fn fetch_points(&self) -> Result<Vec<PointRecord>> {
        let file = File::open(&self.path).map_err(|e| {
            GeocodeError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", self.path.display(), e),
            ))
        })?;
        let records = Self::read_from(BufReader::new(file))?;
        log::info!(
            "Loaded {} point records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_memory_source() {
        let source = MemoryPointSource::from(vec![PointRecord::new(
            "DK", "Denmark", "test", Some("DK"), 56.0, 10.0,
        )]);
        assert_eq!(source.len(), 1);
        assert_eq!(source.fetch_points().unwrap()[0].id, "DK");
    }

    #[test]
    fn test_json_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "DK", "title": "Denmark", "source": "centroids",
                  "isoCountryCode2Digit": "DK", "latitude": 56.0, "longitude": 10.0}},
                {{"id": "AQ", "title": "Antarctica", "source": "centroids",
                  "latitude": -90.0, "longitude": 0.0}}
            ]"#
        )
        .unwrap();

        let records = JsonPointSource::new(file.path()).fetch_points().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iso_country_code.as_deref(), Some("DK"));
        assert_eq!(records[1].iso_country_code, None);
        assert!(records[1].is_polar());
    }

    #[test]
    fn test_json_source_missing_file() {
        let source = JsonPointSource::new("/definitely/not/here.json");
        assert!(matches!(source.fetch_points(), Err(GeocodeError::Io(_))));
    }

    #[test]
    fn test_json_source_malformed() {
        let result = JsonPointSource::read_from(&b"{\"id\": 1}"[..]);
        assert!(matches!(result, Err(GeocodeError::Serialization(_))));
    }
}
