//! JSON file history backend
//!
//! The whole history lives in one array under `userFlights.json`.

use async_trait::async_trait;
use intake_core::{FlightHistory, StoreError, StoredFlightRecord};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// File name inside the data directory
pub const HISTORY_FILE_NAME: &str = "userFlights.json";

/// History kept as a single JSON array of records
///
/// A missing file reads as an empty history. Writes go to a sibling temp
/// file first and are renamed into place.
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileHistory {
    /// Store at an explicit file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at `<dir>/userFlights.json`
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(HISTORY_FILE_NAME))
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> Result<Vec<StoredFlightRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_records(&self, records: &[StoredFlightRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl FlightHistory for JsonFileHistory {
    async fn append(&self, record: StoredFlightRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        tracing::debug!(
            "Appending flight {} to {} ({} existing)",
            record.id,
            self.path.display(),
            records.len()
        );
        records.push(record);
        self.write_records(&records).await
    }

    async fn all(&self) -> Result<Vec<StoredFlightRecord>, StoreError> {
        self.read_records().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistory::in_dir(dir.path());

        assert!(store.all().await.unwrap().is_empty());
        assert!(store.path().ends_with(HISTORY_FILE_NAME));
    }

    #[tokio::test]
    async fn blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistory::in_dir(dir.path());
        std::fs::write(store.path(), "  \n").unwrap();

        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistory::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.all().await, Err(StoreError::Corrupt(_))));
    }
}
