//! In-memory history backend

use async_trait::async_trait;
use intake_core::{FlightHistory, StoreError, StoredFlightRecord};
use parking_lot::Mutex;

/// Process-local history
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: Mutex<Vec<StoredFlightRecord>>,
}

impl InMemoryHistory {
    /// Empty history
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History pre-seeded with records
    #[must_use]
    pub fn with_records(records: Vec<StoredFlightRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copy of the stored records
    #[must_use]
    pub fn snapshot(&self) -> Vec<StoredFlightRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl FlightHistory for InMemoryHistory {
    async fn append(&self, record: StoredFlightRecord) -> Result<(), StoreError> {
        self.records.lock().push(record);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<StoredFlightRecord>, StoreError> {
        Ok(self.snapshot())
    }
}
