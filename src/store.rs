pub mod sqlite;
pub mod xlsx;

use thiserror::Error;

use crate::models::Record;

pub use sqlite::SqliteStore;
pub use xlsx::XlsxStore;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record at index {0}")]
    IndexNotFound(usize),
    #[error("no record with job id {0:?}")]
    KeyNotFound(String),
    #[error("a record with job id {0:?} already exists")]
    DuplicateKey(String),
    #[error("job id must not be empty")]
    EmptyKey,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to read workbook: {0}")]
    ReadWorkbook(#[from] calamine::XlsxError),
    #[error("failed to write workbook: {0}")]
    WriteWorkbook(#[from] rust_xlsxwriter::XlsxError),
}

/// Every stored record needs a JobId, a blank one could never be found again
pub(crate) fn require_key(record: &Record) -> Result<()> {
    if record.job_id.trim().is_empty() {
        return Err(StoreError::EmptyKey);
    }
    Ok(())
}

/// Ordered collection of job records keyed by JobId.
///
/// Every mutation is persisted before it returns. A failed call leaves the
/// store as it was.
pub trait RecordStore {
    fn count(&self) -> Result<usize>;

    /// Record at position `index` in the store's stable ordering
    fn get(&self, index: usize) -> Result<Record>;

    /// Appends a record, rejecting a JobId that is empty or already present
    fn add(&mut self, record: Record) -> Result<()>;

    /// Replaces every field of the record sharing `record.job_id`
    fn update(&mut self, record: Record) -> Result<()>;

    fn delete(&mut self, job_id: &str) -> Result<()>;

    /// Deletes whatever record currently sits at `index`
    fn delete_at(&mut self, index: usize) -> Result<Record> {
        let record = self.get(index)?;
        self.delete(&record.job_id)?;
        Ok(record)
    }

    fn records(&self) -> Result<Vec<Record>> {
        (0..self.count()?).map(|i| self.get(i)).collect()
    }

    fn find(&self, job_id: &str) -> Result<Option<(usize, Record)>> {
        Ok(self
            .records()?
            .into_iter()
            .enumerate()
            .find(|(_, r)| r.job_id == job_id))
    }
}
