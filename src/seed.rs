use std::path::Path;

use tracing::{info, warn};

use crate::models::Record;
use crate::store::{xlsx, RecordStore, Result, StoreError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Adds every record whose JobId is not in the store yet.
/// Seeding the same rows again is a no-op.
pub fn seed(store: &mut dyn RecordStore, records: Vec<Record>) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    for record in records {
        match store.add(record) {
            Ok(()) => report.inserted += 1,
            Err(StoreError::DuplicateKey(job_id)) => {
                warn!(job_id = %job_id, "job id already present, skipping row");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// Seeds `store` from the rows of a workbook sheet, header excluded
pub fn seed_from_workbook(
    store: &mut dyn RecordStore,
    workbook: &Path,
    sheet: &str,
) -> Result<SeedReport> {
    let records = xlsx::read_records(workbook, sheet)?;
    let report = seed(store, records)?;
    info!(
        workbook = %workbook.display(),
        inserted = report.inserted,
        skipped = report.skipped,
        "seed data loaded"
    );

    Ok(report)
}
