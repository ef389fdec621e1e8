use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, ExcelDateTime, Reader, Xlsx};
use chrono::NaiveTime;
use rust_xlsxwriter::Workbook;
use tracing::{debug, info, warn};

use super::{require_key, RecordStore, Result, StoreError};
use crate::models::{Record, FIELDS};

pub const DEFAULT_SHEET: &str = "Comp490 Jobs";

/// Record store over a single worksheet.
///
/// The sheet is read once on open. Every mutation rewrites the whole workbook
/// through a temporary file in the same directory, then renames it over the
/// original, so the file on disk always holds a complete sheet.
pub struct XlsxStore {
    path: PathBuf,
    sheet: String,
    records: Vec<Record>,
}

impl XlsxStore {
    /// Loads `sheet` from `path`. A missing file gives an empty store, the
    /// workbook is created on the first mutation.
    pub fn open(path: &Path, sheet: &str) -> Result<Self> {
        let records = if path.exists() {
            dedup(read_records(path, sheet)?)
        } else {
            info!(path = %path.display(), "workbook not found, starting empty");
            Vec::new()
        };
        info!(path = %path.display(), sheet, records = records.len(), "workbook loaded");

        Ok(Self {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            records,
        })
    }

    /// Writes `records` to a new workbook at `path` and returns it as a store
    pub fn create(path: &Path, sheet: &str, records: Vec<Record>) -> Result<Self> {
        let store = Self {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            records: dedup(records),
        };
        write_records(&store.path, &store.sheet, &store.records)?;

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn position(&self, job_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.job_id == job_id)
    }

    /// Persists `next` and only then makes it the current list
    fn commit(&mut self, next: Vec<Record>) -> Result<()> {
        write_records(&self.path, &self.sheet, &next)?;
        self.records = next;
        Ok(())
    }
}

impl RecordStore for XlsxStore {
    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn get(&self, index: usize) -> Result<Record> {
        self.records
            .get(index)
            .cloned()
            .ok_or(StoreError::IndexNotFound(index))
    }

    fn add(&mut self, record: Record) -> Result<()> {
        require_key(&record)?;
        if self.position(&record.job_id).is_some() {
            return Err(StoreError::DuplicateKey(record.job_id));
        }
        let job_id = record.job_id.clone();
        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)?;
        debug!(job_id = %job_id, "appended record");

        Ok(())
    }

    fn update(&mut self, record: Record) -> Result<()> {
        require_key(&record)?;
        let Some(index) = self.position(&record.job_id) else {
            return Err(StoreError::KeyNotFound(record.job_id));
        };
        let job_id = record.job_id.clone();
        let mut next = self.records.clone();
        next[index] = record;
        self.commit(next)?;
        debug!(job_id = %job_id, index, "updated record");

        Ok(())
    }

    fn delete(&mut self, job_id: &str) -> Result<()> {
        let index = self
            .position(job_id)
            .ok_or_else(|| StoreError::KeyNotFound(job_id.to_string()))?;
        self.delete_at(index)?;

        Ok(())
    }

    fn delete_at(&mut self, index: usize) -> Result<Record> {
        if index >= self.records.len() {
            return Err(StoreError::IndexNotFound(index));
        }
        let mut next = self.records.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        debug!(job_id = %removed.job_id, index, "deleted record");

        Ok(removed)
    }

    fn records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn find(&self, job_id: &str) -> Result<Option<(usize, Record)>> {
        Ok(self
            .position(job_id)
            .map(|i| (i, self.records[i].clone())))
    }
}

/// Reads every record from `sheet`, skipping the header row and rows without
/// a JobId
pub fn read_records(path: &Path, sheet: &str) -> Result<Vec<Record>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(sheet)?;

    let mut rows = range.rows();
    if let Some(header) = rows.next() {
        let header: Vec<String> = header.iter().map(cell_text).collect();
        if header.iter().map(String::as_str).ne(FIELDS) {
            warn!(sheet, ?header, "unexpected header row, reading columns by position");
        }
    }

    Ok(rows
        .enumerate()
        .map(|(i, row)| (i + 2, row.iter().map(cell_text).collect::<Vec<_>>()))
        .filter_map(|(line, cells)| {
            let record = Record::from_cells(&cells);
            if require_key(&record).is_ok() {
                return Some(record);
            }
            if cells.iter().any(|c| !c.is_empty()) {
                warn!(sheet, row = line, "skipping row without a job id");
            }
            None
        })
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => date_text(dt),
        other => other.to_string(),
    }
}

/// Date cells read back the way a date-formatted cell displays, not as the
/// serial number underneath
fn date_text(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        let secs = dt.as_duration().map_or(0, |d| d.num_seconds());
        return format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60);
    }
    match dt.as_datetime() {
        Some(t) if dt.as_f64() < 1.0 => t.format("%H:%M:%S").to_string(),
        Some(t) if t.time() == NaiveTime::MIN => t.format("%Y-%m-%d").to_string(),
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => dt.as_f64().to_string(),
    }
}

/// Keeps the first record for every JobId
fn dedup(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let first = seen.insert(r.job_id.clone());
            if !first {
                warn!(job_id = %r.job_id, "dropping row with repeated job id");
            }
            first
        })
        .collect()
}

/// Writes the header and every record starting at the first cell
pub fn write_records(path: &Path, sheet: &str, records: &[Record]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (col, name) in FIELDS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name)?;
    }
    for (row, record) in records.iter().enumerate() {
        for (col, value) in record.cells().into_iter().enumerate() {
            worksheet.write_string(row as u32 + 1, col as u16, value)?;
        }
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".jobinfo-")
        .suffix(".xlsx")
        .tempfile_in(dir)?;
    workbook.save(tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), rows = records.len(), "workbook written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{self as contract, record};
    use calamine::ExcelDateTimeType;
    use rust_xlsxwriter::Format;

    fn store() -> (tempfile::TempDir, XlsxStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = XlsxStore::open(&dir.path().join("jobs.xlsx"), DEFAULT_SHEET).unwrap();
        (dir, store)
    }

    #[test]
    fn lifecycle() {
        let (_dir, mut store) = store();
        contract::lifecycle(&mut store);
    }

    #[test]
    fn add_then_get() {
        let (_dir, mut store) = store();
        contract::add_then_get(&mut store);
    }

    #[test]
    fn rejects_duplicates() {
        let (_dir, mut store) = store();
        contract::rejects_duplicates(&mut store);
    }

    #[test]
    fn rejects_empty_job_id() {
        let (_dir, mut store) = store();
        contract::rejects_empty_job_id(&mut store);
    }

    #[test]
    fn update_touches_one_record() {
        let (_dir, mut store) = store();
        contract::update_touches_one_record(&mut store);
    }

    #[test]
    fn delete_by_position() {
        let (_dir, mut store) = store();
        contract::delete_by_position(&mut store);
    }

    #[test]
    fn missing_file_is_created_on_first_write() {
        let (dir, mut store) = store();
        let path = dir.path().join("jobs.xlsx");
        assert!(!path.exists());

        store.add(record("J1", "Acme")).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path);
    }

    #[test]
    fn reload_returns_same_records() {
        let (dir, mut store) = store();
        let mut sparse = record("J2", "Globex");
        sparse.country = String::new();
        sparse.salary_min = String::new();
        store.add(record("J1", "Acme")).unwrap();
        store.add(sparse).unwrap();
        store.add(record("J3", "Initech")).unwrap();
        store.delete("J1").unwrap();

        let reopened = XlsxStore::open(&dir.path().join("jobs.xlsx"), DEFAULT_SHEET).unwrap();
        assert_eq!(reopened.records().unwrap(), store.records().unwrap());
    }

    #[test]
    fn reload_keeps_records_with_only_a_job_id() {
        let (dir, mut store) = store();
        let bare = Record {
            job_id: "J1".into(),
            ..Default::default()
        };
        store.add(bare.clone()).unwrap();
        store.add(record("J2", "Globex")).unwrap();

        let reopened = XlsxStore::open(&dir.path().join("jobs.xlsx"), DEFAULT_SHEET).unwrap();
        assert_eq!(reopened.records().unwrap(), vec![bare, record("J2", "Globex")]);
    }

    #[test]
    fn rows_without_job_id_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xlsx");
        let rows = [record("", "Acme"), Record::default(), record("J2", "Globex")];
        write_records(&path, DEFAULT_SHEET, &rows).unwrap();

        assert_eq!(read_records(&path, DEFAULT_SHEET).unwrap(), vec![record("J2", "Globex")]);
    }

    #[test]
    fn header_row_is_written_first() {
        let (dir, mut store) = store();
        store.add(record("J1", "Acme")).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(dir.path().join("jobs.xlsx")).unwrap();
        let range = workbook.worksheet_range(DEFAULT_SHEET).unwrap();
        let header: Vec<String> = range.rows().next().unwrap().iter().map(cell_text).collect();
        assert_eq!(header, FIELDS);
        assert_eq!(range.height(), 2);
    }

    #[test]
    fn failed_write_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        let mut store = XlsxStore::open(&nested.join("jobs.xlsx"), DEFAULT_SHEET).unwrap();
        store.add(record("J1", "Acme")).unwrap();

        std::fs::remove_dir_all(&nested).unwrap();
        assert!(store.add(record("J2", "Globex")).is_err());
        assert!(store.update(record("J1", "Acme Corp")).is_err());
        assert!(store.delete("J1").is_err());

        assert_eq!(store.records().unwrap(), vec![record("J1", "Acme")]);
    }

    #[test]
    fn repeated_job_ids_keep_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xlsx");
        let rows = [record("J1", "Acme"), record("J1", "Globex"), record("J2", "Initech")];
        write_records(&path, DEFAULT_SHEET, &rows).unwrap();

        let store = XlsxStore::open(&path, DEFAULT_SHEET).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get(0).unwrap().company_name, "Acme");
    }

    #[test]
    fn unknown_sheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xlsx");
        XlsxStore::create(&path, "Other", vec![record("J1", "Acme")]).unwrap();

        let err = XlsxStore::open(&path, DEFAULT_SHEET).err().unwrap();
        assert!(matches!(err, StoreError::ReadWorkbook(_)));
    }

    #[test]
    fn numeric_cells_read_as_plain_text() {
        assert_eq!(cell_text(&Data::Float(120000.0)), "120000");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::DateTimeIso("2024-03-01".into())), "2024-03-01");

        let at = |value, kind| Data::DateTime(ExcelDateTime::new(value, kind, false));
        assert_eq!(cell_text(&at(45352.0, ExcelDateTimeType::DateTime)), "2024-03-01");
        assert_eq!(cell_text(&at(45352.5, ExcelDateTimeType::DateTime)), "2024-03-01 12:00:00");
        assert_eq!(cell_text(&at(0.75, ExcelDateTimeType::DateTime)), "18:00:00");
        assert_eq!(cell_text(&at(1.5, ExcelDateTimeType::TimeDelta)), "36:00:00");
    }

    #[test]
    fn date_formatted_cells_read_as_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(DEFAULT_SHEET).unwrap();
        for (col, name) in FIELDS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *name).unwrap();
        }
        for (col, value) in record("J1", "Acme").cells().into_iter().enumerate() {
            worksheet.write_string(1, col as u16, value).unwrap();
        }
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 3, 1).unwrap();
        let format = Format::new().set_num_format("yyyy-mm-dd");
        worksheet.write_datetime_with_format(1, 5, &date, &format).unwrap();
        workbook.save(&path).unwrap();

        let records = read_records(&path, DEFAULT_SHEET).unwrap();
        assert_eq!(records, vec![record("J1", "Acme")]);
        assert_eq!(records[0].publication_date, "2024-03-01");
    }
}
