use std::path::Path;

use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use tempfile::TempPath;
use tracing::debug;

use super::{require_key, RecordStore, Result, StoreError};
use crate::db;
use crate::models::Record;

/// Record store over the `jobs` table, ordered by its surrogate `id`
pub struct SqliteStore {
    conn: Connection,
    // Removes the materialized copy once the connection is gone
    _scratch: Option<TempPath>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: db::init(path)?,
            _scratch: None,
        })
    }

    /// Works on a temporary copy of `seed`, leaving the original untouched
    pub fn materialize(seed: &[u8]) -> Result<Self> {
        let (conn, path) = db::materialize(seed)?;
        Ok(Self {
            conn,
            _scratch: Some(path),
        })
    }
}

impl Record {
    fn from_row(r: &Row) -> Result<Self, rusqlite::Error> {
        let text = |i: usize| r.get::<_, Option<String>>(i).map(Option::unwrap_or_default);
        Ok(Self {
            company_name: text(0)?,
            posting_age: text(1)?,
            job_id: text(2)?,
            country: text(3)?,
            location: text(4)?,
            publication_date: text(5)?,
            salary_max: text(6)?,
            salary_min: text(7)?,
            salary_type: text(8)?,
            job_title: text(9)?,
        })
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == ErrorCode::ConstraintViolation
                && f.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl RecordStore for SqliteStore {
    fn count(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached("SELECT COUNT(*) FROM jobs")?;
        let count: i64 = stmt.query_row([], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn get(&self, index: usize) -> Result<Record> {
        let offset = i64::try_from(index).map_err(|_| StoreError::IndexNotFound(index))?;
        let mut stmt = self.conn.prepare_cached(
            "SELECT CompanyName, PostingAge, JobId, Country, Location, PublicationDate, SalaryMax, SalaryMin, SalaryType, JobTitle FROM jobs ORDER BY id LIMIT 1 OFFSET ?",
        )?;
        stmt.query_row([offset], Record::from_row)
            .optional()?
            .ok_or(StoreError::IndexNotFound(index))
    }

    fn add(&mut self, record: Record) -> Result<()> {
        require_key(&record)?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO jobs (CompanyName, PostingAge, JobId, Country, Location, PublicationDate, SalaryMax, SalaryMin, SalaryType, JobTitle) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        match stmt.execute(params![
            record.company_name,
            record.posting_age,
            record.job_id,
            record.country,
            record.location,
            record.publication_date,
            record.salary_max,
            record.salary_min,
            record.salary_type,
            record.job_title,
        ]) {
            Ok(_) => {
                debug!(job_id = %record.job_id, "inserted record");
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateKey(record.job_id)),
            Err(e) => Err(e.into()),
        }
    }

    fn update(&mut self, record: Record) -> Result<()> {
        require_key(&record)?;
        let mut stmt = self.conn.prepare_cached(
            "UPDATE jobs SET CompanyName = ?, PostingAge = ?, Country = ?, Location = ?, PublicationDate = ?, SalaryMax = ?, SalaryMin = ?, SalaryType = ?, JobTitle = ? WHERE JobId = ?",
        )?;
        let changed = stmt.execute(params![
            record.company_name,
            record.posting_age,
            record.country,
            record.location,
            record.publication_date,
            record.salary_max,
            record.salary_min,
            record.salary_type,
            record.job_title,
            record.job_id,
        ])?;
        if changed == 0 {
            return Err(StoreError::KeyNotFound(record.job_id));
        }
        debug!(job_id = %record.job_id, "updated record");

        Ok(())
    }

    fn delete(&mut self, job_id: &str) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("DELETE FROM jobs WHERE JobId = ?")?;
        if stmt.execute([job_id])? == 0 {
            return Err(StoreError::KeyNotFound(job_id.to_string()));
        }
        debug!(job_id, "deleted record");

        Ok(())
    }

    fn find(&self, job_id: &str) -> Result<Option<(usize, Record)>> {
        let id: Option<i64> = self
            .conn
            .prepare_cached("SELECT id FROM jobs WHERE JobId = ?")?
            .query_row([job_id], |r| r.get(0))
            .optional()?;
        let Some(id) = id else {
            return Ok(None);
        };
        let position: i64 = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM jobs WHERE id < ?")?
            .query_row([id], |r| r.get(0))?;

        Ok(Some((position as usize, self.get(position as usize)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{self as contract, record};

    fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("data").join("jobinfo.db")).unwrap();
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
    fn reopening_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobinfo.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.add(record("J1", "Acme")).unwrap();
            store.add(record("J2", "Globex")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.records().unwrap(), vec![record("J1", "Acme"), record("J2", "Globex")]);
    }

    #[test]
    fn order_follows_insertion_after_deletes() {
        let (_dir, mut store) = store();
        store.add(record("J1", "Acme")).unwrap();
        store.add(record("J2", "Globex")).unwrap();
        store.delete("J1").unwrap();
        store.add(record("J1", "Acme")).unwrap();

        let ids: Vec<_> = store.records().unwrap().into_iter().map(|r| r.job_id).collect();
        assert_eq!(ids, ["J2", "J1"]);
    }

    #[test]
    fn null_columns_read_as_empty() {
        let (_dir, store) = store();
        store
            .conn
            .execute("INSERT INTO jobs (JobId, CompanyName) VALUES ('J1', 'Acme')", [])
            .unwrap();

        let found = store.get(0).unwrap();
        assert_eq!(found.company_name, "Acme");
        assert_eq!(found.job_title, "");
        assert_eq!(store.find("J1").unwrap(), Some((0, found)));
    }

    #[test]
    fn materialized_copy_leaves_seed_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.db");
        {
            let mut seed = SqliteStore::open(&path).unwrap();
            seed.add(record("J1", "Acme")).unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        let mut scratch = SqliteStore::materialize(&bytes).unwrap();
        assert_eq!(scratch.get(0).unwrap(), record("J1", "Acme"));
        scratch.add(record("J2", "Globex")).unwrap();
        assert_eq!(scratch.count().unwrap(), 2);

        assert_eq!(SqliteStore::open(&path).unwrap().count().unwrap(), 1);
    }

    #[test]
    fn materialize_from_nothing_is_empty() {
        let store = SqliteStore::materialize(&[]).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
