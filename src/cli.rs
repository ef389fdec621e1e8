pub mod parse;
pub mod validation;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::warn;

use crate::config::{Backend, Config};
use crate::models::Record;
use crate::seed::seed_from_workbook;
use crate::store::{RecordStore, SqliteStore, StoreError, XlsxStore};
use parse::RecordArgs;
use validation::{validate_extension, validate_output, validate_workbook};

/// Opens the store selected by `config`, seeding it first when a seed
/// workbook is configured for the database backend
pub fn open_store(config: &Config, scratch: bool) -> Result<Box<dyn RecordStore>> {
    let mut store: Box<dyn RecordStore> = match config.backend {
        Backend::Sqlite if scratch => {
            let seed = match std::fs::read(&config.database) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to read {}", config.database.display()))
                }
            };
            Box::new(SqliteStore::materialize(&seed).context("Failed to create scratch database")?)
        }
        Backend::Sqlite => Box::new(SqliteStore::open(&config.database).with_context(|| {
            format!("Failed to open database {}", config.database.display())
        })?),
        Backend::Xlsx => {
            if scratch {
                return Err(anyhow!("--scratch only applies to the sqlite backend"));
            }
            validate_extension(&config.workbook)?;
            Box::new(
                XlsxStore::open(&config.workbook, &config.sheet).with_context(|| {
                    format!("Failed to load workbook {}", config.workbook.display())
                })?,
            )
        }
    };

    match (config.backend, &config.seed) {
        (Backend::Sqlite, Some(seed)) => {
            validate_workbook(seed)?;
            seed_from_workbook(store.as_mut(), seed, &config.sheet)
                .with_context(|| format!("Failed to load seed workbook {}", seed.display()))?;
        }
        (Backend::Xlsx, Some(_)) => warn!("seed workbook is ignored by the xlsx backend"),
        _ => {}
    }

    Ok(store)
}

pub fn list(store: &dyn RecordStore, json: bool) -> Result<()> {
    let records = store.records()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records");
    }
    for (index, record) in records.iter().enumerate() {
        println!("{}: {}", index, record.summary());
    }

    Ok(())
}

pub fn count(store: &dyn RecordStore) -> Result<()> {
    println!("{}", store.count()?);
    Ok(())
}

pub fn show(store: &dyn RecordStore, index: usize, json: bool) -> Result<()> {
    let record = store.get(index)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", record);
    }

    Ok(())
}

pub fn add(store: &mut dyn RecordStore, record: Record) -> Result<()> {
    let job_id = record.job_id.clone();
    store.add(record)?;
    println!("Added record {}", job_id);
    Ok(())
}

/// Starts from the stored record, like a form pre-filled with current values
pub fn update(store: &mut dyn RecordStore, job_id: String, fields: RecordArgs) -> Result<()> {
    if fields.is_empty() {
        return Err(anyhow!("Nothing to update, pass at least one field"));
    }
    let (_, mut record) = store
        .find(&job_id)?
        .ok_or_else(|| StoreError::KeyNotFound(job_id.clone()))?;
    fields.apply(&mut record);
    store.update(record.clone())?;
    print!("{}", record);

    Ok(())
}

pub fn delete(store: &mut dyn RecordStore, job_id: Option<String>, index: Option<usize>) -> Result<()> {
    let removed = match (job_id, index) {
        (Some(job_id), None) => {
            store.delete(&job_id)?;
            job_id
        }
        (None, Some(index)) => store.delete_at(index)?.job_id,
        _ => return Err(anyhow!("Pass either a job id or --index")),
    };
    println!("Deleted record {}", removed);

    Ok(())
}

pub fn seed(store: &mut dyn RecordStore, workbook: &Path, sheet: &str) -> Result<()> {
    validate_workbook(workbook)?;
    let report = seed_from_workbook(store, workbook, sheet)?;
    println!(
        "Inserted {} records, skipped {} duplicates",
        report.inserted, report.skipped
    );

    Ok(())
}

pub fn export(store: &dyn RecordStore, output: &Path, sheet: &str, force: bool) -> Result<()> {
    validate_output(output, force)?;
    let exported = XlsxStore::create(output, sheet, store.records()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Exported {} records to {}",
        exported.count()?,
        exported.path().display()
    );

    Ok(())
}
