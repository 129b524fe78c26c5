//! Sink collaborator with replace-on-load semantics.
//!
//! [`CsvDirectorySink`] stores each table as `<dir>/<name>.csv`. A table is
//! written to a temporary sibling first and renamed over the previous file, so
//! readers see either the old or the new contents, never a mix.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::debug;
use thiserror::Error;

use crate::{io_utils, model::NormalizedTable};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid table name '{0}' (use lower-case letters, digits and '_')")]
    InvalidName(String),
    #[error("Writing table '{table}' to {path:?}: {source}")]
    Write {
        table: String,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A two-column code → label table such as `country_codes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    pub name: String,
    pub key_field: String,
    pub label_field: String,
    pub entries: BTreeMap<String, String>,
}

pub trait Sink {
    /// Replaces any existing table called `name` with `table`.
    fn replace(&mut self, name: &str, table: &NormalizedTable) -> Result<(), SinkError>;

    fn replace_lookup(&mut self, lookup: &LookupTable) -> Result<(), SinkError>;
}

pub fn validate_table_name(name: &str) -> Result<(), SinkError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SinkError::InvalidName(name.to_string()))
    }
}

pub fn table_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.csv"))
}

#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    dir: PathBuf,
}

impl CsvDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_rows<I>(&self, name: &str, headers: &[String], rows: I) -> Result<(), SinkError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        validate_table_name(name)?;
        let target = table_path(&self.dir, name);
        let staging = self.dir.join(format!(".{name}.csv.tmp"));
        let fail = |err: Box<dyn std::error::Error + Send + Sync>| SinkError::Write {
            table: name.to_string(),
            path: target.clone(),
            source: err,
        };

        fs::create_dir_all(&self.dir).map_err(|e| fail(e.into()))?;
        match stage_and_swap(&staging, &target, headers, rows) {
            Ok(count) => {
                debug!("Replaced table '{name}' ({count} row(s)) at {target:?}");
                Ok(())
            }
            Err(err) => {
                if staging.exists() {
                    let _ = fs::remove_file(&staging);
                }
                Err(fail(err))
            }
        }
    }
}

/// Writes every row to `staging`, then renames it over `target`.
fn stage_and_swap<I>(
    staging: &Path,
    target: &Path,
    headers: &[String],
    rows: I,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = io_utils::open_csv_writer(staging)?;
    writer.write_record(headers)?;
    let mut count = 0usize;
    for row in rows {
        writer.write_record(&row)?;
        count += 1;
    }
    let mut inner = writer.into_inner().map_err(|e| e.to_string())?;
    inner.flush()?;
    drop(inner);
    fs::rename(staging, target)?;
    Ok(count)
}

impl Sink for CsvDirectorySink {
    fn replace(&mut self, name: &str, table: &NormalizedTable) -> Result<(), SinkError> {
        self.write_rows(
            name,
            &table.headers(),
            table.records.iter().map(|record| table.render_row(record)),
        )
    }

    fn replace_lookup(&mut self, lookup: &LookupTable) -> Result<(), SinkError> {
        let headers = [lookup.key_field.clone(), lookup.label_field.clone()];
        self.write_rows(
            &lookup.name,
            &headers,
            lookup
                .entries
                .iter()
                .map(|(code, label)| vec![code.clone(), label.clone()]),
        )
    }
}
