//! Parameterized, streaming queries over stored tables.
//!
//! Stored files are read record by record and only matching records are kept,
//! so a narrow view never materializes the whole table.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use encoding_rs::UTF_8;
use thiserror::Error;

use crate::{
    coerce::{coerce_identifier, coerce_value},
    io_utils,
    model::{GEO, NormalizedRecord, NormalizedTable, VALUE, YEAR},
    sink::{SinkError, table_path, validate_table_name},
};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    InvalidName(#[from] SinkError),
    #[error("Table '{table}' has no identifier field '{field}'")]
    UnknownField { table: String, field: String },
    #[error("Stored table {path:?} is malformed: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("Reading stored table {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    Any,
    Exact(i32),
    /// Inclusive on both ends.
    Range { from: i32, to: i32 },
    /// Only the most recent year present in the table that is `<=` the bound.
    LatestAtOrBefore(i32),
}

impl YearFilter {
    fn admits(&self, year: i32) -> bool {
        match *self {
            YearFilter::Any => true,
            YearFilter::Exact(y) => year == y,
            YearFilter::Range { from, to } => (from..=to).contains(&year),
            YearFilter::LatestAtOrBefore(bound) => year <= bound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableQuery {
    /// `None` admits every geography.
    pub geos: Option<BTreeSet<String>>,
    pub years: YearFilter,
    /// Allowed codes per identifier field.
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// No table of that name has been loaded.
    Absent,
    /// The table exists but nothing matched.
    Empty { identifier_names: Vec<String> },
    Rows(NormalizedTable),
}

impl QueryOutcome {
    pub fn into_table(self) -> Option<NormalizedTable> {
        match self {
            QueryOutcome::Rows(table) => Some(table),
            _ => None,
        }
    }
}

/// Distinct geographies and the year span of a stored table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facets {
    pub geos: BTreeSet<String>,
    pub years: Option<(i32, i32)>,
    pub records: usize,
}

#[derive(Debug, Clone)]
pub struct TableStore {
    dir: PathBuf,
}

struct StoredReader {
    path: PathBuf,
    reader: csv::Reader<BufReader<File>>,
    identifier_names: Vec<String>,
}

impl StoredReader {
    fn open(path: PathBuf) -> Result<Self, QueryError> {
        let read_err = |path: &Path, err: Box<dyn std::error::Error + Send + Sync>| {
            QueryError::Read {
                path: path.to_path_buf(),
                source: err,
            }
        };
        let mut reader = io_utils::open_csv_reader_from_path(&path, io_utils::DEFAULT_CSV_DELIMITER)
            .map_err(|e| read_err(&path, e.into()))?;
        let headers =
            io_utils::reader_headers(&mut reader, UTF_8).map_err(|e| read_err(&path, e.into()))?;
        let n = headers.len();
        if n < 3 || headers[n - 2] != YEAR || headers[n - 1] != VALUE || !headers.iter().any(|h| h == GEO)
        {
            return Err(QueryError::Corrupt {
                path,
                reason: format!("unexpected header {headers:?}"),
            });
        }
        Ok(Self {
            path,
            reader,
            identifier_names: headers[..n - 2].to_vec(),
        })
    }

    /// Visits every stored record in file order.
    fn for_each<F>(&mut self, mut visit: F) -> Result<(), QueryError>
    where
        F: FnMut(NormalizedRecord),
    {
        let width = self.identifier_names.len();
        for (row_idx, record) in self.reader.records().enumerate() {
            let record = record.map_err(|e| QueryError::Read {
                path: self.path.clone(),
                source: e.into(),
            })?;
            let corrupt = |reason: String| QueryError::Corrupt {
                path: self.path.clone(),
                reason: format!("row {}: {reason}", row_idx + 2),
            };
            let year = record[width]
                .parse::<i32>()
                .map_err(|_| corrupt(format!("bad year '{}'", &record[width])))?;
            let value = coerce_value(&record[width + 1])
                .ok_or_else(|| corrupt(format!("bad value '{}'", &record[width + 1])))?;
            visit(NormalizedRecord {
                identifiers: record.iter().take(width).map(coerce_identifier).collect(),
                year,
                value,
            });
        }
        Ok(())
    }
}

impl TableStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn open(&self, name: &str) -> Result<Option<StoredReader>, QueryError> {
        validate_table_name(name)?;
        let path = table_path(&self.dir, name);
        if !path.is_file() {
            return Ok(None);
        }
        StoredReader::open(path).map(Some)
    }

    pub fn query(&self, name: &str, query: &TableQuery) -> Result<QueryOutcome, QueryError> {
        let Some(mut stored) = self.open(name)? else {
            return Ok(QueryOutcome::Absent);
        };
        let geo_idx = stored
            .identifier_names
            .iter()
            .position(|n| n == GEO)
            .unwrap_or_default();
        let mut categories = Vec::with_capacity(query.categories.len());
        for (field, codes) in &query.categories {
            let idx = stored
                .identifier_names
                .iter()
                .position(|n| n == field)
                .ok_or_else(|| QueryError::UnknownField {
                    table: name.to_string(),
                    field: field.clone(),
                })?;
            categories.push((idx, codes));
        }

        let admits = |record: &NormalizedRecord| {
            let cell = move |idx: usize| record.identifiers[idx].as_deref();
            query.years.admits(record.year)
                && query
                    .geos
                    .as_ref()
                    .is_none_or(|geos| cell(geo_idx).is_some_and(|g| geos.contains(g)))
                && categories
                    .iter()
                    .all(|(idx, codes)| cell(*idx).is_some_and(|c| codes.contains(c)))
        };

        let latest_only = matches!(query.years, YearFilter::LatestAtOrBefore(_));
        let mut best_year: Option<i32> = None;
        let mut records = Vec::new();
        stored.for_each(|record| {
            if !admits(&record) {
                return;
            }
            if latest_only {
                match best_year {
                    Some(best) if record.year < best => return,
                    Some(best) if record.year == best => {}
                    _ => {
                        best_year = Some(record.year);
                        records.clear();
                    }
                }
            }
            records.push(record);
        })?;

        let identifier_names = stored.identifier_names;
        if records.is_empty() {
            Ok(QueryOutcome::Empty { identifier_names })
        } else {
            Ok(QueryOutcome::Rows(NormalizedTable {
                identifier_names,
                records,
            }))
        }
    }

    pub fn facets(&self, name: &str) -> Result<Option<Facets>, QueryError> {
        let Some(mut stored) = self.open(name)? else {
            return Ok(None);
        };
        let geo_idx = stored
            .identifier_names
            .iter()
            .position(|n| n == GEO)
            .unwrap_or_default();
        let mut facets = Facets {
            geos: BTreeSet::new(),
            years: None,
            records: 0,
        };
        stored.for_each(|record| {
            facets.records += 1;
            if let Some(geo) = &record.identifiers[geo_idx] {
                facets.geos.insert(geo.clone());
            }
            facets.years = Some(match facets.years {
                Some((lo, hi)) => (lo.min(record.year), hi.max(record.year)),
                None => (record.year, record.year),
            });
        })?;
        Ok(Some(facets))
    }

    /// Reads a stored `code → label` table. Absent tables yield an empty map.
    pub fn lookup(&self, name: &str) -> Result<BTreeMap<String, String>, QueryError> {
        validate_table_name(name)?;
        let path = table_path(&self.dir, name);
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let read_err = |err: Box<dyn std::error::Error + Send + Sync>| QueryError::Read {
            path: path.clone(),
            source: err,
        };
        let mut reader = io_utils::open_csv_reader_from_path(&path, io_utils::DEFAULT_CSV_DELIMITER)
            .map_err(|e| read_err(e.into()))?;
        let mut entries = BTreeMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| read_err(e.into()))?;
            if let (Some(code), Some(label)) = (record.get(0), record.get(1)) {
                entries.insert(code.to_string(), label.to_string());
            }
        }
        Ok(entries)
    }
}
