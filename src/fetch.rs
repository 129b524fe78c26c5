//! Fetch collaborator: resolves a dataset code to a [`RawTable`].

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use encoding_rs::Encoding;
use log::debug;
use regex::Regex;
use thiserror::Error;

use crate::{
    io_utils,
    raw::{RawTable, RawTableError},
};

/// Separator packing several identifier names into one header cell in
/// Eurostat bulk TSV downloads.
pub const PACKED_HEADER_SEPARATOR: char = ',';

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No source file for dataset '{code}' in {dir:?}")]
    NotFound { code: String, dir: PathBuf },
    #[error("Reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Malformed table in {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: RawTableError,
    },
}

pub trait Fetch {
    fn fetch(&self, code: &str) -> Result<RawTable, FetchError>;
}

/// Reads `<dir>/<code>.tsv`, falling back to `<dir>/<code>.csv`.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    dir: PathBuf,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
}

impl DirectoryFetcher {
    pub fn new(dir: impl Into<PathBuf>, delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Self {
            dir: dir.into(),
            delimiter,
            encoding,
        }
    }

    fn locate(&self, code: &str) -> Option<PathBuf> {
        ["tsv", "csv"]
            .iter()
            .map(|ext| self.dir.join(format!("{code}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl Fetch for DirectoryFetcher {
    fn fetch(&self, code: &str) -> Result<RawTable, FetchError> {
        let path = self.locate(code).ok_or_else(|| FetchError::NotFound {
            code: code.to_string(),
            dir: self.dir.clone(),
        })?;
        debug!("Reading dataset '{code}' from {path:?}");
        read_raw_table(&path, self.delimiter, self.encoding)
    }
}

fn flagged_observation() -> &'static Regex {
    static FLAGGED: OnceLock<Regex> = OnceLock::new();
    FLAGGED.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s+[a-z]{1,4}\s*$")
            .expect("flagged observation pattern")
    })
}

/// Drops the observation flag of a bulk TSV cell (`22.1 b` → `22.1`).
/// Placeholders keep their flag (`: c`) and stay missing downstream.
pub fn strip_observation_flag(cell: String) -> String {
    match flagged_observation().captures(&cell) {
        Some(caps) => caps[1].to_string(),
        None => cell,
    }
}

/// Loads a wide table from disk. A Eurostat bulk TSV (packed leading column)
/// is unpacked and its observation flags are split off the values.
pub fn read_raw_table(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<RawTable, FetchError> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let (headers, mut rows) =
        read_records(path, delimiter, encoding).map_err(|err| FetchError::Read {
            path: path.to_path_buf(),
            source: err.into(),
        })?;
    let packed = headers
        .first()
        .is_some_and(|h| h.contains(PACKED_HEADER_SEPARATOR));
    if packed {
        for row in &mut rows {
            for cell in row.iter_mut() {
                *cell = strip_observation_flag(std::mem::take(cell));
            }
        }
    }
    let malformed = |source| FetchError::Malformed {
        path: path.to_path_buf(),
        source,
    };
    RawTable::new(headers, rows)
        .and_then(|table| table.unpack_leading_column(PACKED_HEADER_SEPARATOR))
        .map_err(malformed)
}

fn read_records(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> anyhow::Result<(Vec<String>, Vec<Vec<String>>)> {
    use anyhow::Context;

    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        rows.push(io_utils::decode_record(&record, encoding)?);
    }
    Ok((headers, rows))
}
