//! Wide-format source tables as received from the fetch collaborator.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawTableError {
    #[error("Raw table has no columns")]
    NoColumns,
    #[error("Row {row} has {found} cell(s), expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// One wide table: a header per column and row-aligned string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, RawTableError> {
        if headers.is_empty() {
            return Err(RawTableError::NoColumns);
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(RawTableError::RaggedRow {
                row: idx + 1,
                expected: headers.len(),
                found: row.len(),
            });
        }
        Ok(Self { headers, rows })
    }

    /// Convenience constructor used by tests and demos.
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Result<Self, RawTableError> {
        Self::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Splits a packed leading column the way Eurostat bulk TSV files ship them:
    /// the first header cell reads `unit,age,sex,geo\time` and the first cell of
    /// every row carries the matching codes separated by the same comma.
    ///
    /// Tables whose first header does not contain `separator` are returned
    /// unchanged.
    pub fn unpack_leading_column(self, separator: char) -> Result<Self, RawTableError> {
        let Some(first) = self.headers.first() else {
            return Err(RawTableError::NoColumns);
        };
        if !first.contains(separator) {
            return Ok(self);
        }
        let packed_names = first
            .split(separator)
            .map(|s| s.trim().to_string())
            .collect::<Vec<_>>();
        let width = packed_names.len();
        let mut headers = packed_names;
        headers.extend(self.headers.iter().skip(1).cloned());

        let mut rows = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.into_iter().enumerate() {
            let mut cells = row.into_iter();
            let packed = cells.next().unwrap_or_default();
            let mut unpacked = packed
                .split(separator)
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>();
            if unpacked.len() != width {
                return Err(RawTableError::RaggedRow {
                    row: idx + 1,
                    expected: headers.len(),
                    found: headers.len() - width + unpacked.len(),
                });
            }
            unpacked.extend(cells);
            rows.push(unpacked);
        }
        Self::new(headers, rows)
    }
}
