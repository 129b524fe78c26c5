//! Long-format records produced by the normalization pipeline.

use serde::Serialize;

pub const GEO: &str = "geo";
pub const YEAR: &str = "year";
pub const VALUE: &str = "value";

/// Smallest and largest year accepted once coerced (four digits).
pub const MIN_YEAR: i32 = 1000;
pub const MAX_YEAR: i32 = 9999;

/// One `(identifiers..., year, value)` tuple. Identifier cells are aligned with
/// the owning table's [`NormalizedTable::identifier_names`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub identifiers: Vec<Option<String>>,
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct NormalizedTable {
    pub identifier_names: Vec<String>,
    pub records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    pub fn new(identifier_names: Vec<String>) -> Self {
        Self {
            identifier_names,
            records: Vec::new(),
        }
    }

    pub fn identifier_index(&self, name: &str) -> Option<usize> {
        self.identifier_names.iter().position(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Identifier value of `record` for the named field, if the field exists
    /// and the cell is present.
    pub fn field<'a>(&self, record: &'a NormalizedRecord, name: &str) -> Option<&'a str> {
        self.identifier_index(name)
            .and_then(|idx| record.identifiers.get(idx))
            .and_then(|cell| cell.as_deref())
    }

    /// Column headers in stored order: identifiers, then `year`, then `value`.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.identifier_names.clone();
        headers.push(YEAR.to_string());
        headers.push(VALUE.to_string());
        headers
    }

    pub fn render_row(&self, record: &NormalizedRecord) -> Vec<String> {
        let mut row = record
            .identifiers
            .iter()
            .map(|cell| cell.clone().unwrap_or_default())
            .collect::<Vec<_>>();
        row.push(record.year.to_string());
        row.push(format_value(record.value));
        row
    }
}

/// Renders a value the way stored tables carry it: integral values without a
/// fractional part, everything else with the shortest round-tripping form.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}
