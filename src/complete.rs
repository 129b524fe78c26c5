//! Completeness filter: a record without geo, year or value is unusable.

use crate::{
    coerce::CoercedTable,
    model::{GEO, NormalizedRecord, NormalizedTable},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub table: NormalizedTable,
    pub dropped: usize,
}

/// Keeps rows whose `geo`, `year` and `value` are present. Other identifier
/// cells may be missing.
pub fn retain_complete(coerced: CoercedTable, identifier_names: Vec<String>) -> Completed {
    let geo_idx = identifier_names.iter().position(|n| n == GEO);
    let mut table = NormalizedTable::new(identifier_names);
    let mut dropped = 0usize;
    for row in coerced.rows {
        let has_geo = geo_idx
            .and_then(|idx| row.identifiers.get(idx))
            .is_some_and(|cell| cell.is_some());
        match (has_geo, row.year, row.value) {
            (true, Some(year), Some(value)) => table.records.push(NormalizedRecord {
                identifiers: row.identifiers,
                year,
                value,
            }),
            _ => dropped += 1,
        }
    }
    Completed { table, dropped }
}
