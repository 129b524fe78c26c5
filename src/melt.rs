//! Wide → long reshaping.

use crate::{classify::ColumnPartition, raw::RawTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeltedRow {
    pub identifiers: Vec<String>,
    pub year: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeltedTable {
    pub identifier_names: Vec<String>,
    pub rows: Vec<MeltedRow>,
}

/// Emits one row per (input row, year column), row-major, with identifier
/// cells copied verbatim and `year` set to the year column's header.
pub fn melt(table: &RawTable, partition: &ColumnPartition) -> MeltedTable {
    let mut rows = Vec::with_capacity(table.row_count() * partition.years.len());
    for source in table.rows() {
        let identifiers = partition
            .identifiers
            .iter()
            .map(|column| source[column.index].clone())
            .collect::<Vec<_>>();
        for year in &partition.years {
            rows.push(MeltedRow {
                identifiers: identifiers.clone(),
                year: year.header.clone(),
                value: source[year.index].clone(),
            });
        }
    }
    MeltedTable {
        identifier_names: partition.identifier_headers(),
        rows,
    }
}
