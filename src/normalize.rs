//! One normalization pass over one raw table:
//! classify → melt → coerce → normalize identifiers → completeness filter.

use log::{debug, warn};

use crate::{
    classify::classify,
    coerce::{CoercionStats, coerce},
    complete::retain_complete,
    identifiers::{GeoResolution, NormalizeError, normalize_identifier_names},
    melt::melt,
    model::NormalizedTable,
    raw::RawTable,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    pub source_rows: usize,
    pub year_columns: usize,
    pub melted_rows: usize,
    pub coercion: CoercionStats,
    pub dropped_incomplete: usize,
    pub geography: GeoResolution,
}

impl NormalizeReport {
    /// No year columns were found, so the table is empty by construction.
    pub fn classification_failed(&self) -> bool {
        self.year_columns == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: NormalizedTable,
    pub report: NormalizeReport,
}

pub fn normalize(raw: &RawTable) -> Result<Normalized, NormalizeError> {
    let partition = classify(raw.headers());
    debug!(
        "Classified {} identifier column(s) and {} year column(s)",
        partition.identifiers.len(),
        partition.years.len()
    );
    if !partition.has_years() {
        warn!(
            "No year columns found among headers {:?}; dataset yields no records",
            raw.headers()
        );
    }

    let (identifier_names, geography) = normalize_identifier_names(&partition.identifier_headers())?;
    debug!(
        "Resolved geography column '{}' ({:?})",
        geography.source, geography.matched
    );

    let melted = melt(raw, &partition);
    let melted_rows = melted.rows.len();
    let coerced = coerce(melted);
    let coercion = coerced.stats;
    if coercion.missing_values > 0 || coercion.missing_years > 0 {
        debug!(
            "Coerced {} missing value(s) and {} missing year(s) to the missing marker",
            coercion.missing_values, coercion.missing_years
        );
    }
    let completed = retain_complete(coerced, identifier_names);

    Ok(Normalized {
        report: NormalizeReport {
            source_rows: raw.row_count(),
            year_columns: partition.years.len(),
            melted_rows,
            coercion,
            dropped_incomplete: completed.dropped,
            geography,
        },
        table: completed.table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tracks_every_stage() {
        let raw = RawTable::from_strs(
            &["geo\\time", "2020", "2021"],
            &[&["IT", "1", ":"], &["", "2", "3"]],
        )
        .unwrap();
        let normalized = normalize(&raw).unwrap();
        assert_eq!(normalized.table.len(), 1);
        let report = normalized.report;
        assert_eq!(report.source_rows, 2);
        assert_eq!(report.year_columns, 2);
        assert_eq!(report.melted_rows, 4);
        assert_eq!(report.coercion.missing_values, 1);
        assert_eq!(report.dropped_incomplete, 3);
        assert!(!report.classification_failed());
    }

    #[test]
    fn table_without_years_is_empty_not_an_error() {
        let raw = RawTable::from_strs(&["geo", "label"], &[&["IT", "Italy"]]).unwrap();
        let normalized = normalize(&raw).unwrap();
        assert!(normalized.table.is_empty());
        assert!(normalized.report.classification_failed());
        assert_eq!(normalized.table.identifier_names, vec!["geo", "label"]);
    }

    #[test]
    fn missing_geography_fails_the_dataset() {
        let raw = RawTable::from_strs(&["unit", "2020"], &[&["PC", "1"]]).unwrap();
        assert!(matches!(
            normalize(&raw),
            Err(NormalizeError::GeographyUnresolved { .. })
        ));
    }
}
