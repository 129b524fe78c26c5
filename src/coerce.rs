//! Year/value coercion with an explicit missing marker.
//!
//! Unparseable cells become `None`; nothing is dropped here. Dropping belongs
//! to [`crate::complete`].

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    classify::strip_value_axis_suffix,
    melt::MeltedTable,
    model::{MAX_YEAR, MIN_YEAR},
};

#[derive(Debug, Clone, PartialEq)]
pub struct CoercedRow {
    pub identifiers: Vec<Option<String>>,
    pub year: Option<i32>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoercionStats {
    pub missing_years: usize,
    pub missing_values: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoercedTable {
    pub identifier_names: Vec<String>,
    pub rows: Vec<CoercedRow>,
    pub stats: CoercionStats,
}

fn numeric_literal() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("numeric literal pattern")
    })
}

/// Parses a decimal or integer literal. Placeholders (`:`), flagged cells
/// (`10.5 p`), `nan`/`inf` and blanks are missing.
pub fn coerce_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if !numeric_literal().is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a year header or cell into a four-digit calendar year.
pub fn coerce_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    let token = if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        trimmed
    } else {
        strip_value_axis_suffix(trimmed)
    };
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token
        .parse::<i32>()
        .ok()
        .filter(|year| (MIN_YEAR..=MAX_YEAR).contains(year))
}

pub fn coerce_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn coerce(melted: MeltedTable) -> CoercedTable {
    let mut stats = CoercionStats::default();
    let rows = melted
        .rows
        .into_iter()
        .map(|row| {
            let year = coerce_year(&row.year);
            let value = coerce_value(&row.value);
            if year.is_none() {
                stats.missing_years += 1;
            }
            if value.is_none() {
                stats.missing_values += 1;
            }
            CoercedRow {
                identifiers: row
                    .identifiers
                    .iter()
                    .map(|cell| coerce_identifier(cell))
                    .collect(),
                year,
                value,
            }
        })
        .collect();
    CoercedTable {
        identifier_names: melted.identifier_names,
        rows,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melt::MeltedRow;

    #[test]
    fn decimal_and_integer_literals_parse() {
        assert_eq!(coerce_value("10.5"), Some(10.5));
        assert_eq!(coerce_value(" 11 "), Some(11.0));
        assert_eq!(coerce_value("-0.25"), Some(-0.25));
        assert_eq!(coerce_value("+3"), Some(3.0));
        assert_eq!(coerce_value(".5"), Some(0.5));
        assert_eq!(coerce_value("7."), Some(7.0));
        assert_eq!(coerce_value("1e3"), Some(1000.0));
    }

    #[test]
    fn placeholders_and_flags_are_missing() {
        for raw in [":", ": ", "", "10.5 p", "12 b", "n/a", "NaN", "inf", "-", "1,5"] {
            assert_eq!(coerce_value(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn years_must_be_four_digits() {
        assert_eq!(coerce_year("2021"), Some(2021));
        assert_eq!(coerce_year("2021 "), Some(2021));
        assert_eq!(coerce_year("2021 p"), Some(2021));
        assert_eq!(coerce_year("21"), None);
        assert_eq!(coerce_year("20211"), None);
        assert_eq!(coerce_year("02021"), None);
        assert_eq!(coerce_year("2021_2022"), None);
        assert_eq!(coerce_year("2021M01"), None);
        assert_eq!(coerce_year("geo"), None);
    }

    #[test]
    fn coercion_keeps_every_row_and_counts_anomalies() {
        let melted = MeltedTable {
            identifier_names: vec!["geo".into()],
            rows: vec![
                MeltedRow {
                    identifiers: vec!["IT".into()],
                    year: "2021".into(),
                    value: "1.5".into(),
                },
                MeltedRow {
                    identifiers: vec![" ".into()],
                    year: "2021".into(),
                    value: ":".into(),
                },
            ],
        };
        let coerced = coerce(melted);
        assert_eq!(coerced.rows.len(), 2);
        assert_eq!(coerced.rows[0].value, Some(1.5));
        assert_eq!(coerced.rows[1].identifiers, vec![None]);
        assert_eq!(coerced.rows[1].value, None);
        assert_eq!(
            coerced.stats,
            CoercionStats {
                missing_years: 0,
                missing_values: 1
            }
        );
    }
}
