mod common;

use std::collections::BTreeSet;

use encoding_rs::UTF_8;
use eurostat_longform::{
    band::{BandAggregation, BandError, BandMapping, UnmappedCodes},
    fetch::read_raw_table,
    model::{NormalizedRecord, NormalizedTable},
    normalize::normalize,
};

use common::fixture_path;

fn codes(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn single_field_table(rows: &[(&str, f64)]) -> NormalizedTable {
    NormalizedTable {
        identifier_names: vec!["geo".into(), "age".into(), "sex".into()],
        records: rows
            .iter()
            .map(|(age, value)| NormalizedRecord {
                identifiers: vec![Some("IT".into()), Some(age.to_string()), Some("T".into())],
                year: 2022,
                value: *value,
            })
            .collect(),
    }
}

fn summarize(table: &NormalizedTable) -> Vec<(String, String, i32, f64)> {
    table
        .records
        .iter()
        .map(|r| {
            (
                table.field(r, "geo").unwrap_or_default().to_string(),
                table.field(r, "age").unwrap_or_default().to_string(),
                r.year,
                r.value,
            )
        })
        .collect()
}

#[test]
fn retained_unmapped_code_is_dropped_under_drop_policy() {
    let table = single_field_table(&[("A", 10.0), ("B", 20.0), ("C", 30.0)]);
    let aggregation = BandAggregation {
        field: "age".into(),
        mappings: vec![BandMapping::new("X", ["A", "B"])],
        retain: codes(&["A", "B", "C"]),
        unmapped: UnmappedCodes::Drop,
    };

    let banded = aggregation.aggregate(&table).expect("aggregate");

    assert_eq!(summarize(&banded), vec![("IT".into(), "X".into(), 2022, 15.0)]);
}

#[test]
fn retained_unmapped_code_passes_through_by_default() {
    let table = single_field_table(&[("A", 10.0), ("C", 30.0), ("B", 20.0), ("D", 99.0)]);
    let aggregation = BandAggregation {
        field: "age".into(),
        mappings: vec![BandMapping::new("X", ["A", "B"])],
        retain: codes(&["A", "B", "C"]),
        unmapped: UnmappedCodes::default(),
    };

    let banded = aggregation.aggregate(&table).expect("aggregate");

    assert_eq!(
        summarize(&banded),
        vec![
            ("IT".into(), "X".into(), 2022, 15.0),
            ("IT".into(), "C".into(), 2022, 30.0),
        ]
    );
}

#[test]
fn poverty_fixture_folds_adult_bands_per_geo_and_year() {
    let raw = read_raw_table(&fixture_path("ilc_li02.csv"), None, UTF_8).expect("read fixture");
    let table = normalize(&raw).expect("normalize").table;
    let aggregation = BandAggregation {
        field: "age".into(),
        mappings: vec![BandMapping::parse("Y25-64=Y25-54,Y50-64").unwrap()],
        retain: codes(&["Y16-29", "Y25-54", "Y50-64"]),
        unmapped: UnmappedCodes::PassThrough,
    };

    let banded = aggregation.aggregate(&table).expect("aggregate");

    assert_eq!(banded.identifier_names, vec!["unit", "sex", "age", "geo"]);
    assert_eq!(
        summarize(&banded),
        vec![
            ("IT".into(), "Y16-29".into(), 2022, 25.0),
            ("IT".into(), "Y16-29".into(), 2021, 24.0),
            ("IT".into(), "Y25-64".into(), 2022, 17.0),
            ("IT".into(), "Y25-64".into(), 2021, 16.0),
            ("FR".into(), "Y16-29".into(), 2022, 21.0),
            ("FR".into(), "Y16-29".into(), 2021, 20.0),
            ("FR".into(), "Y25-64".into(), 2022, 11.5),
            ("FR".into(), "Y25-64".into(), 2021, 11.5),
        ]
    );
}

#[test]
fn mean_weights_each_contributing_row_equally() {
    let mut table = single_field_table(&[("A", 10.0), ("B", 40.0)]);
    // A second A row for the same geo and year: three rows feed band X.
    table.records.push(NormalizedRecord {
        identifiers: vec![Some("IT".into()), Some("A".into()), Some("T".into())],
        year: 2022,
        value: 10.0,
    });
    let aggregation = BandAggregation {
        field: "age".into(),
        mappings: vec![BandMapping::new("X", ["A", "B"])],
        retain: codes(&["A", "B"]),
        unmapped: UnmappedCodes::Drop,
    };

    let banded = aggregation.aggregate(&table).expect("aggregate");

    assert_eq!(summarize(&banded), vec![("IT".into(), "X".into(), 2022, 20.0)]);
}

#[test]
fn unknown_band_field_is_rejected() {
    let table = single_field_table(&[("A", 1.0)]);
    let aggregation = BandAggregation {
        field: "isced11".into(),
        mappings: vec![],
        retain: codes(&["A"]),
        unmapped: UnmappedCodes::PassThrough,
    };

    let err = aggregation.aggregate(&table).expect_err("unknown field");

    assert!(matches!(err, BandError::UnknownField(field) if field == "isced11"));
}

#[test]
fn a_source_code_cannot_map_to_two_targets() {
    let table = single_field_table(&[("A", 1.0)]);
    let aggregation = BandAggregation {
        field: "age".into(),
        mappings: vec![BandMapping::new("X", ["A"]), BandMapping::new("Y", ["A"])],
        retain: codes(&["A"]),
        unmapped: UnmappedCodes::PassThrough,
    };

    let err = aggregation.aggregate(&table).expect_err("conflict");

    assert!(matches!(err, BandError::ConflictingMapping { .. }));
}
