use std::collections::BTreeMap;

use eurostat_longform::{
    model::{NormalizedRecord, NormalizedTable},
    table::{render_records, render_table},
};

fn sample() -> NormalizedTable {
    NormalizedTable {
        identifier_names: vec!["geo".into(), "sex".into()],
        records: vec![
            NormalizedRecord {
                identifiers: vec![Some("IT".into()), Some("T".into())],
                year: 2021,
                value: 9.5,
            },
            NormalizedRecord {
                identifiers: vec![Some("XK".into()), None],
                year: 2022,
                value: 12.0,
            },
        ],
    }
}

#[test]
fn render_table_aligns_columns() {
    let headers = vec!["geo".to_string(), "value".to_string()];
    let rows = vec![
        vec!["IT".to_string(), "9.5".to_string()],
        vec!["EU27_2020".to_string(), "12".to_string()],
    ];

    let rendered = render_table(&headers, &rows);

    let expected = "geo        value\n---------  -----\nIT         9.5\nEU27_2020  12\n";
    assert_eq!(rendered, expected);
}

#[test]
fn render_table_replaces_control_whitespace() {
    let headers = vec!["label".to_string()];
    let rows = vec![vec!["Czech\tRepublic".to_string()]];

    let rendered = render_table(&headers, &rows);

    assert!(rendered.contains("Czech Republic"));
}

#[test]
fn render_records_prints_blank_for_missing_identifier() {
    let rendered = render_records(&sample(), None);

    let expected = "geo  sex  year  value\n---  ---  ----  -----\nIT   T    2021  9.5\nXK        2022  12\n";
    assert_eq!(rendered, expected);
}

#[test]
fn render_records_inserts_country_name_after_geo() {
    let mut labels = BTreeMap::new();
    labels.insert("IT".to_string(), "Italy".to_string());

    let rendered = render_records(&sample(), Some(&labels));

    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("geo  country_name  sex  year  value"));
    lines.next();
    assert_eq!(lines.next(), Some("IT   Italy         T    2021  9.5"));
    // Unknown codes fall back to the code itself.
    assert_eq!(lines.next(), Some("XK   XK                 2022  12"));
}

#[test]
fn render_records_reports_no_data_for_empty_table() {
    let table = NormalizedTable::new(vec!["geo".into()]);

    assert_eq!(render_records(&table, None), "No data\n");
}
