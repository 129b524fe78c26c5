//! Plain-text rendering of normalized tables for the terminal.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::{
    labels::{COUNTRY_NAME_FIELD, label_for},
    model::{GEO, NormalizedTable},
};

pub const NO_DATA: &str = "No data";

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// Renders records in stored column order. With `labels`, a `country_name`
/// column follows `geo`, falling back to the code for unknown geographies.
pub fn render_records(table: &NormalizedTable, labels: Option<&BTreeMap<String, String>>) -> String {
    if table.is_empty() {
        return format!("{NO_DATA}\n");
    }
    let geo_idx = table.identifier_index(GEO);
    let mut headers = table.headers();
    if let (Some(_), Some(idx)) = (labels, geo_idx) {
        headers.insert(idx + 1, COUNTRY_NAME_FIELD.to_string());
    }
    let rows = table
        .records
        .iter()
        .map(|record| {
            let mut row = table.render_row(record);
            if let (Some(labels), Some(idx)) = (labels, geo_idx) {
                let label = label_for(labels, &row[idx]).to_string();
                row.insert(idx + 1, label);
            }
            row
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
