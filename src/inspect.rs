//! `inspect`: dry run of the normalization pass over one raw file.

use anyhow::{Context, Result};
use log::info;

use crate::{
    classify::classify,
    cli::InspectArgs,
    fetch::read_raw_table,
    identifiers::canonical_name,
    io_utils,
    model::NormalizedTable,
    normalize::normalize,
    table,
};

pub fn execute(args: &InspectArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    info!(
        "Inspecting '{}' with delimiter '{}'",
        args.input.display(),
        io_utils::printable_delimiter(delimiter)
    );
    let raw = read_raw_table(&args.input, Some(delimiter), encoding)
        .with_context(|| format!("Reading {:?}", args.input))?;

    let partition = classify(raw.headers());
    let mut rows = Vec::with_capacity(raw.headers().len());
    for column in &partition.identifiers {
        rows.push(vec![
            (column.index + 1).to_string(),
            column.header.clone(),
            "identifier".to_string(),
            canonical_name(&column.header),
        ]);
    }
    for column in &partition.years {
        rows.push(vec![
            (column.index + 1).to_string(),
            column.header.clone(),
            "year".to_string(),
            column.token.clone(),
        ]);
    }
    rows.sort_by_key(|row| row[0].parse::<usize>().unwrap_or_default());
    let headers = ["#", "header", "kind", "normalized"].map(String::from);
    print!("{}", table::render_table(&headers, &rows));

    let normalized = normalize(&raw).with_context(|| format!("Normalizing {:?}", args.input))?;
    let report = &normalized.report;
    println!();
    println!(
        "{} source row(s) x {} year column(s) = {} melted row(s); {} missing value(s); {} incomplete row(s) dropped; {} record(s)",
        report.source_rows,
        report.year_columns,
        report.melted_rows,
        report.coercion.missing_values,
        report.dropped_incomplete,
        normalized.table.len()
    );
    println!();
    let preview = NormalizedTable {
        identifier_names: normalized.table.identifier_names.clone(),
        records: normalized
            .table
            .records
            .into_iter()
            .take(args.rows)
            .collect(),
    };
    print!("{}", table::render_records(&preview, None));
    Ok(())
}
