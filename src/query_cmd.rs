//! `query` and `facets` commands over a table store.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::{debug, info};
use serde_json::json;

use crate::{
    band::{BandAggregation, BandMapping, UnmappedCodes},
    cli::{FacetsArgs, QueryArgs},
    labels::{COUNTRY_NAME_FIELD, label_for},
    model::{GEO, NormalizedTable, VALUE, YEAR},
    query::{QueryOutcome, TableQuery, TableStore, YearFilter},
    table::{self, NO_DATA},
};

pub fn execute(args: &QueryArgs) -> Result<()> {
    let store = TableStore::new(&args.store);
    let query = build_query(args)?;
    debug!("Querying '{}' with {:?}", args.table, query);
    let outcome = store
        .query(&args.table, &query)
        .with_context(|| format!("Querying table '{}'", args.table))?;

    let result = match outcome {
        QueryOutcome::Absent => {
            info!("Table '{}' has not been loaded", args.table);
            None
        }
        QueryOutcome::Empty { .. } => None,
        QueryOutcome::Rows(table) => match build_aggregation(args)? {
            Some(aggregation) => Some(aggregation.aggregate(&table)?),
            None => Some(table),
        },
    }
    .filter(|table| !table.is_empty());

    let labels = if args.labels {
        Some(
            store
                .lookup(&args.labels_table)
                .with_context(|| format!("Reading labels table '{}'", args.labels_table))?,
        )
    } else {
        None
    };

    match result {
        Some(table) if args.json => println!("{}", records_json(&table, labels.as_ref())),
        Some(table) => print!("{}", table::render_records(&table, labels.as_ref())),
        None if args.json => println!("[]"),
        None => println!("{NO_DATA}"),
    }
    Ok(())
}

pub fn execute_facets(args: &FacetsArgs) -> Result<()> {
    let store = TableStore::new(&args.store);
    match store.facets(&args.table)? {
        None => println!("{NO_DATA}"),
        Some(facets) if facets.records == 0 => println!("{NO_DATA}"),
        Some(facets) => {
            println!("records: {}", facets.records);
            if let Some((first, last)) = facets.years {
                println!("years: {first}-{last}");
            }
            println!("geo: {}", facets.geos.iter().join(", "));
        }
    }
    Ok(())
}

pub fn build_query(args: &QueryArgs) -> Result<TableQuery> {
    let years = match (args.year, args.from, args.to, args.latest_at_or_before) {
        (Some(year), ..) => YearFilter::Exact(year),
        (None, None, None, Some(bound)) => YearFilter::LatestAtOrBefore(bound),
        (None, None, None, None) => YearFilter::Any,
        (None, from, to, _) => {
            let from = from.unwrap_or(i32::MIN);
            let to = to.unwrap_or(i32::MAX);
            if from > to {
                return Err(anyhow!("--from {from} is after --to {to}"));
            }
            YearFilter::Range { from, to }
        }
    };
    let geos = codes(&args.geos);
    let mut categories = BTreeMap::new();
    for filter in &args.filters {
        let (field, values) = filter
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid filter '{filter}' (expected field=code[,code...])"))?;
        let field = field.trim().to_ascii_lowercase();
        let values = codes(&values.split(',').map(str::to_string).collect::<Vec<_>>());
        if field.is_empty() || values.is_empty() {
            return Err(anyhow!("Invalid filter '{filter}' (expected field=code[,code...])"));
        }
        categories
            .entry(field)
            .or_insert_with(BTreeSet::new)
            .extend(values);
    }
    Ok(TableQuery {
        geos: (!geos.is_empty()).then_some(geos),
        years,
        categories,
    })
}

pub fn build_aggregation(args: &QueryArgs) -> Result<Option<BandAggregation>> {
    let Some(field) = &args.band else {
        return Ok(None);
    };
    let mappings = args
        .mappings
        .iter()
        .map(|spec| BandMapping::parse(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let mut retain = codes(&args.retain);
    if retain.is_empty() {
        retain = mappings
            .iter()
            .flat_map(|m| m.sources.iter().cloned())
            .collect();
    }
    Ok(Some(BandAggregation {
        field: field.trim().to_ascii_lowercase(),
        mappings,
        retain,
        unmapped: if args.drop_unmapped {
            UnmappedCodes::Drop
        } else {
            UnmappedCodes::PassThrough
        },
    }))
}

fn codes(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn records_json(table: &NormalizedTable, labels: Option<&BTreeMap<String, String>>) -> String {
    let records = table
        .records
        .iter()
        .map(|record| {
            let mut object = serde_json::Map::new();
            for (name, cell) in table.identifier_names.iter().zip(&record.identifiers) {
                object.insert(name.clone(), json!(cell));
            }
            if let (Some(labels), Some(geo)) = (labels, table.field(record, GEO)) {
                object.insert(
                    COUNTRY_NAME_FIELD.to_string(),
                    json!(label_for(labels, geo)),
                );
            }
            object.insert(YEAR.to_string(), json!(record.year));
            object.insert(VALUE.to_string(), json!(record.value));
            serde_json::Value::Object(object)
        })
        .collect::<Vec<_>>();
    serde_json::Value::Array(records).to_string()
}
