use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::labels::COUNTRY_CODES_TABLE;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize wide statistical tables into long format",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch, normalize, and load every configured dataset
    Normalize(NormalizeArgs),
    /// Show how a raw wide table is classified and what it normalizes to
    Inspect(InspectArgs),
    /// Query a loaded table with geography, year, and category filters
    Query(QueryArgs),
    /// List the geographies and year span available in a loaded table
    Facets(FacetsArgs),
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Pipeline configuration file (YAML)
    #[arg(short, long)]
    pub config: PathBuf,
    /// Restrict the run to these dataset names (repeatable)
    #[arg(short = 'd', long = "dataset", action = clap::ArgAction::Append)]
    pub datasets: Vec<String>,
    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Raw wide table (CSV or Eurostat TSV)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of normalized records to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Directory holding loaded tables
    #[arg(long)]
    pub store: PathBuf,
    /// Table name to query
    #[arg(short, long)]
    pub table: String,
    /// Geography codes to keep (comma-separated, repeatable)
    #[arg(long = "geo", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub geos: Vec<String>,
    /// Exact year
    #[arg(long, conflicts_with_all = ["from", "to", "latest_at_or_before"])]
    pub year: Option<i32>,
    /// First year of an inclusive range
    #[arg(long, conflicts_with = "latest_at_or_before")]
    pub from: Option<i32>,
    /// Last year of an inclusive range
    #[arg(long, conflicts_with = "latest_at_or_before")]
    pub to: Option<i32>,
    /// Most recent year present that is not after this one
    #[arg(long = "latest-at-or-before")]
    pub latest_at_or_before: Option<i32>,
    /// Category filters of the form `field=code[,code...]` (repeatable)
    #[arg(long = "where", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Identifier field to fold into coarser bands
    #[arg(long)]
    pub band: Option<String>,
    /// Band mappings of the form `TARGET=SOURCE[,SOURCE...]` (repeatable)
    #[arg(long = "map", action = clap::ArgAction::Append, requires = "band")]
    pub mappings: Vec<String>,
    /// Codes of the band field to keep before folding (comma-separated)
    #[arg(long, value_delimiter = ',', requires = "band")]
    pub retain: Vec<String>,
    /// Drop retained codes that no mapping covers instead of passing them through
    #[arg(long = "drop-unmapped", requires = "band")]
    pub drop_unmapped: bool,
    /// Add a country name column from the labels table
    #[arg(long)]
    pub labels: bool,
    /// Labels table name
    #[arg(long = "labels-table", default_value = COUNTRY_CODES_TABLE)]
    pub labels_table: String,
    /// Emit JSON instead of a text table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FacetsArgs {
    /// Directory holding loaded tables
    #[arg(long)]
    pub store: PathBuf,
    /// Table name to inspect
    #[arg(short, long)]
    pub table: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
