//! Multi-dataset runs: fetch → normalize → replace in sink, one dataset at a
//! time. A failing dataset is logged and skipped; its siblings still load.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cli::NormalizeArgs,
    config::{DatasetSpec, LabelsConfig, PipelineConfig},
    fetch::{DirectoryFetcher, Fetch, FetchError},
    identifiers::NormalizeError,
    io_utils,
    labels::country_codes_table,
    normalize::normalize,
    sink::{CsvDirectorySink, Sink, SinkError},
};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),
}

impl DatasetError {
    pub fn stage(&self) -> &'static str {
        match self {
            DatasetError::Fetch(_) => "fetch",
            DatasetError::Normalize(_) => "normalize",
            DatasetError::Sink(_) => "sink",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedDataset {
    pub name: String,
    pub code: String,
    pub records: usize,
    pub year_columns: usize,
    pub missing_values: usize,
    pub dropped_incomplete: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDataset {
    pub name: String,
    pub code: String,
    pub stage: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub loaded: Vec<LoadedDataset>,
    pub skipped: Vec<SkippedDataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
}

impl RunSummary {
    pub fn all_failed(&self) -> bool {
        self.loaded.is_empty() && !self.skipped.is_empty()
    }
}

pub fn process_dataset<F, S>(
    dataset: &DatasetSpec,
    fetcher: &F,
    sink: &mut S,
) -> Result<LoadedDataset, DatasetError>
where
    F: Fetch + ?Sized,
    S: Sink + ?Sized,
{
    let raw = fetcher.fetch(&dataset.code)?;
    let normalized = normalize(&raw)?;
    let report = &normalized.report;
    if report.classification_failed() {
        warn!(
            "Dataset {} ({}) has no year columns; loading an empty table",
            dataset.name, dataset.code
        );
    }
    sink.replace(&dataset.name, &normalized.table)?;
    Ok(LoadedDataset {
        name: dataset.name.clone(),
        code: dataset.code.clone(),
        records: normalized.table.len(),
        year_columns: report.year_columns,
        missing_values: report.coercion.missing_values,
        dropped_incomplete: report.dropped_incomplete,
    })
}

pub fn run_datasets<F, S>(datasets: &[DatasetSpec], fetcher: &F, sink: &mut S) -> RunSummary
where
    F: Fetch + ?Sized,
    S: Sink + ?Sized,
{
    let started_at = Utc::now();
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();
    for dataset in datasets {
        info!("Fetching dataset: {} ({})...", dataset.name, dataset.code);
        match process_dataset(dataset, fetcher, sink) {
            Ok(outcome) => {
                info!(
                    "Dataset {} processed: {} record(s) loaded, {} incomplete row(s) dropped",
                    outcome.name, outcome.records, outcome.dropped_incomplete
                );
                loaded.push(outcome);
            }
            Err(err) => {
                error!("Error processing {} ({}): {err}", dataset.name, dataset.code);
                skipped.push(SkippedDataset {
                    name: dataset.name.clone(),
                    code: dataset.code.clone(),
                    stage: err.stage().to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }
    RunSummary {
        started_at,
        finished_at: Utc::now(),
        loaded,
        skipped,
        labels: None,
    }
}

pub fn load_labels<S: Sink + ?Sized>(sink: &mut S, labels: &LabelsConfig) -> Result<usize, SinkError> {
    let entries = labels.resolved_entries();
    let count = entries.len();
    sink.replace_lookup(&country_codes_table(&labels.name, entries))?;
    Ok(count)
}

pub fn execute(args: &NormalizeArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)
        .with_context(|| format!("Loading configuration from {:?}", args.config))?;
    let datasets = config.select(&args.datasets)?;
    let encoding = io_utils::resolve_encoding(config.input_encoding.as_deref())?;
    let fetcher = DirectoryFetcher::new(&config.source_dir, config.delimiter_byte()?, encoding);
    let mut sink = CsvDirectorySink::new(&config.sink_dir);
    info!(
        "Starting run over {} dataset(s): {:?} -> {:?}",
        datasets.len(),
        config.source_dir,
        config.sink_dir
    );

    let mut summary = run_datasets(&datasets, &fetcher, &mut sink);

    let labels = config.labels_or_default();
    match load_labels(&mut sink, &labels) {
        Ok(count) => {
            info!("Loaded {count} label(s) into '{}'", labels.name);
            summary.labels = Some(labels.name.clone());
        }
        Err(err) => error!("Failed to load labels table '{}': {err}", labels.name),
    }
    summary.finished_at = Utc::now();

    if let Some(path) = &args.summary {
        write_summary(path, &summary)?;
    }
    info!(
        "Run finished: {} dataset(s) loaded, {} skipped",
        summary.loaded.len(),
        summary.skipped.len()
    );
    if summary.all_failed() {
        bail!("All {} dataset(s) failed", summary.skipped.len());
    }
    Ok(())
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating summary file {path:?}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary).context("Writing run summary JSON")
}
