//! Pipeline configuration.
//!
//! Built once at start-up from a YAML file plus environment overrides and
//! passed by reference to the fetch and sink collaborators. Nothing in the
//! normalization core reads configuration on its own.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    cli::parse_delimiter,
    labels::{COUNTRY_CODES_TABLE, builtin_geo_labels},
    sink::validate_table_name,
};

pub const SOURCE_DIR_ENV: &str = "EUROSTAT_SOURCE_DIR";
pub const SINK_DIR_ENV: &str = "EUROSTAT_SINK_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Logical table name in the sink.
    pub name: String,
    /// Source dataset code.
    pub code: String,
}

impl DatasetSpec {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelsConfig {
    #[serde(default = "default_labels_name")]
    pub name: String,
    /// Overrides or extends the built-in geography labels.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub include_builtin: bool,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            name: default_labels_name(),
            entries: BTreeMap::new(),
            include_builtin: true,
        }
    }
}

impl LabelsConfig {
    pub fn resolved_entries(&self) -> BTreeMap<String, String> {
        let mut entries = if self.include_builtin {
            builtin_geo_labels()
        } else {
            BTreeMap::new()
        };
        entries.extend(self.entries.clone());
        entries
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    pub source_dir: PathBuf,
    pub sink_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_encoding: Option<String>,
    #[serde(default = "default_datasets")]
    pub datasets: Vec<DatasetSpec>,
    #[serde(default)]
    pub labels: Option<LabelsConfig>,
}

fn default_labels_name() -> String {
    COUNTRY_CODES_TABLE.to_string()
}

fn default_true() -> bool {
    true
}

/// The tables the generational-gap dashboard reads.
pub fn default_datasets() -> Vec<DatasetSpec> {
    vec![
        DatasetSpec::new("unemployment", "une_rt_a"),
        DatasetSpec::new("poverty_risk", "ilc_li02"),
        DatasetSpec::new("leaving_home", "yth_demo_030"),
        DatasetSpec::new("housing_cost", "tessi161"),
    ]
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening config file {path:?}"))?;
        let mut config: PipelineConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replaces directories from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(SOURCE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.source_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(SINK_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.sink_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.datasets.is_empty(),
            "Configuration must list at least one dataset"
        );
        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            validate_table_name(&dataset.name)
                .with_context(|| format!("Dataset '{}' ({})", dataset.name, dataset.code))?;
            ensure!(
                !dataset.code.trim().is_empty(),
                "Dataset '{}' has an empty code",
                dataset.name
            );
            ensure!(
                seen.insert(dataset.name.as_str()),
                "Dataset name '{}' is listed more than once",
                dataset.name
            );
        }
        let labels = self.labels_or_default();
        validate_table_name(&labels.name).context("Labels table")?;
        ensure!(
            !seen.contains(labels.name.as_str()),
            "Labels table '{}' collides with a dataset name",
            labels.name
        );
        self.delimiter_byte()?;
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(|value| parse_delimiter(value).map_err(|err| anyhow!(err)))
            .transpose()
    }

    pub fn labels_or_default(&self) -> LabelsConfig {
        self.labels.clone().unwrap_or_default()
    }

    /// Restricts the run to the named datasets, keeping configuration order.
    pub fn select(&self, names: &[String]) -> Result<Vec<DatasetSpec>> {
        if names.is_empty() {
            return Ok(self.datasets.clone());
        }
        for name in names {
            ensure!(
                self.datasets.iter().any(|d| &d.name == name),
                "Unknown dataset '{name}'"
            );
        }
        Ok(self
            .datasets
            .iter()
            .filter(|d| names.contains(&d.name))
            .cloned()
            .collect())
    }
}
