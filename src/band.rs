//! Query-time folding of fine category codes into coarser bands.
//!
//! Rows are filtered to a retained code set, remapped through the declared
//! [`BandMapping`]s and averaged per group. The mean is taken over contributing
//! rows, so a band backed by three source codes weighs each of its rows the
//! same as a band backed by one.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use crate::model::{NormalizedRecord, NormalizedTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BandError {
    #[error("Field '{0}' is not an identifier of this table")]
    UnknownField(String),
    #[error("Code '{code}' is mapped to both '{first}' and '{second}'")]
    ConflictingMapping {
        code: String,
        first: String,
        second: String,
    },
    #[error("Invalid band mapping '{0}' (expected TARGET=SOURCE[,SOURCE...])")]
    InvalidMapping(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMapping {
    pub target: String,
    pub sources: BTreeSet<String>,
}

impl BandMapping {
    pub fn new<I, S>(target: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses `Y25-64=Y25-54,Y50-64`.
    pub fn parse(spec: &str) -> Result<Self, BandError> {
        let (target, sources) = spec
            .split_once('=')
            .ok_or_else(|| BandError::InvalidMapping(spec.to_string()))?;
        let target = target.trim();
        let sources = sources
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>();
        if target.is_empty() || sources.is_empty() {
            return Err(BandError::InvalidMapping(spec.to_string()));
        }
        Ok(Self::new(target, sources))
    }
}

/// What happens to retained codes that no mapping mentions.
///
/// The default keeps them, the way the dashboard's `CASE … ELSE age END`
/// query does, so a retained but unmapped `C` still shows up as `C`. Folding
/// strictly to the declared bands (where `C` disappears) needs [`Self::Drop`],
/// exposed on the CLI as `--drop-unmapped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmappedCodes {
    /// Keep the code unchanged, aggregated under itself.
    #[default]
    PassThrough,
    /// Discard rows whose retained code has no mapping.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandAggregation {
    pub field: String,
    pub mappings: Vec<BandMapping>,
    pub retain: BTreeSet<String>,
    pub unmapped: UnmappedCodes,
}

impl BandAggregation {
    fn lookup(&self) -> Result<BTreeMap<&str, &str>, BandError> {
        let mut lookup = BTreeMap::new();
        for mapping in &self.mappings {
            for source in &mapping.sources {
                if let Some(previous) = lookup.insert(source.as_str(), mapping.target.as_str())
                    && previous != mapping.target
                {
                    return Err(BandError::ConflictingMapping {
                        code: source.clone(),
                        first: previous.to_string(),
                        second: mapping.target.clone(),
                    });
                }
            }
        }
        Ok(lookup)
    }

    /// Target code for a source code, or `None` when the row is dropped.
    fn band_for<'a>(&'a self, lookup: &BTreeMap<&str, &'a str>, code: &'a str) -> Option<&'a str> {
        if !self.retain.contains(code) {
            return None;
        }
        match lookup.get(code) {
            Some(target) => Some(*target),
            None => match self.unmapped {
                UnmappedCodes::PassThrough => Some(code),
                UnmappedCodes::Drop => None,
            },
        }
    }

    pub fn aggregate(&self, table: &NormalizedTable) -> Result<NormalizedTable, BandError> {
        let field_idx = table
            .identifier_index(&self.field)
            .ok_or_else(|| BandError::UnknownField(self.field.clone()))?;
        let lookup = self.lookup()?;

        // Key: every identifier cell with the remapped code in place, plus year.
        let mut groups: HashMap<(Vec<Option<String>>, i32), usize> = HashMap::new();
        let mut accumulators: Vec<(Vec<Option<String>>, i32, f64, usize)> = Vec::new();

        for record in &table.records {
            let Some(code) = record.identifiers[field_idx].as_deref() else {
                continue;
            };
            let Some(band) = self.band_for(&lookup, code) else {
                continue;
            };
            let mut identifiers = record.identifiers.clone();
            identifiers[field_idx] = Some(band.to_string());
            let key = (identifiers, record.year);
            match groups.get(&key) {
                Some(&slot) => {
                    let entry = &mut accumulators[slot];
                    entry.2 += record.value;
                    entry.3 += 1;
                }
                None => {
                    groups.insert(key.clone(), accumulators.len());
                    accumulators.push((key.0, key.1, record.value, 1));
                }
            }
        }

        let records = accumulators
            .into_iter()
            .map(|(identifiers, year, sum, count)| NormalizedRecord {
                identifiers,
                year,
                value: sum / count as f64,
            })
            .collect();
        Ok(NormalizedTable {
            identifier_names: table.identifier_names.clone(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str, i32, f64)]) -> NormalizedTable {
        NormalizedTable {
            identifier_names: vec!["geo".into(), "age".into()],
            records: rows
                .iter()
                .map(|(geo, age, year, value)| NormalizedRecord {
                    identifiers: vec![Some(geo.to_string()), Some(age.to_string())],
                    year: *year,
                    value: *value,
                })
                .collect(),
        }
    }

    fn retain(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn parse_mapping_spec() {
        let mapping = BandMapping::parse("Y25-64 = Y25-54, Y50-64").unwrap();
        assert_eq!(mapping.target, "Y25-64");
        assert_eq!(mapping.sources, retain(&["Y25-54", "Y50-64"]));
        assert!(BandMapping::parse("Y25-64").is_err());
        assert!(BandMapping::parse("=A").is_err());
        assert!(BandMapping::parse("X=").is_err());
    }

    #[test]
    fn unmapped_codes_pass_through_by_default() {
        let aggregation = BandAggregation {
            field: "age".into(),
            mappings: vec![BandMapping::new("X", ["A", "B"])],
            retain: retain(&["A", "B", "C"]),
            unmapped: UnmappedCodes::default(),
        };
        let out = aggregation
            .aggregate(&table(&[
                ("IT", "A", 2020, 10.0),
                ("IT", "B", 2020, 20.0),
                ("IT", "C", 2020, 30.0),
                ("IT", "D", 2020, 40.0),
            ]))
            .unwrap();
        assert_eq!(out, table(&[("IT", "X", 2020, 15.0), ("IT", "C", 2020, 30.0)]));
    }

    #[test]
    fn groups_are_split_by_other_fields_and_year() {
        let aggregation = BandAggregation {
            field: "age".into(),
            mappings: vec![BandMapping::new("X", ["A", "B"])],
            retain: retain(&["A", "B"]),
            unmapped: UnmappedCodes::Drop,
        };
        let out = aggregation
            .aggregate(&table(&[
                ("IT", "A", 2020, 1.0),
                ("FR", "A", 2020, 5.0),
                ("IT", "B", 2021, 2.0),
                ("IT", "B", 2020, 3.0),
            ]))
            .unwrap();
        assert_eq!(
            out,
            table(&[
                ("IT", "X", 2020, 2.0),
                ("FR", "X", 2020, 5.0),
                ("IT", "X", 2021, 2.0),
            ])
        );
    }

    #[test]
    fn missing_codes_are_dropped() {
        let mut input = table(&[("IT", "A", 2020, 1.0)]);
        input.records[0].identifiers[1] = None;
        let aggregation = BandAggregation {
            field: "age".into(),
            mappings: vec![],
            retain: retain(&["A"]),
            unmapped: UnmappedCodes::PassThrough,
        };
        assert!(aggregation.aggregate(&input).unwrap().is_empty());
    }

    #[test]
    fn unknown_field_and_conflicts_are_errors() {
        let mut aggregation = BandAggregation {
            field: "sex".into(),
            mappings: vec![],
            retain: retain(&["A"]),
            unmapped: UnmappedCodes::Drop,
        };
        assert_eq!(
            aggregation.aggregate(&table(&[])).unwrap_err(),
            BandError::UnknownField("sex".into())
        );

        aggregation.field = "age".into();
        aggregation.mappings = vec![BandMapping::new("X", ["A"]), BandMapping::new("Y", ["A"])];
        assert_eq!(
            aggregation.aggregate(&table(&[])).unwrap_err(),
            BandError::ConflictingMapping {
                code: "A".into(),
                first: "X".into(),
                second: "Y".into(),
            }
        );
    }
}
