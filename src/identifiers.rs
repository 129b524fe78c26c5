//! Identifier column name canonicalization and geography resolution.
//!
//! Source headers vary per dataset (`GEO`, `geo\time`, `geo\TIME_PERIOD`,
//! `geopolitical_entity`). Every name is reduced to a lower-case canonical
//! form and exactly one column is resolved as `geo`.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::model::GEO;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("No identifier column resolves to 'geo' (columns: {columns:?})")]
    GeographyUnresolved { columns: Vec<String> },
    #[error("Columns '{first}' and '{second}' both normalize to '{canonical}'")]
    DuplicateIdentifier {
        first: String,
        second: String,
        canonical: String,
    },
    #[error("Identifier column '{0}' collides with a reserved field name")]
    ReservedName(String),
}

/// How the geography column was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoMatch {
    /// A column was already named `geo` once canonicalized.
    Exact,
    /// The first column whose canonical name contains `geo`.
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoResolution {
    pub index: usize,
    pub source: String,
    pub matched: GeoMatch,
}

fn time_axis_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\\time(_period)?$").expect("time-axis marker pattern"))
}

/// Lower-cases, strips one trailing `\time` / `\time_period` marker and maps
/// remaining non-alphanumeric characters to `_`.
pub fn canonical_name(header: &str) -> String {
    let lowered = header.trim().to_ascii_lowercase();
    let stripped = time_axis_marker().replace(&lowered, "");
    stripped
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect()
}

/// Ranked search for the geography column: an exact canonical `geo` first,
/// then the first name containing `geo`.
pub fn resolve_geography(names: &[String]) -> Result<GeoResolution, NormalizeError> {
    let candidates = [
        (GeoMatch::Exact, names.iter().position(|n| n == GEO)),
        (GeoMatch::Contains, names.iter().position(|n| n.contains(GEO))),
    ];
    candidates
        .into_iter()
        .find_map(|(matched, index)| {
            index.map(|index| GeoResolution {
                index,
                source: names[index].clone(),
                matched,
            })
        })
        .ok_or_else(|| NormalizeError::GeographyUnresolved {
            columns: names.to_vec(),
        })
}

/// Canonicalizes every identifier header and renames the resolved geography
/// column to `geo`. Returns the canonical names in source order.
pub fn normalize_identifier_names(
    headers: &[String],
) -> Result<(Vec<String>, GeoResolution), NormalizeError> {
    let mut names = headers
        .iter()
        .map(|h| canonical_name(h))
        .collect::<Vec<_>>();
    let resolution = resolve_geography(&names)?;
    names[resolution.index] = GEO.to_string();

    for (idx, name) in names.iter().enumerate() {
        if name == crate::model::YEAR || name == crate::model::VALUE {
            return Err(NormalizeError::ReservedName(headers[idx].clone()));
        }
        if let Some(prev) = names[..idx].iter().position(|other| other == name) {
            return Err(NormalizeError::DuplicateIdentifier {
                first: headers[prev].clone(),
                second: headers[idx].clone(),
                canonical: name.clone(),
            });
        }
    }
    Ok((names, resolution))
}
