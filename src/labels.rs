//! Eurostat geography codes and their English country names.

use std::collections::BTreeMap;

use crate::{model::GEO, sink::LookupTable};

pub const COUNTRY_CODES_TABLE: &str = "country_codes";
pub const COUNTRY_NAME_FIELD: &str = "country_name";

const EUROSTAT_GEO_LABELS: &[(&str, &str)] = &[
    ("AT", "Austria"),
    ("BE", "Belgium"),
    ("BG", "Bulgaria"),
    ("CH", "Switzerland"),
    ("CY", "Cyprus"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("EA20", "Euro area (20 countries)"),
    ("EE", "Estonia"),
    ("EL", "Greece"),
    ("ES", "Spain"),
    ("EU27_2020", "European Union (27 countries)"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("HR", "Croatia"),
    ("HU", "Hungary"),
    ("IE", "Ireland"),
    ("IS", "Iceland"),
    ("IT", "Italy"),
    ("LI", "Liechtenstein"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("ME", "Montenegro"),
    ("MK", "North Macedonia"),
    ("MT", "Malta"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("RS", "Serbia"),
    ("SE", "Sweden"),
    ("SI", "Slovenia"),
    ("SK", "Slovakia"),
    ("TR", "Türkiye"),
];

pub fn builtin_geo_labels() -> BTreeMap<String, String> {
    EUROSTAT_GEO_LABELS
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

pub fn country_codes_table(name: &str, entries: BTreeMap<String, String>) -> LookupTable {
    LookupTable {
        name: name.to_string(),
        key_field: GEO.to_string(),
        label_field: COUNTRY_NAME_FIELD.to_string(),
        entries,
    }
}

/// Label for a geography code, falling back to the code itself.
pub fn label_for<'a>(labels: &'a BTreeMap<String, String>, code: &'a str) -> &'a str {
    labels.get(code).map(String::as_str).unwrap_or(code)
}
