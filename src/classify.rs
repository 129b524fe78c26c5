//! Column classification without a declared schema.
//!
//! A column is a year column iff its header, after trimming and removing one
//! trailing `<delimiter><suffix>` segment, is made of ASCII digits only. All
//! other columns are identifiers, kept in their original order.

/// Delimiters the source uses to attach a suffix to a value-axis header
/// (`2021 `, `2021 p`, `geo\time`, `2021_value`).
const VALUE_AXIS_DELIMITERS: &[char] = &[' ', '\\', '_'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierColumn {
    pub index: usize,
    pub header: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub index: usize,
    pub header: String,
    /// Digits left once the value-axis suffix is removed.
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Identifier,
    Year(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnPartition {
    pub identifiers: Vec<IdentifierColumn>,
    pub years: Vec<YearColumn>,
}

impl ColumnPartition {
    pub fn has_years(&self) -> bool {
        !self.years.is_empty()
    }

    pub fn identifier_headers(&self) -> Vec<String> {
        self.identifiers.iter().map(|c| c.header.clone()).collect()
    }
}

/// Removes exactly one trailing `<delimiter><suffix>` segment, after trimming.
/// Headers without a delimiter are returned trimmed. An all-digit suffix is
/// part of a period range (`2021_2022`), not a marker, and is kept.
pub fn strip_value_axis_suffix(header: &str) -> &str {
    let trimmed = header.trim();
    match trimmed.rsplit_once(VALUE_AXIS_DELIMITERS) {
        Some((head, tail)) if !head.is_empty() && !is_digits(tail) => head,
        _ => trimmed,
    }
}

pub fn classify_column(header: &str) -> ColumnKind {
    let trimmed = header.trim();
    if is_digits(trimmed) {
        return ColumnKind::Year(trimmed.to_string());
    }
    let stripped = strip_value_axis_suffix(trimmed);
    if is_digits(stripped) {
        ColumnKind::Year(stripped.to_string())
    } else {
        ColumnKind::Identifier
    }
}

pub fn classify<S: AsRef<str>>(headers: &[S]) -> ColumnPartition {
    let mut partition = ColumnPartition::default();
    for (index, header) in headers.iter().enumerate() {
        let header = header.as_ref();
        match classify_column(header) {
            ColumnKind::Identifier => partition.identifiers.push(IdentifierColumn {
                index,
                header: header.to_string(),
            }),
            ColumnKind::Year(token) => partition.years.push(YearColumn {
                index,
                header: header.to_string(),
                token,
            }),
        }
    }
    partition
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_tokens(partition: &ColumnPartition) -> Vec<&str> {
        partition.years.iter().map(|y| y.token.as_str()).collect()
    }

    #[test]
    fn plain_year_headers_are_value_columns() {
        let partition = classify(&["geo", "age", "sex", "unit", "2020", "2021"]);
        assert_eq!(
            partition.identifier_headers(),
            vec!["geo", "age", "sex", "unit"]
        );
        assert_eq!(year_tokens(&partition), vec!["2020", "2021"]);
        assert_eq!(partition.years[0].index, 4);
    }

    #[test]
    fn time_axis_suffixed_geography_is_an_identifier() {
        let partition = classify(&["unit", "geo\\time", "2022", "2021"]);
        assert_eq!(partition.identifier_headers(), vec!["unit", "geo\\time"]);
        assert_eq!(year_tokens(&partition), vec!["2022", "2021"]);
    }

    #[test]
    fn bulk_tsv_headers_with_trailing_space_are_years() {
        let partition = classify(&["geo", "2021 ", " 2020"]);
        assert_eq!(year_tokens(&partition), vec!["2021", "2020"]);
        assert_eq!(partition.years[0].header, "2021 ");
    }

    #[test]
    fn one_flag_suffix_is_stripped() {
        assert_eq!(classify_column("2021 p"), ColumnKind::Year("2021".into()));
        assert_eq!(classify_column("2021_value"), ColumnKind::Year("2021".into()));
        assert_eq!(classify_column("2021\\obs"), ColumnKind::Year("2021".into()));
    }

    #[test]
    fn period_ranges_are_identifiers() {
        assert_eq!(classify_column("2021_2022"), ColumnKind::Identifier);
        assert_eq!(classify_column("2019 2020"), ColumnKind::Identifier);
        assert_eq!(strip_value_axis_suffix("2021_2022"), "2021_2022");
    }

    #[test]
    fn only_one_suffix_is_removed() {
        assert_eq!(classify_column("2021 p b"), ColumnKind::Identifier);
    }

    #[test]
    fn non_numeric_and_period_headers_are_identifiers() {
        for header in ["geo", "TIME_PERIOD", "2021M01", "2021-Q1", "", " ", "_2021"] {
            assert_eq!(classify_column(header), ColumnKind::Identifier, "{header:?}");
        }
    }

    #[test]
    fn table_without_years_yields_empty_year_partition() {
        let partition = classify(&["geo", "country_name"]);
        assert!(!partition.has_years());
        assert_eq!(partition.identifiers.len(), 2);
    }

    #[test]
    fn strip_value_axis_suffix_keeps_undelimited_headers() {
        assert_eq!(strip_value_axis_suffix(" 2020 "), "2020");
        assert_eq!(strip_value_axis_suffix("geo\\time"), "geo");
        assert_eq!(strip_value_axis_suffix("\\time"), "\\time");
    }
}
