//! Record filtering
//!
//! Pure functions over a slice of records. The display view is always
//! recomputed from the full working copy, so filters never compound.

use std::collections::HashSet;
use std::fmt;

use super::audit_record::AuditRecord;

/// Location constraint of a view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LocationFilter {
    #[default]
    All,
    Only(String),
}

impl LocationFilter {
    /// `None`, an empty string, `All` and `All Plants` mean no constraint
    pub fn from_option(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => LocationFilter::All,
            Some(v) if v.eq_ignore_ascii_case("all") || v.eq_ignore_ascii_case("all plants") => {
                LocationFilter::All
            }
            Some(v) => LocationFilter::Only(v.to_string()),
        }
    }

    pub fn accepts(&self, record: &AuditRecord) -> bool {
        match self {
            LocationFilter::All => true,
            LocationFilter::Only(location) => record.location() == Some(location.as_str()),
        }
    }
}

impl fmt::Display for LocationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationFilter::All => f.write_str("All"),
            LocationFilter::Only(location) => f.write_str(location),
        }
    }
}

/// Search term plus location constraint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub search: String,
    pub location: LocationFilter,
}

impl RecordFilter {
    pub fn new(search: impl Into<String>, location: LocationFilter) -> Self {
        Self {
            search: search.into(),
            location,
        }
    }

    pub fn accepts(&self, record: &AuditRecord) -> bool {
        self.location.accepts(record) && record.matches_search(&self.search)
    }

    /// Matching records in working-copy order
    pub fn apply<'a>(&self, records: &'a [AuditRecord]) -> Vec<&'a AuditRecord> {
        records.iter().filter(|r| self.accepts(r)).collect()
    }
}

/// Distinct non-empty locations in first-seen order
pub fn location_index(records: &[AuditRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.location())
        .filter(|loc| !loc.is_empty())
        .filter(|loc| seen.insert(*loc))
        .map(str::to_string)
        .collect()
}
