//! Dashboard aggregation
//!
//! Counts over the working copy, optionally narrowed to an upload-date
//! window and a single location.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;

use super::{
    audit_record::{AuditRecord, AuditStatus},
    errors::DomainError,
    filter::LocationFilter,
};

/// Format of the backend's `UploadDate` column
pub const UPLOAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const UNKNOWN: &str = "Unknown";

/// Upload-date window for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    All,
    Last30Days,
    Last90Days,
    LastYear,
}

impl TimeRange {
    fn span(&self) -> Option<Duration> {
        match self {
            TimeRange::All => None,
            TimeRange::Last30Days => Some(Duration::days(30)),
            TimeRange::Last90Days => Some(Duration::days(90)),
            TimeRange::LastYear => Some(Duration::days(365)),
        }
    }

    /// Whether a record falls inside the window ending at `now`
    pub fn contains(&self, record: &AuditRecord, now: NaiveDateTime) -> bool {
        let Some(span) = self.span() else {
            return true;
        };
        record
            .upload_date()
            .and_then(|raw| NaiveDateTime::parse_from_str(raw.trim(), UPLOAD_DATE_FORMAT).ok())
            .is_some_and(|uploaded| uploaded >= now - span)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeRange::All => "all",
            TimeRange::Last30Days => "last30",
            TimeRange::Last90Days => "last90",
            TimeRange::LastYear => "last-year",
        })
    }
}

impl FromStr for TimeRange {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TimeRange::All),
            "last30" | "last-30" | "30d" => Ok(TimeRange::Last30Days),
            "last90" | "last-90" | "90d" => Ok(TimeRange::Last90Days),
            "last-year" | "lastyear" | "year" => Ok(TimeRange::LastYear),
            other => Err(DomainError::ValidationFailed(format!(
                "Unknown time range: {other} (expected all, last30, last90 or last-year)"
            ))),
        }
    }
}

/// One bucket of a grouped count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

/// Aggregated figures for one dashboard view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSummary {
    pub range: TimeRange,
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    /// Percent of closed records, 0 for an empty selection
    pub closure_rate: f64,
    pub by_location: Vec<GroupCount>,
    pub by_classification: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
}

impl AuditSummary {
    pub fn compute(records: &[AuditRecord], range: TimeRange, location: &LocationFilter) -> Self {
        Self::compute_at(records, range, location, Local::now().naive_local())
    }

    /// Same as [`AuditSummary::compute`] with an explicit reference time
    pub fn compute_at(
        records: &[AuditRecord],
        range: TimeRange,
        location: &LocationFilter,
        now: NaiveDateTime,
    ) -> Self {
        let selected: Vec<&AuditRecord> = records
            .iter()
            .filter(|r| location.accepts(r) && range.contains(r, now))
            .collect();

        let total = selected.len();
        let closed = selected
            .iter()
            .filter(|r| r.status() == AuditStatus::Closed)
            .count();
        let open = total - closed;
        let closure_rate = if total == 0 {
            0.0
        } else {
            closed as f64 * 100.0 / total as f64
        };

        Self {
            range,
            total,
            open,
            closed,
            closure_rate,
            by_location: group(&selected, |r| r.location().map(str::to_string)),
            by_classification: group(&selected, |r| r.classification().map(|c| c.to_string())),
            by_status: group(&selected, |r| Some(r.status().to_string())),
        }
    }
}

/// Counts per key, sorted by count descending then name
fn group<F>(records: &[&AuditRecord], key: F) -> Vec<GroupCount>
where
    F: Fn(&AuditRecord) -> Option<String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        let name = key(record)
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());
        *counts.entry(name).or_default() += 1;
    }

    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(name, count)| GroupCount { name, count })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    groups
}
