//! Audits commands - browse, edit and import audit findings
//!
//! Every subcommand loads the working copy of one category first, then
//! operates on it through `AuditRecordStore`. Remote failures are shown by
//! the store's notifier; the command only adds the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::{debug, info};

use auditdesk_core::{
    domain::{
        AuditCategory, AuditRecord, AuditSummary, FileUpload, GroupCount, LocationFilter,
        RecordField, RecordId, Session, TimeRange,
    },
    usecases::{AuditRecordStore, EditOutcome},
};

use super::{store_error, Reported};
use crate::context::CliContext;
use crate::output::OutputFormatter;

/// Pause between attempts to resend an unconfirmed edit
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Longest observation text shown in a listing row
const OBSERVATION_WIDTH: usize = 60;

#[derive(Debug, Subcommand)]
pub enum AuditsCommand {
    /// List audit records, optionally filtered
    List {
        /// Audit category (internal or external)
        #[arg(long, short)]
        category: Option<AuditCategory>,
        /// Case-insensitive text matched against every field
        #[arg(long, short)]
        search: Option<String>,
        /// Only records at this location ("all" for every location)
        #[arg(long, short)]
        location: Option<String>,
    },
    /// Show every field of one record
    Show {
        /// Record ID
        #[arg(required_unless_present = "row")]
        id: Option<RecordId>,
        /// Row number from `audits list` instead of an ID
        #[arg(long, conflicts_with = "id")]
        row: Option<usize>,
        #[arg(long, short)]
        category: Option<AuditCategory>,
        /// Search used to number the rows
        #[arg(long, short)]
        search: Option<String>,
        /// Location used to number the rows
        #[arg(long, short)]
        location: Option<String>,
    },
    /// List the distinct locations of a category
    Locations {
        #[arg(long, short)]
        category: Option<AuditCategory>,
    },
    /// Change one field of a record and save it
    Edit {
        /// Record ID
        id: RecordId,
        /// Field name, e.g. RootCause or root_cause
        field: String,
        /// New value; dates as YYYY-MM-DD, empty to clear
        value: String,
        #[arg(long, short)]
        category: Option<AuditCategory>,
    },
    /// Upload an evidence file for a record and close it
    Evidence {
        /// Record ID
        id: RecordId,
        /// PDF, JPEG or PNG file
        file: PathBuf,
        #[arg(long, short)]
        category: Option<AuditCategory>,
    },
    /// Import a spreadsheet of findings
    Import {
        /// XLSX, XLS or CSV file
        file: PathBuf,
        #[arg(long, short)]
        category: Option<AuditCategory>,
    },
    /// Dashboard figures for a category
    Summary {
        #[arg(long, short)]
        category: Option<AuditCategory>,
        /// all, last30, last90 or last-year
        #[arg(long, short, default_value = "all")]
        range: TimeRange,
        /// Only records at this location
        #[arg(long, short)]
        location: Option<String>,
    },
    /// Show when the category was last imported
    LastUpload {
        #[arg(long, short)]
        category: Option<AuditCategory>,
    },
}

impl AuditsCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let session = ctx.require_session()?;

        match self {
            AuditsCommand::List {
                category,
                search,
                location,
            } => {
                let mut store = load_store(ctx, &session, *category).await?;
                let view = store.apply_filter(
                    search.clone().unwrap_or_default(),
                    LocationFilter::from_option(location.as_deref()),
                );
                print_records(ctx, &*fmt, &view)
            }
            AuditsCommand::Show {
                id,
                row,
                category,
                search,
                location,
            } => {
                let mut store = load_store(ctx, &session, *category).await?;
                store.apply_filter(
                    search.clone().unwrap_or_default(),
                    LocationFilter::from_option(location.as_deref()),
                );
                let id = match (id, row) {
                    (Some(id), _) => *id,
                    (None, Some(row)) => {
                        let index = row
                            .checked_sub(1)
                            .context("Row numbers start at 1")?;
                        store.record_id_at(index)?
                    }
                    (None, None) => anyhow::bail!("Give a record ID or --row"),
                };
                let record = store
                    .record(id)
                    .with_context(|| format!("No record with ID {id}"))?;
                print_record(ctx, &*fmt, record)
            }
            AuditsCommand::Locations { category } => {
                let store = load_store(ctx, &session, *category).await?;
                if ctx.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "category": store.category(),
                        "locations": store.locations(),
                    }));
                } else if store.locations().is_empty() {
                    fmt.info("No locations recorded");
                } else {
                    for location in store.locations() {
                        fmt.info(location);
                    }
                }
                Ok(())
            }
            AuditsCommand::Edit {
                id,
                field,
                value,
                category,
            } => {
                let mut store = load_store(ctx, &session, *category).await?;
                info!(%id, field = %field, "Editing record");
                let outcome = store
                    .update_field(&session, *id, field, value)
                    .await
                    .map_err(store_error)?;
                settle(ctx, &*fmt, &mut store, &session, *id, outcome).await
            }
            AuditsCommand::Evidence { id, file, category } => {
                let upload = read_upload(file).await?;
                let mut store = load_store(ctx, &session, *category).await?;
                info!(%id, file = upload.file_name(), "Attaching evidence");
                let outcome = store
                    .attach_evidence(&session, *id, Some(upload))
                    .await
                    .map_err(store_error)?;
                settle(ctx, &*fmt, &mut store, &session, *id, outcome).await
            }
            AuditsCommand::Import { file, category } => {
                let upload = read_upload(file).await?;
                let category = category.unwrap_or(ctx.config().audits.default_category);
                let mut store = ctx.audit_store(Some(category))?;
                let report = store
                    .import_file(&session, upload, category)
                    .await
                    .map_err(store_error)?;

                if ctx.is_json() {
                    fmt.print_json(&serde_json::to_value(&report)?);
                } else {
                    if let Some(count) = report.summary.count {
                        fmt.info(&format!("Rows imported: {count}"));
                    }
                    fmt.info(&format!(
                        "{} now holds {} records across {} locations",
                        category, report.load.records, report.load.locations
                    ));
                }
                Ok(())
            }
            AuditsCommand::Summary {
                category,
                range,
                location,
            } => {
                let mut store = load_store(ctx, &session, *category).await?;
                store.apply_filter("", LocationFilter::from_option(location.as_deref()));
                let summary = store.summary(*range);
                print_summary(ctx, &*fmt, store.category(), &summary)
            }
            AuditsCommand::LastUpload { category } => {
                let mut store = ctx.audit_store(*category)?;
                let category = store.category();
                let date = store
                    .refresh_last_upload_date(&session)
                    .await
                    .map_err(store_error)?;

                if ctx.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "category": category,
                        "last_upload_date": date,
                    }));
                } else {
                    match date {
                        Some(date) => fmt.info(&format!("Last {category} import: {date}")),
                        None => fmt.info(&format!("No {category} import recorded")),
                    }
                }
                Ok(())
            }
        }
    }
}

async fn load_store(
    ctx: &CliContext,
    session: &Session,
    category: Option<AuditCategory>,
) -> Result<AuditRecordStore> {
    let mut store = ctx.audit_store(category)?;
    let category = store.category();
    store.load(session, category).await.map_err(store_error)?;
    Ok(store)
}

async fn read_upload(path: &Path) -> Result<FileUpload> {
    FileUpload::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Reports an edit outcome, resending an unconfirmed save until it is
/// confirmed or out of attempts
async fn settle(
    ctx: &CliContext,
    fmt: &dyn OutputFormatter,
    store: &mut AuditRecordStore,
    session: &Session,
    id: RecordId,
    outcome: EditOutcome,
) -> Result<()> {
    let error = match outcome {
        EditOutcome::Unchanged => {
            if ctx.is_json() {
                fmt.print_json(&serde_json::json!({ "id": id, "changed": false }));
            } else {
                fmt.info(&format!("Record {id} already has that value; nothing sent"));
            }
            return Ok(());
        }
        EditOutcome::Confirmed(_) => return report_saved(ctx, fmt, store, id),
        EditOutcome::Unconfirmed { error, .. } => error,
    };

    loop {
        tokio::time::sleep(RETRY_DELAY).await;
        let report = store.reconcile(session).await;
        debug!(
            confirmed = report.confirmed.len(),
            failed = report.failed.len(),
            "Reconcile pass"
        );
        if store.unresolved().is_empty() {
            return report_saved(ctx, fmt, store, id);
        }
        if report.failed.is_empty() {
            break;
        }
    }

    // The store has already reported the failed save and the abandonment
    Err(Reported(error).into())
}

fn report_saved(
    ctx: &CliContext,
    fmt: &dyn OutputFormatter,
    store: &AuditRecordStore,
    id: RecordId,
) -> Result<()> {
    if ctx.is_json() {
        fmt.print_json(&serde_json::json!({
            "id": id,
            "changed": true,
            "record": store.record(id),
        }));
    } else {
        fmt.success(&format!("Record {id} saved"));
        if let Some(record) = store.record(id) {
            fmt.info(&format!("Status: {}", record.status()));
        }
    }
    Ok(())
}

fn print_records(ctx: &CliContext, fmt: &dyn OutputFormatter, records: &[&AuditRecord]) -> Result<()> {
    if ctx.is_json() {
        fmt.print_json(&serde_json::json!({
            "count": records.len(),
            "records": records,
        }));
        return Ok(());
    }

    if records.is_empty() {
        fmt.info("No matching records");
        return Ok(());
    }

    fmt.info(&format!(
        "{:>4}  {:>6}  {:<16}  {:<7}  {:<14}  {}",
        "#", "ID", "Location", "Status", "Class", "Observation"
    ));
    for (row, record) in records.iter().enumerate() {
        fmt.info(&format!(
            "{:>4}  {:>6}  {:<16}  {:<7}  {:<14}  {}",
            row + 1,
            record.id().map(|id| id.to_string()).unwrap_or_default(),
            record.location().unwrap_or("-"),
            record.status().to_string(),
            record
                .classification()
                .map(|c| c.to_string())
                .unwrap_or_default(),
            truncate(record.observation().unwrap_or(""), OBSERVATION_WIDTH),
        ));
    }
    fmt.info(&format!("{} record(s)", records.len()));
    Ok(())
}

fn print_record(ctx: &CliContext, fmt: &dyn OutputFormatter, record: &AuditRecord) -> Result<()> {
    if ctx.is_json() {
        fmt.print_json(&serde_json::to_value(record)?);
        return Ok(());
    }

    fmt.success(&format!("Record {}", record.label()));
    for field in RecordField::ALL {
        let value = record.field_text(field).unwrap_or_default();
        fmt.info(&format!("{:<24} {}", field.wire_name(), value));
    }
    if let Some(uploaded) = record.upload_date() {
        fmt.info(&format!("{:<24} {}", "UploadDate", uploaded));
    }
    Ok(())
}

fn print_summary(
    ctx: &CliContext,
    fmt: &dyn OutputFormatter,
    category: AuditCategory,
    summary: &AuditSummary,
) -> Result<()> {
    if ctx.is_json() {
        let mut json = serde_json::to_value(summary)?;
        json["category"] = serde_json::json!(category);
        fmt.print_json(&json);
        return Ok(());
    }

    fmt.success(&format!("{category} audits, range {}", summary.range));
    fmt.info(&format!("Total:        {}", summary.total));
    fmt.info(&format!("Open:         {}", summary.open));
    fmt.info(&format!("Closed:       {}", summary.closed));
    fmt.info(&format!("Closure rate: {:.1}%", summary.closure_rate));
    print_groups(fmt, "By location", &summary.by_location);
    print_groups(fmt, "By classification", &summary.by_classification);
    print_groups(fmt, "By status", &summary.by_status);
    Ok(())
}

fn print_groups(fmt: &dyn OutputFormatter, heading: &str, groups: &[GroupCount]) {
    if groups.is_empty() {
        return;
    }
    fmt.info("");
    fmt.info(&format!("{heading}:"));
    for group in groups {
        fmt.info(&format!("  {:<24} {}", group.name, group.count));
    }
}

/// Cuts `text` to at most `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: AuditsCommand,
    }

    fn parse(args: &[&str]) -> AuditsCommand {
        let mut argv = vec!["audits"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("Fire exit blocked", 60), "Fire exit blocked");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Überprüfung fehlt", 8), "Überp...");
    }

    #[test]
    fn test_parse_list_filters() {
        match parse(&["list", "--category", "external", "--location", "Plant A"]) {
            AuditsCommand::List {
                category, location, ..
            } => {
                assert_eq!(category, Some(AuditCategory::External));
                assert_eq!(location.as_deref(), Some("Plant A"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_edit() {
        match parse(&["edit", "12", "root_cause", "Missed PM"]) {
            AuditsCommand::Edit { id, field, value, .. } => {
                assert_eq!(id, RecordId::new(12));
                assert_eq!(field, "root_cause");
                assert_eq!(value, "Missed PM");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_category_and_id() {
        assert!(Harness::try_parse_from(["audits", "list", "--category", "supplier"]).is_err());
        assert!(Harness::try_parse_from(["audits", "edit", "abc", "Status", "Closed"]).is_err());
    }

    #[test]
    fn test_parse_summary_range_defaults_to_all() {
        match parse(&["summary"]) {
            AuditsCommand::Summary { range, .. } => assert_eq!(range, TimeRange::All),
            other => panic!("unexpected command: {other:?}"),
        }
        match parse(&["summary", "--range", "last90"]) {
            AuditsCommand::Summary { range, .. } => assert_eq!(range, TimeRange::Last90Days),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_show_needs_id_or_row() {
        assert!(Harness::try_parse_from(["audits", "show"]).is_err());
        match parse(&["show", "--row", "2"]) {
            AuditsCommand::Show { id, row, .. } => {
                assert!(id.is_none());
                assert_eq!(row, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
