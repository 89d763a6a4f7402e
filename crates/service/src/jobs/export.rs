//! CSV export of completed service requests, run as a tracked background job.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use dashmap::DashMap;
use models::{catalog, customer, service_request, service_request::RequestStatus, user};
use sea_orm::{prelude::DateTimeWithTimeZone, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::errors::ServiceError;

pub const EXPORTS_DIR: &str = "exports";
const FILE_PREFIX: &str = "service_requests_export_";

pub const CSV_HEADER: [&str; 9] = [
    "Service Request ID",
    "Service Name",
    "Request Date",
    "Status",
    "Location",
    "Pin Code",
    "Customer Name",
    "Customer Email",
    "Customer Phone",
];

/// Optional narrowing; dates are inclusive calendar days (UTC).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportFilters {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub service_id: Option<i32>,
    #[serde(default)]
    pub professional_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub request_id: i32,
    pub service_name: String,
    pub request_date: String,
    pub status: RequestStatus,
    pub location: String,
    pub pin_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExportState {
    Pending,
    Processing,
    Completed { filename: String, rows: usize },
    Failed { message: String },
}

/// What the status endpoint reports.
#[derive(Debug, Clone, Serialize)]
pub struct ExportStatus {
    pub job_id: String,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl ExportStatus {
    pub fn describe(job_id: &str, state: &ExportState) -> Self {
        let (status, message, file_url) = match state {
            ExportState::Pending => ("pending", "Export job is pending".to_string(), None),
            ExportState::Processing => ("processing", "Export job is still processing".to_string(), None),
            ExportState::Completed { filename, .. } => (
                "completed",
                "Export job completed successfully".to_string(),
                Some(format!("/api/admin/export/download/{filename}")),
            ),
            ExportState::Failed { message } => ("failed", message.clone(), None),
        };
        Self { job_id: job_id.to_string(), status, message, file_url }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = csv_line(&CSV_HEADER);
    for r in rows {
        let id = r.request_id.to_string();
        out.push_str(&csv_line(&[
            id.as_str(),
            r.service_name.as_str(),
            r.request_date.as_str(),
            r.status.as_str(),
            r.location.as_str(),
            r.pin_code.as_str(),
            r.customer_name.as_str(),
            r.customer_email.as_str(),
            r.customer_phone.as_str(),
        ]));
    }
    out
}

fn day_start(d: NaiveDate) -> DateTimeWithTimeZone {
    Utc.from_utc_datetime(&d.and_time(NaiveTime::default())).into()
}

/// Timestamped name, unique per job.
pub fn export_file_name(now: DateTime<Utc>, job_id: &str) -> String {
    format!("{FILE_PREFIX}{}_{job_id}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Completed, active requests matching `filters`, oldest first.
pub async fn completed_rows(db: &DatabaseConnection, filters: &ExportFilters) -> Result<Vec<ExportRow>, ServiceError> {
    let mut q = service_request::Entity::find()
        .filter(service_request::Column::Status.eq(RequestStatus::Completed))
        .filter(service_request::Column::IsActive.eq(true));
    if let Some(d) = filters.start_date {
        q = q.filter(service_request::Column::RequestTime.gte(day_start(d)));
    }
    if let Some(d) = filters.end_date {
        q = q.filter(service_request::Column::RequestTime.lt(day_start(d + Duration::days(1))));
    }
    if let Some(id) = filters.service_id {
        q = q.filter(service_request::Column::ServiceId.eq(id));
    }
    if let Some(id) = filters.professional_id {
        q = q.filter(service_request::Column::ProfessionalId.eq(id));
    }
    let requests = q
        .order_by_asc(service_request::Column::RequestTime)
        .order_by_asc(service_request::Column::Id)
        .find_also_related(catalog::Entity)
        .all(db)
        .await?;

    let customers: HashMap<i32, (String, String, String)> = customer::Entity::find()
        .find_also_related(user::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(c, u)| u.map(|u| (c.id, (u.name, u.email, u.phone.unwrap_or_default()))))
        .collect();

    Ok(requests
        .into_iter()
        .map(|(r, svc)| {
            let (customer_name, customer_email, customer_phone) = customers.get(&r.customer_id).cloned().unwrap_or_default();
            ExportRow {
                request_id: r.id,
                service_name: svc.map(|s| s.name).unwrap_or_else(|| "Unknown".into()),
                request_date: r.request_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                status: r.status,
                location: r.location,
                pin_code: r.pin_code,
                customer_name,
                customer_email,
                customer_phone,
            }
        })
        .collect())
}

/// Write the export file. `None` when nothing matched.
pub async fn write_export(
    db: &DatabaseConnection,
    filters: &ExportFilters,
    dir: &Path,
    job_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<(String, usize)>, ServiceError> {
    let rows = completed_rows(db, filters).await?;
    if rows.is_empty() {
        info!("no data found for csv export");
        return Ok(None);
    }
    tokio::fs::create_dir_all(dir).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
    let filename = export_file_name(now, job_id);
    let path = dir.join(&filename);
    tokio::fs::write(&path, render_csv(&rows)).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
    info!(path = %path.display(), rows = rows.len(), "csv export written");
    Ok(Some((filename, rows.len())))
}

/// Validate a download name and return its path inside `dir`.
pub async fn resolve_download(dir: &Path, filename: &str) -> Result<PathBuf, ServiceError> {
    let well_formed = filename.starts_with(FILE_PREFIX)
        && filename.ends_with(".csv")
        && filename.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !filename.contains("..");
    if !well_formed {
        return Err(ServiceError::validation("Invalid export file name"));
    }
    let path = dir.join(filename);
    match tokio::fs::try_exists(&path).await {
        Ok(true) => Ok(path),
        _ => Err(ServiceError::not_found("Export file")),
    }
}

/// Finished jobs stay queryable for this long.
pub const FINISHED_JOB_TTL: StdDuration = StdDuration::from_secs(24 * 60 * 60);

struct JobEntry {
    state: ExportState,
    updated: Instant,
}

impl JobEntry {
    fn finished(&self) -> bool {
        matches!(self.state, ExportState::Completed { .. } | ExportState::Failed { .. })
    }
}

/// In-memory registry of export jobs keyed by job id.
#[derive(Clone)]
pub struct ExportJobs {
    jobs: Arc<DashMap<String, JobEntry>>,
    ttl: StdDuration,
}

impl Default for ExportJobs {
    fn default() -> Self { Self::with_ttl(FINISHED_JOB_TTL) }
}

impl ExportJobs {
    pub fn new() -> Self { Self::default() }

    pub fn with_ttl(ttl: StdDuration) -> Self { Self { jobs: Arc::new(DashMap::new()), ttl } }

    pub fn status(&self, job_id: &str) -> Option<ExportState> {
        self.jobs.get(job_id).map(|e| e.value().state.clone())
    }

    pub fn len(&self) -> usize { self.jobs.len() }

    pub fn is_empty(&self) -> bool { self.jobs.is_empty() }

    fn set(&self, job_id: &str, state: ExportState) {
        self.jobs.insert(job_id.to_string(), JobEntry { state, updated: Instant::now() });
    }

    /// Drop finished jobs older than the TTL; running jobs are kept.
    pub fn prune(&self) -> usize {
        let before = self.jobs.len();
        let ttl = self.ttl;
        self.jobs.retain(|_, e| !(e.finished() && e.updated.elapsed() >= ttl));
        let removed = before.saturating_sub(self.jobs.len());
        if removed > 0 {
            debug!(removed, "expired export jobs pruned");
        }
        removed
    }

    /// Register a job and run it on a background task. Returns the job id.
    pub fn start(&self, db: DatabaseConnection, filters: ExportFilters, dir: PathBuf, requested_by: String) -> String {
        self.prune();
        let job_id = Uuid::new_v4().to_string();
        self.set(&job_id, ExportState::Pending);
        info!(job_id = %job_id, requested_by = %requested_by, "csv export queued");

        let jobs = self.clone();
        let id = job_id.clone();
        tokio::spawn(async move {
            jobs.set(&id, ExportState::Processing);
            let outcome = write_export(&db, &filters, &dir, &id, Utc::now()).await;
            let state = match outcome {
                Ok(Some((filename, rows))) => ExportState::Completed { filename, rows },
                Ok(None) => ExportState::Failed { message: "Export job completed but no file was generated".into() },
                Err(e) => {
                    error!(job_id = %id, error = %e, "csv export failed");
                    ExportState::Failed { message: "Export job failed".into() }
                }
            };
            common::metrics::record_job_run("csv_export", matches!(state, ExportState::Completed { .. }));
            jobs.set(&id, state);
        });
        job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> ExportRow {
        ExportRow {
            request_id: 7,
            service_name: name.into(),
            request_date: "2024-05-01 10:00:00".into(),
            status: RequestStatus::Completed,
            location: "12 Main St, Apt 4".into(),
            pin_code: "12345".into(),
            customer_name: "Carol".into(),
            customer_email: "c@example.com".into(),
            customer_phone: String::new(),
        }
    }

    #[test]
    fn header_comes_first() {
        let csv = render_csv(&[]);
        assert_eq!(
            csv,
            "Service Request ID,Service Name,Request Date,Status,Location,Pin Code,Customer Name,Customer Email,Customer Phone\r\n"
        );
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        let csv = render_csv(&[row("Say \"hi\"")]);
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(line, "7,\"Say \"\"hi\"\"\",2024-05-01 10:00:00,COMPLETED,\"12 Main St, Apt 4\",12345,Carol,c@example.com,");
    }

    #[test]
    fn file_name_has_timestamp_and_job() {
        let now = DateTime::parse_from_rfc3339("2024-06-02T03:04:05Z").unwrap().with_timezone(&Utc);
        assert_eq!(export_file_name(now, "j1"), "service_requests_export_20240602_030405_j1.csv");
        assert_ne!(export_file_name(now, "j1"), export_file_name(now, "j2"));
    }

    #[tokio::test]
    async fn generated_names_are_downloadable() {
        let dir = tempfile::tempdir().unwrap();
        let name = export_file_name(Utc::now(), &Uuid::new_v4().to_string());
        tokio::fs::write(dir.path().join(&name), "x").await.unwrap();
        assert!(resolve_download(dir.path(), &name).await.is_ok());
    }

    #[test]
    fn prune_drops_only_finished_jobs() {
        let jobs = ExportJobs::with_ttl(StdDuration::ZERO);
        jobs.set("done", ExportState::Completed { filename: "f.csv".into(), rows: 1 });
        jobs.set("bad", ExportState::Failed { message: "x".into() });
        jobs.set("busy", ExportState::Processing);
        assert_eq!(jobs.prune(), 2);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs.status("busy"), Some(ExportState::Processing));

        let kept = ExportJobs::new();
        kept.set("done", ExportState::Failed { message: "x".into() });
        assert_eq!(kept.prune(), 0);
        assert!(kept.status("done").is_some());
    }

    #[tokio::test]
    async fn download_names_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(resolve_download(dir.path(), "../secret.csv").await, Err(ServiceError::Validation(_))));
        assert!(matches!(resolve_download(dir.path(), "service_requests_export_1.csv").await, Err(ServiceError::NotFound(_))));
        tokio::fs::write(dir.path().join("service_requests_export_1.csv"), "x").await.unwrap();
        assert!(resolve_download(dir.path(), "service_requests_export_1.csv").await.is_ok());
    }

    #[test]
    fn status_description_links_download() {
        let s = ExportStatus::describe("j1", &ExportState::Completed { filename: "f.csv".into(), rows: 1 });
        assert_eq!(s.status, "completed");
        assert_eq!(s.file_url.as_deref(), Some("/api/admin/export/download/f.csv"));
        assert_eq!(ExportStatus::describe("j1", &ExportState::Pending).status, "pending");
    }
}
