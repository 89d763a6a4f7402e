use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use models::{catalog, customer, professional, service_request, service_request::RequestStatus, user};
use sea_orm::{prelude::DateTimeWithTimeZone, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{info, warn};

use super::notifier::Notifier;
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct ReportLine {
    pub service_name: String,
    pub status: RequestStatus,
    pub request_date: String,
    pub professional: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub customer_id: i32,
    pub email: String,
    pub customer_name: String,
    pub month: String,
    pub total: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub pending: usize,
    pub lines: Vec<ReportLine>,
}

impl MonthlyReport {
    pub fn render(&self) -> String {
        let mut out = format!(
            "Monthly Activity Report - {}\n\nHello {},\n\nTotal requests: {}\nCompleted: {}\nCancelled: {}\nPending: {}\n\n",
            self.month, self.customer_name, self.total, self.completed, self.cancelled, self.pending
        );
        for l in &self.lines {
            out.push_str(&format!("- {} | {} | {} | {} | {}\n", l.request_date, l.service_name, l.status, l.professional, l.location));
        }
        out
    }
}

/// `[first day of previous month, first day of this month)` in UTC.
pub fn previous_month(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (y, m) = if now.month() == 1 { (now.year() - 1, 12) } else { (now.year(), now.month() - 1) };
    let start = Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0).single().unwrap_or(now);
    let end = Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).single().unwrap_or(now);
    (start, end)
}

/// Per-customer summary of last month's requests. Customers without activity are skipped.
pub async fn monthly_reports(db: &DatabaseConnection, notifier: &dyn Notifier, now: DateTime<Utc>) -> Result<Vec<MonthlyReport>, ServiceError> {
    info!("monthly reports started");
    let (start, end) = previous_month(now);
    let month = start.format("%B %Y").to_string();
    let (start_tz, end_tz): (DateTimeWithTimeZone, DateTimeWithTimeZone) = (start.into(), end.into());

    let services: HashMap<i32, String> = catalog::Entity::find().all(db).await?.into_iter().map(|s| (s.id, s.name)).collect();
    let pro_names: HashMap<i32, String> = professional::Entity::find()
        .find_also_related(user::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(p, u)| u.map(|u| (p.id, u.name)))
        .collect();

    let customers = customer::Entity::find()
        .filter(customer::Column::IsActive.eq(true))
        .order_by_asc(customer::Column::Id)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    let mut reports = Vec::new();
    for (c, u) in customers {
        let Some(u) = u else { continue };
        let requests = service_request::Entity::find()
            .filter(service_request::Column::CustomerId.eq(c.id))
            .filter(service_request::Column::IsActive.eq(true))
            .filter(service_request::Column::RequestTime.gte(start_tz))
            .filter(service_request::Column::RequestTime.lt(end_tz))
            .order_by_asc(service_request::Column::RequestTime)
            .all(db)
            .await?;
        if requests.is_empty() {
            continue;
        }
        let completed = requests.iter().filter(|r| r.status == RequestStatus::Completed).count();
        let cancelled = requests.iter().filter(|r| r.status == RequestStatus::Cancelled).count();
        let lines = requests
            .iter()
            .map(|r| ReportLine {
                service_name: services.get(&r.service_id).cloned().unwrap_or_else(|| "Unknown".into()),
                status: r.status,
                request_date: r.request_time.format("%Y-%m-%d").to_string(),
                professional: r.professional_id.and_then(|id| pro_names.get(&id).cloned()).unwrap_or_else(|| "Not assigned".into()),
                location: r.location.clone(),
            })
            .collect();
        let report = MonthlyReport {
            customer_id: c.id,
            email: u.email.clone(),
            customer_name: u.name.clone(),
            month: month.clone(),
            total: requests.len(),
            completed,
            cancelled,
            pending: requests.len() - completed - cancelled,
            lines,
        };
        let subject = format!("Monthly Activity Report - {}", report.month);
        if let Err(e) = notifier.send(&report.email, &subject, &report.render()).await {
            warn!(customer_id = c.id, error = %e, "monthly report not delivered");
            continue;
        }
        reports.push(report);
    }
    info!(count = reports.len(), "monthly reports sent");
    Ok(reports)
}
