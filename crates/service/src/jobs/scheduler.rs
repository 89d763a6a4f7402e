use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::notifier::Notifier;
use super::{reminders, reports};

/// Next run strictly after `now` at `hour:00` UTC.
pub fn next_daily(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let hour = hour.min(23);
    let today = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), hour, 0, 0)
        .single()
        .unwrap_or(now);
    if today > now { today } else { today + Duration::days(1) }
}

/// Next first-of-month midnight strictly after `now`.
pub fn next_monthly(now: DateTime<Utc>) -> DateTime<Utc> {
    let (y, m) = if now.month() == 12 { (now.year() + 1, 1) } else { (now.year(), now.month() + 1) };
    Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0).single().unwrap_or(now + Duration::days(28))
}

async fn sleep_until(at: DateTime<Utc>) {
    let wait = (at - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
}

/// Timer loop for reminders and monthly reports.
pub struct Scheduler {
    db: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
    cfg: configs::JobsConfig,
}

impl Scheduler {
    pub fn new(db: DatabaseConnection, notifier: Arc<dyn Notifier>, cfg: configs::JobsConfig) -> Self {
        Self { db, notifier, cfg }
    }

    /// Spawn both loops; they run until the runtime shuts down.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let Scheduler { db, notifier, cfg } = self;
        info!(reminder_hour = cfg.reminder_hour, inactivity_days = cfg.inactivity_days, "job scheduler started");

        let daily = {
            let db = db.clone();
            let notifier = notifier.clone();
            tokio::spawn(async move {
                loop {
                    sleep_until(next_daily(Utc::now(), cfg.reminder_hour)).await;
                    let res = reminders::daily_reminders(&db, notifier.as_ref(), cfg.inactivity_days, Utc::now()).await;
                    common::metrics::record_job_run("daily_reminders", res.is_ok());
                    if let Err(e) = res {
                        error!(error = %e, "daily reminders failed");
                    }
                }
            })
        };

        let monthly = tokio::spawn(async move {
            loop {
                sleep_until(next_monthly(Utc::now())).await;
                let res = reports::monthly_reports(&db, notifier.as_ref(), Utc::now()).await;
                common::metrics::record_job_run("monthly_reports", res.is_ok());
                if let Err(e) = res {
                    error!(error = %e, "monthly reports failed");
                }
            }
        });

        vec![daily, monthly]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn daily_before_and_after_hour() {
        assert_eq!(next_daily(at(2024, 5, 10, 9, 0), 18), at(2024, 5, 10, 18, 0));
        assert_eq!(next_daily(at(2024, 5, 10, 18, 0), 18), at(2024, 5, 11, 18, 0));
        assert_eq!(next_daily(at(2024, 5, 31, 19, 30), 18), at(2024, 6, 1, 18, 0));
    }

    #[test]
    fn monthly_rolls_over_year() {
        assert_eq!(next_monthly(at(2024, 12, 15, 3, 0)), at(2025, 1, 1, 0, 0));
        assert_eq!(next_monthly(at(2024, 2, 1, 0, 0)), at(2024, 3, 1, 0, 0));
    }
}
