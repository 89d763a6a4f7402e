use chrono::{Duration, NaiveDate, TimeZone, Utc};
use models::service_request::{self, NewServiceRequest, RequestStatus};
use models::user;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::jobs::export::{completed_rows, write_export};
use crate::jobs::notifier::mock::RecordingNotifier;
use crate::jobs::reminders::daily_reminders;
use crate::jobs::reports::monthly_reports;
use crate::jobs::{ExportFilters, ExportJobs, ExportState};
use crate::lifecycle::{CompletionInput, LifecycleEngine};
use crate::principal::Principal;
use crate::test_support::{memory_db, seed_customer, seed_professional, seed_service};

async fn request(engine: &LifecycleEngine, customer: &Principal, service_id: i32) -> Result<service_request::Model, anyhow::Error> {
    let input = NewServiceRequest { service_id, location: "1 Elm St".into(), pin_code: "10001".into(), remarks: None };
    Ok(engine.create(customer, input).await?)
}

async fn completed(engine: &LifecycleEngine, customer: &Principal, pro: &Principal, service_id: i32) -> Result<service_request::Model, anyhow::Error> {
    let req = request(engine, customer, service_id).await?;
    engine.accept(pro, req.id).await?;
    engine.start(pro, req.id).await?;
    Ok(engine.complete(customer, req.id, CompletionInput::default()).await?)
}

async fn backdate(db: &DatabaseConnection, req: service_request::Model, when: chrono::DateTime<Utc>) -> Result<(), anyhow::Error> {
    let mut am: service_request::ActiveModel = req.into();
    am.request_time = Set(when.into());
    am.update(db).await?;
    Ok(())
}

async fn set_last_login(db: &DatabaseConnection, principal: &Principal, when: chrono::DateTime<Utc>) -> Result<(), anyhow::Error> {
    let id = principal.user_id().ok_or_else(|| anyhow::anyhow!("not a user"))?;
    let u = user::Entity::find_by_id(id).one(db).await?.ok_or_else(|| anyhow::anyhow!("user missing"))?;
    let mut am: user::ActiveModel = u.into();
    am.last_login = Set(Some(when.into()));
    am.update(db).await?;
    Ok(())
}

#[tokio::test]
async fn reminders_target_pending_or_idle_professionals() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let engine = LifecycleEngine::new(db.clone());
    let svc = seed_service(&db, "Plumbing").await?;
    let customer = seed_customer(&db, "cust@example.com").await?;
    let busy = seed_professional(&db, "busy@example.com", svc.id, true).await?;
    let fresh = seed_professional(&db, "fresh@example.com", svc.id, true).await?;
    let _never = seed_professional(&db, "never@example.com", svc.id, true).await?;

    let now = Utc::now();
    set_last_login(&db, &busy, now).await?;
    set_last_login(&db, &fresh, now - Duration::hours(2)).await?;
    let req = request(&engine, &customer, svc.id).await?;
    engine.accept(&busy, req.id).await?;

    let notifier = RecordingNotifier::default();
    let sent = daily_reminders(&db, &notifier, 1, now).await?;
    assert_eq!(notifier.recipients(), vec!["busy@example.com".to_string(), "never@example.com".to_string()]);
    assert_eq!(sent[0].pending, 1);
    assert_eq!(sent[1].pending, 0);

    // 投递失败只跳过该收件人
    let flaky = RecordingNotifier { fail_for: Some("busy@example.com".into()), ..Default::default() };
    let sent = daily_reminders(&db, &flaky, 1, now).await?;
    assert_eq!(sent.len(), 1);
    assert_eq!(flaky.recipients(), vec!["never@example.com".to_string()]);
    Ok(())
}

#[tokio::test]
async fn monthly_report_covers_previous_month_only() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let engine = LifecycleEngine::new(db.clone());
    let svc = seed_service(&db, "Plumbing").await?;
    let customer = seed_customer(&db, "cust@example.com").await?;
    let _idle = seed_customer(&db, "idle@example.com").await?;
    let pro = seed_professional(&db, "pro@example.com", svc.id, true).await?;

    let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
    let in_feb = Utc.with_ymd_and_hms(2024, 2, 14, 9, 0, 0).unwrap();

    let done = completed(&engine, &customer, &pro, svc.id).await?;
    backdate(&db, done, in_feb).await?;
    let cancelled = request(&engine, &customer, svc.id).await?;
    let cancelled = engine.cancel(&customer, cancelled.id).await?;
    backdate(&db, cancelled, in_feb).await?;
    let open = request(&engine, &customer, svc.id).await?;
    backdate(&db, open, in_feb).await?;
    let march = request(&engine, &customer, svc.id).await?;
    backdate(&db, march, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()).await?;

    let notifier = RecordingNotifier::default();
    let reports = monthly_reports(&db, &notifier, now).await?;
    assert_eq!(reports.len(), 1);
    let r = &reports[0];
    assert_eq!(r.month, "February 2024");
    assert_eq!((r.total, r.completed, r.cancelled, r.pending), (3, 1, 1, 1));
    assert_eq!(notifier.recipients(), vec!["cust@example.com".to_string()]);
    assert!(notifier.sent.lock().unwrap()[0].2.contains("Completed: 1"));
    Ok(())
}

#[tokio::test]
async fn export_contains_only_completed_rows() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let engine = LifecycleEngine::new(db.clone());
    let plumbing = seed_service(&db, "Plumbing").await?;
    let cleaning = seed_service(&db, "Cleaning").await?;
    let customer = seed_customer(&db, "cust@example.com").await?;
    let plumber = seed_professional(&db, "plumber@example.com", plumbing.id, true).await?;
    let cleaner = seed_professional(&db, "cleaner@example.com", cleaning.id, true).await?;

    let a = completed(&engine, &customer, &plumber, plumbing.id).await?;
    let b = completed(&engine, &customer, &cleaner, cleaning.id).await?;
    backdate(&db, b.clone(), Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()).await?;
    request(&engine, &customer, plumbing.id).await?;

    let all = completed_rows(&db, &ExportFilters::default()).await?;
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|r| r.status == RequestStatus::Completed));

    let by_service = completed_rows(&db, &ExportFilters { service_id: Some(plumbing.id), ..Default::default() }).await?;
    assert_eq!(by_service.iter().map(|r| r.request_id).collect::<Vec<_>>(), vec![a.id]);
    let by_pro = completed_rows(&db, &ExportFilters { professional_id: cleaner.require_professional().ok(), ..Default::default() }).await?;
    assert_eq!(by_pro.iter().map(|r| r.request_id).collect::<Vec<_>>(), vec![b.id]);

    let jan = NaiveDate::from_ymd_opt(2024, 1, 5);
    let dated = completed_rows(&db, &ExportFilters { start_date: jan, end_date: jan, ..Default::default() }).await?;
    assert_eq!(dated.len(), 1);
    assert_eq!(dated[0].customer_email, "cust@example.com");

    let dir = tempfile::tempdir()?;
    let now = Utc::now();
    let (file, rows) = write_export(&db, &ExportFilters::default(), dir.path(), "job-a", now).await?.unwrap();
    assert_eq!(rows, 2);
    // 同一秒内的另一个任务不能覆盖前一个文件
    let only_plumbing = ExportFilters { service_id: Some(plumbing.id), ..Default::default() };
    let (other, other_rows) = write_export(&db, &only_plumbing, dir.path(), "job-b", now).await?.unwrap();
    assert_ne!(file, other);
    assert_eq!(other_rows, 1);
    let body = std::fs::read_to_string(dir.path().join(&file))?;
    assert_eq!(body.lines().count(), 3);
    assert!(body.starts_with("Service Request ID,"));
    assert_eq!(std::fs::read_to_string(dir.path().join(&other))?.lines().count(), 2);

    let none = ExportFilters { service_id: Some(9999), ..Default::default() };
    assert!(write_export(&db, &none, dir.path(), "job-c", now).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn export_job_reports_failure_when_nothing_matches() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let dir = tempfile::tempdir()?;
    let jobs = ExportJobs::new();
    let id = jobs.start(db, ExportFilters::default(), dir.path().to_path_buf(), "admin:admin@example.com".into());

    let mut state = jobs.status(&id);
    for _ in 0..100 {
        if matches!(state, Some(ExportState::Completed { .. } | ExportState::Failed { .. })) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        state = jobs.status(&id);
    }
    assert_eq!(state, Some(ExportState::Failed { message: "Export job completed but no file was generated".into() }));
    assert!(jobs.status("missing").is_none());
    Ok(())
}
