use chrono::{DateTime, Duration, Utc};
use models::{professional, service_request, service_request::RequestStatus, user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{info, warn};

use super::notifier::Notifier;
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct Reminder {
    pub professional_id: i32,
    pub email: String,
    pub pending: u64,
    pub message: String,
}

pub fn reminder_message(name: &str, pending: u64) -> String {
    let mut msg = format!("Hello {name}, you have {pending} pending service requests. ");
    if pending > 0 {
        msg.push_str("Please log in to accept or reject them.");
    } else {
        msg.push_str("Please log in to check for new service requests.");
    }
    msg
}

/// Remind active professionals that have ASSIGNED work waiting, or that have
/// not logged in for `inactivity_days` (or never).
///
/// A failed send is logged and skipped; the returned list holds what was sent.
pub async fn daily_reminders(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    inactivity_days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Reminder>, ServiceError> {
    info!("daily reminders started");
    let cutoff = now - Duration::days(inactivity_days);
    let rows = professional::Entity::find()
        .filter(professional::Column::IsActive.eq(true))
        .order_by_asc(professional::Column::Id)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    let mut sent = Vec::new();
    for (pro, u) in rows {
        let Some(u) = u else { continue };
        if !u.is_active {
            continue;
        }
        let pending = service_request::Entity::find()
            .filter(service_request::Column::ProfessionalId.eq(pro.id))
            .filter(service_request::Column::Status.eq(RequestStatus::Assigned))
            .filter(service_request::Column::IsActive.eq(true))
            .count(db)
            .await?;
        let stale = u.last_login.map_or(true, |t| t.with_timezone(&Utc) < cutoff);
        if pending == 0 && !stale {
            continue;
        }
        let message = reminder_message(&u.name, pending);
        if let Err(e) = notifier.send(&u.email, "Daily Reminder", &message).await {
            warn!(professional_id = pro.id, error = %e, "reminder not delivered");
            continue;
        }
        sent.push(Reminder { professional_id: pro.id, email: u.email, pending, message });
    }
    info!(count = sent.len(), "daily reminders sent");
    Ok(sent)
}
