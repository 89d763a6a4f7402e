//! Out-of-band work: reminders, monthly reports, CSV export and the timer
//! that drives the first two. Failures are logged and never reach request handling.

pub mod export;
pub mod notifier;
pub mod reminders;
pub mod reports;
pub mod scheduler;

pub use export::{ExportFilters, ExportJobs, ExportState};
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use scheduler::Scheduler;
