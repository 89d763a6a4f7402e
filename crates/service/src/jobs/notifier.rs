use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::errors::ServiceError;

/// Outbound message channel used by background jobs.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError>;
}

/// Emits a structured log event per message.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        info!(to, subject, body, "notification");
        Ok(())
    }
}

/// POSTs `{to, subject, body}` as JSON to a webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::Storage(format!("webhook client: {e}")))?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        let resp = self.client
            .post(&self.url)
            .json(&json!({ "to": to, "subject": subject, "body": body }))
            .send()
            .await
            .map_err(|e| ServiceError::Storage(format!("webhook send: {e}")))?;
        if !resp.status().is_success() {
            return Err(ServiceError::Storage(format!("webhook returned {}", resp.status())));
        }
        Ok(())
    }
}

/// Webhook when `jobs.webhook_url` is set, otherwise log.
pub fn from_config(cfg: &configs::JobsConfig) -> Result<Arc<dyn Notifier>, ServiceError> {
    match cfg.webhook_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(url)?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

/// Simple in-memory recorder for tests
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String, String)>>, // (to, subject, body)
        pub fail_for: Option<String>,
    }

    impl RecordingNotifier {
        pub fn recipients(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(to, _, _)| to.clone()).collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
            if self.fail_for.as_deref() == Some(to) {
                return Err(ServiceError::Storage("recipient rejected".into()));
            }
            self.sent.lock().unwrap().push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }
}
