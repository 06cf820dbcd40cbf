//! Best-effort push delivery.
//!
//! The push collaborator accepts (target participant id, title, body, data)
//! and delivers with no guarantee; no acknowledgment is awaited and failures
//! are logged rather than propagated.

mod schedule;

pub use schedule::{reminder_times, Reminder};

use crate::config::PushConfig;

/// Push delivery client, selected once at startup.
#[derive(Debug, Clone)]
pub enum PushClient {
    /// Forward to the push collaborator over HTTP.
    Http(HttpPush),
    /// Demo mode: log and drop.
    Null,
}

/// HTTP forwarder to the push collaborator.
#[derive(Debug, Clone)]
pub struct HttpPush {
    http: reqwest::Client,
    endpoint: String,
}

impl PushClient {
    /// Pick the client from configuration; no endpoint means demo mode.
    pub fn from_config(config: &PushConfig) -> Self {
        match &config.endpoint {
            Some(endpoint) => Self::Http(HttpPush {
                http: reqwest::Client::new(),
                endpoint: endpoint.clone(),
            }),
            None => {
                tracing::info!("push endpoint absent, notifications will be dropped");
                Self::Null
            }
        }
    }

    /// Best-effort delivery of one notification.
    pub async fn send(&self, target_id: &str, title: &str, body: &str, data: serde_json::Value) {
        match self {
            Self::Http(push) => {
                // UUIDv7 dedup key: time-ordered, safe for at-most-once
                // handling on the collaborator side.
                let payload = serde_json::json!({
                    "notification_id": uuid::Uuid::now_v7().to_string(),
                    "target": target_id,
                    "title": title,
                    "body": body,
                    "data": data,
                });
                match push.http.post(&push.endpoint).json(&payload).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        tracing::debug!(target_id, title, "notification forwarded");
                    }
                    Ok(resp) => {
                        tracing::warn!(target_id, status = %resp.status(), "push delivery rejected");
                    }
                    Err(e) => {
                        tracing::warn!(target_id, error = %e, "push delivery failed");
                    }
                }
            }
            Self::Null => {
                tracing::debug!(target_id, title, "null push client, dropping notification");
            }
        }
    }
}
