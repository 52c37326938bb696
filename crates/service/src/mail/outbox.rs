use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{EmailMessage, MailError, Mailer};
use crate::storage::{StorageRoot, OUTBOX_DIR};

/// Persists each message as `outbox/<timestamp>-<id>.json` under the storage root.
pub struct OutboxMailer {
    storage: Arc<StorageRoot>,
    from: String,
}

#[derive(Serialize)]
struct OutboxRecord<'a> {
    id: Uuid,
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    queued_at: chrono::DateTime<Utc>,
}

impl OutboxMailer {
    pub fn new(storage: Arc<StorageRoot>, from_name: &str, from_address: &str) -> Self {
        Self { storage, from: format!("{from_name} <{from_address}>") }
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let id = Uuid::new_v4();
        let queued_at = Utc::now();
        let record = OutboxRecord {
            id,
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html_body: &message.html_body,
            queued_at,
        };
        let body = serde_json::to_vec_pretty(&record).map_err(|e| MailError::Encode(e.to_string()))?;
        let name = format!("{OUTBOX_DIR}/{}-{}.json", queued_at.format("%Y%m%dT%H%M%S%.3f"), id.simple());
        self.storage.write(&name, &body).await?;
        info!(to = %message.to, subject = %message.subject, file = %name, "email queued to outbox");
        Ok(())
    }
}
