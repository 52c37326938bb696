//! Outgoing e-mail.
//!
//! Delivery goes through the [`Mailer`] trait; the transport is picked from
//! `[mail]` configuration. Templates live in [`templates`].

pub mod outbox;
pub mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::storage::StorageError;

pub use outbox::OutboxMailer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("encode error: {0}")]
    Encode(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, "email (log transport)");
        Ok(())
    }
}
