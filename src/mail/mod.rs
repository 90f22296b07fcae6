//! Post-persistence notification
//!
//! Sends a single thank-you email once a submission has been stored. Disabled
//! unless `mail.enabled` is set; failures are reported, never retried.

mod mandrill;
mod template;

use async_trait::async_trait;
use thiserror::Error;

use crate::intake::Submission;

pub use mandrill::MandrillNotifier;
pub use template::MailTemplate;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail provider answered HTTP {0}")]
    Status(u16),

    #[error("mail transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &Submission) -> Result<(), MailError>;
}
