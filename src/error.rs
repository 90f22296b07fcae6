//! Request-level error taxonomy
//!
//! Every variant terminates the request with a fixed public message; the
//! wrapped cause only goes to the error log.

use hyper::StatusCode;
use thiserror::Error;

use crate::intake::ValidationError;
use crate::mail::MailError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum IntakeError {
    /// The per-request connection could not be opened
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(#[source] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Insert rejected; the generated identifier is abandoned
    #[error("persistence failed: {0}")]
    Persistence(#[source] StoreError),

    /// No redirect target matches the submitted tags
    #[error("no redirect target for tags '{0}'")]
    UnknownTag(String),

    /// Raised after the row was stored; not reconciled
    #[error("notification failed: {0}")]
    Notification(#[from] MailError),
}

impl IntakeError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::UnknownTag(_) => StatusCode::BAD_REQUEST,
            Self::DatabaseUnavailable(_) | Self::Persistence(_) | Self::Notification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the response envelope
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::DatabaseUnavailable(_) => "Database connection failed",
            Self::InvalidInput(_) => "Invalid input data",
            Self::Persistence(_) => "Failed to save data",
            Self::UnknownTag(_) => "Unknown tag, no redirection set",
            Self::Notification(_) => "Failed to send email",
        }
    }
}
