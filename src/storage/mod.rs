//! Submission persistence
//!
//! A store hands out one connection per request; the connection performs the
//! single insert and is closed explicitly once the response is decided.
//! Nothing is pooled or retried.

mod mysql;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::intake::Submission;

pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("insert failed: {0}")]
    Insert(#[source] sqlx::Error),

    #[error("insert affected {0} rows, expected 1")]
    UnexpectedRows(u64),

    #[error("ping failed: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("close failed: {0}")]
    Close(#[source] sqlx::Error),
}

/// Source of per-request connections
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError>;
}

/// A live connection owned by one request
#[async_trait]
pub trait StoreConnection: Send {
    /// Write one row for `submission`
    async fn insert(&mut self, submission: &Submission) -> Result<(), StoreError>;

    /// Round-trip to the server without touching data
    async fn ping(&mut self) -> Result<(), StoreError>;

    /// End the session with the server (COM_QUIT for MySQL)
    async fn close(self: Box<Self>) -> Result<(), StoreError>;
}
