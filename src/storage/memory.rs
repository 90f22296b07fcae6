//! In-memory store recording every insert, with switchable failures

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{StoreConnection, StoreError, SubmissionStore};
use crate::intake::Submission;

#[derive(Default)]
struct Shared {
    rows: Mutex<Vec<Submission>>,
    fail_connect: AtomicBool,
    fail_insert: AtomicBool,
    fail_close: AtomicBool,
    connects: AtomicUsize,
    closes: AtomicUsize,
    insert_attempts: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_connect(&self, fail: bool) {
        self.shared.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert(&self, fail: bool) {
        self.shared.fail_insert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_close(&self, fail: bool) {
        self.shared.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<Submission> {
        self.shared.rows.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Connections closed explicitly, failed closes included
    pub fn closes(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    pub fn insert_attempts(&self) -> usize {
        self.shared.insert_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_connect.load(Ordering::SeqCst) {
            return Err(StoreError::Connect(sqlx::Error::PoolTimedOut));
        }
        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn insert(&mut self, submission: &Submission) -> Result<(), StoreError> {
        self.shared.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Insert(sqlx::Error::RowNotFound));
        }

        let mut rows = self.shared.rows.lock().unwrap();
        if rows.iter().any(|row| row.id == submission.id) {
            return Err(StoreError::UnexpectedRows(0));
        }
        rows.push(submission.clone());
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_close.load(Ordering::SeqCst) {
            return Err(StoreError::Close(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}
