//! MySQL-backed submission store

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;

use super::{StoreConnection, StoreError, SubmissionStore};
use crate::config::DatabaseConfig;
use crate::intake::Submission;

/// Opens a fresh `MySqlConnection` for every request
pub struct MySqlStore {
    options: MySqlConnectOptions,
    insert_sql: String,
}

impl MySqlStore {
    /// `config.table` must already be validated as a plain identifier
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        Self {
            options,
            insert_sql: insert_statement(&config.table),
        }
    }
}

fn insert_statement(table: &str) -> String {
    format!("INSERT INTO {table} (uuid, name, email, notes, tags) VALUES (?, ?, ?, ?, ?)")
}

#[async_trait]
impl SubmissionStore for MySqlStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        let conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(StoreError::Connect)?;

        Ok(Box::new(MySqlStoreConnection {
            conn,
            insert_sql: self.insert_sql.clone(),
        }))
    }
}

struct MySqlStoreConnection {
    conn: MySqlConnection,
    insert_sql: String,
}

#[async_trait]
impl StoreConnection for MySqlStoreConnection {
    async fn insert(&mut self, submission: &Submission) -> Result<(), StoreError> {
        let result = sqlx::query(&self.insert_sql)
            .bind(&submission.id)
            .bind(&submission.name)
            .bind(&submission.email)
            .bind(&submission.notes)
            .bind(&submission.tags)
            .execute(&mut self.conn)
            .await
            .map_err(StoreError::Insert)?;

        match result.rows_affected() {
            1 => Ok(()),
            n => Err(StoreError::UnexpectedRows(n)),
        }
    }

    async fn ping(&mut self) -> Result<(), StoreError> {
        self.conn.ping().await.map_err(StoreError::Ping)
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        let Self { conn, .. } = *self;
        conn.close().await.map_err(StoreError::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_statement_is_parameterized() {
        let sql = insert_statement("customers");
        assert_eq!(
            sql,
            "INSERT INTO customers (uuid, name, email, notes, tags) VALUES (?, ?, ?, ?, ?)"
        );
        assert_eq!(sql.matches('?').count(), 5);
    }
}
