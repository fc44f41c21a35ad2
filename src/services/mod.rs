// Service exports
pub mod memory;
pub mod postgres;
pub mod rest;

pub use memory::{InMemoryStore, StoreFixture};
pub use postgres::PostgresStore;
pub use rest::{RestStore, RestTables};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use crate::models::{CandidateTask, CompletedBooking, MatchAuditRecord, MatchPreferences, UserProfile};

/// Errors that can occur when talking to the marketplace data store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Data store returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    #[error("Fixture error: {0}")]
    FixtureError(String),
}

/// Read/write contract of the marketplace data store
///
/// The store owns users, tasks, bookings and preferences; this service only
/// reads them and appends to the match log.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Stored match preferences, `None` when the user never saved any
    async fn get_preferences(&self, user_id: &str) -> Result<Option<MatchPreferences>, StoreError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Most recent completed bookings done by `user_id`, newest first
    async fn get_completed_bookings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CompletedBooking>, StoreError>;

    /// Open tasks not owned by `exclude_owner`, newest first
    async fn get_open_tasks(
        &self,
        exclude_owner: &str,
        categories: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<CandidateTask>, StoreError>;

    /// Append one record to the match analytics log
    async fn insert_match_log(&self, record: &MatchAuditRecord) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Run a store call with a deadline
pub async fn with_timeout<T, F>(
    operation: &'static str,
    timeout: Duration,
    fut: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            after_ms: timeout.as_millis() as u64,
        }),
    }
}
