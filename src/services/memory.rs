use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use crate::models::{CandidateTask, CompletedBooking, MatchAuditRecord, MatchPreferences, UserProfile};
use crate::services::{MatchStore, StoreError};

/// Seed data for the in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub preferences: Vec<MatchPreferences>,
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
    /// Completed bookings keyed by the worker who did them, newest first
    #[serde(default)]
    pub completed_bookings: HashMap<String, Vec<CompletedBooking>>,
    #[serde(default)]
    pub tasks: Vec<CandidateTask>,
}

impl StoreFixture {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::FixtureError(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| StoreError::FixtureError(format!("Invalid fixture: {}", e)))
    }
}

/// Store kept entirely in process memory
///
/// Backs local development runs and the test suite. Failure and latency
/// switches let callers exercise the error paths of the request pipeline.
#[derive(Default)]
pub struct InMemoryStore {
    data: RwLock<StoreFixture>,
    match_logs: RwLock<Vec<MatchAuditRecord>>,
    fail_reads: bool,
    fail_log_writes: bool,
    read_delay: Option<Duration>,
}

impl InMemoryStore {
    pub fn new(fixture: StoreFixture) -> Self {
        Self {
            data: RwLock::new(fixture),
            ..Default::default()
        }
    }

    /// Make every read fail with an API error
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Make every match log insert fail
    pub fn failing_log_writes(mut self) -> Self {
        self.fail_log_writes = true;
        self
    }

    /// Delay every read by `delay`
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub async fn add_task(&self, task: CandidateTask) {
        self.data.write().await.tasks.push(task);
    }

    pub async fn match_logs(&self) -> Vec<MatchAuditRecord> {
        self.match_logs.read().await.clone()
    }

    async fn before_read(&self, what: &str) -> Result<(), StoreError> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads {
            return Err(StoreError::ApiError {
                status: 503,
                message: format!("Request for {} failed", what),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn get_preferences(&self, user_id: &str) -> Result<Option<MatchPreferences>, StoreError> {
        self.before_read("preferences").await?;
        let data = self.data.read().await;
        Ok(data.preferences.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.before_read("profile").await?;
        let data = self.data.read().await;
        Ok(data.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn get_completed_bookings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CompletedBooking>, StoreError> {
        self.before_read("booking history").await?;
        let data = self.data.read().await;
        Ok(data
            .completed_bookings
            .get(user_id)
            .map(|bookings| bookings.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_open_tasks(
        &self,
        exclude_owner: &str,
        categories: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<CandidateTask>, StoreError> {
        self.before_read("open tasks").await?;
        let data = self.data.read().await;

        let mut tasks: Vec<CandidateTask> = data
            .tasks
            .iter()
            .filter(|t| t.is_candidate_for(exclude_owner))
            .filter(|t| categories.map_or(true, |c| c.is_empty() || c.contains(&t.category)))
            .cloned()
            .collect();

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);

        Ok(tasks)
    }

    async fn insert_match_log(&self, record: &MatchAuditRecord) -> Result<(), StoreError> {
        if self.fail_log_writes {
            return Err(StoreError::ApiError {
                status: 500,
                message: "Request for match log insert failed".to_string(),
            });
        }
        self.match_logs.write().await.push(record.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.fail_reads)
    }
}
