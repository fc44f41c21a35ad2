use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use crate::models::{AuditedMatch, Coordinates, EffectivePreferences, MatchAuditRecord, MatchResult};
use crate::services::{with_timeout, MatchStore};

/// How many of the top results go into the audit record
pub const AUDIT_TOP_N: usize = 5;

/// Best-effort writer for the match analytics log
///
/// Writes run on a detached task with a single attempt and their own
/// timeout. Failures are logged and never reach the caller.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn MatchStore>,
    timeout: Duration,
    top_n: usize,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn MatchStore>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            top_n: AUDIT_TOP_N,
        }
    }

    pub fn build_record(
        &self,
        user_id: &str,
        matches: &[MatchResult],
        location: Option<Coordinates>,
        preferences: &EffectivePreferences,
        now: DateTime<Utc>,
    ) -> MatchAuditRecord {
        MatchAuditRecord {
            user_id: user_id.to_string(),
            top_matches: matches
                .iter()
                .take(self.top_n)
                .map(|m| AuditedMatch {
                    task_id: m.task_id.clone(),
                    score: m.match_score,
                })
                .collect(),
            latitude: location.map(|c| c.latitude),
            longitude: location.map(|c| c.longitude),
            preferences: preferences.clone(),
            created_at: now,
        }
    }

    /// Write `record` in the background
    ///
    /// The returned handle only exists so tests can wait for the write;
    /// request handlers drop it.
    pub fn spawn(&self, record: MatchAuditRecord) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let timeout = self.timeout;

        tokio::spawn(async move {
            match with_timeout("match log insert", timeout, store.insert_match_log(&record)).await {
                Ok(()) => tracing::debug!(
                    "Match log written for {} ({} entries)",
                    record.user_id,
                    record.top_matches.len()
                ),
                Err(e) => tracing::error!("Failed to write match log for {}: {}", record.user_id, e),
            }
        })
    }
}
