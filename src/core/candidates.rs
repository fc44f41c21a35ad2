use std::sync::Arc;
use std::time::Duration;
use crate::core::MatchError;
use crate::models::CandidateTask;
use crate::services::{with_timeout, MatchStore};

/// Maximum open tasks fetched per request
///
/// Tasks beyond this ceiling (newest-first) are never considered. Recall is
/// traded for bounded latency; large marketplaces need a higher ceiling or a
/// pre-filter at the data layer (e.g. a bounding-box query).
pub const DEFAULT_CANDIDATE_FETCH_LIMIT: usize = 100;

/// Fetches the open tasks a requester may be matched against
#[derive(Clone)]
pub struct CandidatePool {
    store: Arc<dyn MatchStore>,
    fetch_limit: usize,
    timeout: Duration,
}

impl CandidatePool {
    pub fn new(store: Arc<dyn MatchStore>, fetch_limit: usize, timeout: Duration) -> Self {
        Self {
            store,
            fetch_limit,
            timeout,
        }
    }

    /// Open tasks not owned by `requester_id`, newest first, at most `fetch_limit`
    pub async fn fetch(
        &self,
        requester_id: &str,
        categories: Option<&[String]>,
    ) -> Result<Vec<CandidateTask>, MatchError> {
        let categories = categories.filter(|c| !c.is_empty());

        let tasks = with_timeout(
            "open tasks",
            self.timeout,
            self.store.get_open_tasks(requester_id, categories, self.fetch_limit),
        )
        .await
        .map_err(MatchError::upstream("candidates"))?;

        Ok(enforce_pool_contract(tasks, requester_id, self.fetch_limit))
    }
}

/// Drop ineligible tasks, order newest first and apply the ceiling
pub fn enforce_pool_contract(
    mut tasks: Vec<CandidateTask>,
    requester_id: &str,
    fetch_limit: usize,
) -> Vec<CandidateTask> {
    let fetched = tasks.len();
    tasks.retain(|t| t.is_candidate_for(requester_id));

    if tasks.len() != fetched {
        tracing::warn!(
            "Store returned {} ineligible tasks for {}; dropped",
            fetched - tasks.len(),
            requester_id
        );
    }

    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tasks.truncate(fetch_limit);
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompletedBooking, MatchAuditRecord, MatchPreferences, UserProfile};
    use crate::services::StoreError;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};

    fn task(id: &str, owner: &str, status: &str, minutes_ago: i64) -> CandidateTask {
        CandidateTask {
            id: id.to_string(),
            title: format!("Task {}", id),
            category: "errands".to_string(),
            pay_amount: 25.0,
            location: "Uptown".to_string(),
            latitude: None,
            longitude: None,
            priority: None,
            created_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
            deadline: None,
            status: status.to_string(),
            user_id: owner.to_string(),
        }
    }

    /// A store that ignores every filter it is given
    struct CarelessStore {
        tasks: Vec<CandidateTask>,
    }

    #[async_trait]
    impl MatchStore for CarelessStore {
        async fn get_preferences(&self, _: &str) -> Result<Option<MatchPreferences>, StoreError> {
            Ok(None)
        }

        async fn get_profile(&self, _: &str) -> Result<Option<UserProfile>, StoreError> {
            Ok(None)
        }

        async fn get_completed_bookings(&self, _: &str, _: usize) -> Result<Vec<CompletedBooking>, StoreError> {
            Ok(vec![])
        }

        async fn get_open_tasks(
            &self,
            _: &str,
            _: Option<&[String]>,
            _: usize,
        ) -> Result<Vec<CandidateTask>, StoreError> {
            Ok(self.tasks.clone())
        }

        async fn insert_match_log(&self, _: &MatchAuditRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_pool_enforces_contract_over_careless_store() {
        let mut tasks = vec![
            task("mine", "me", "open", 1),
            task("assigned", "other", "assigned", 2),
        ];
        tasks.extend((0..150).map(|i| task(&format!("t{}", i), "other", "open", 200 - i)));

        let pool = CandidatePool::new(
            Arc::new(CarelessStore { tasks }),
            DEFAULT_CANDIDATE_FETCH_LIMIT,
            Duration::from_secs(1),
        );

        let candidates = pool.fetch("me", None).await.unwrap();

        assert_eq!(candidates.len(), DEFAULT_CANDIDATE_FETCH_LIMIT);
        assert!(candidates.iter().all(|t| t.is_open() && t.user_id != "me"));
        assert!(candidates
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        // newest first: t149 was posted 51 minutes ago
        assert_eq!(candidates[0].id, "t149");
    }

    #[test]
    fn test_enforce_contract_keeps_eligible_order() {
        let tasks = vec![task("a", "x", "open", 30), task("b", "y", "open", 10)];
        let kept = enforce_pool_contract(tasks, "me", 10);
        let ids: Vec<_> = kept.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
