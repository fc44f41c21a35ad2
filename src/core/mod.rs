// Core algorithm exports
pub mod audit;
pub mod candidates;
pub mod distance;
pub mod matcher;
pub mod profile;
pub mod scoring;

pub use audit::{AuditLogger, AUDIT_TOP_N};
pub use candidates::{CandidatePool, DEFAULT_CANDIDATE_FETCH_LIMIT};
pub use distance::{distance_between, haversine_distance};
pub use matcher::{Matcher, MatchOutcome, MatchQuery, DEFAULT_MATCH_LIMIT};
pub use profile::{ProfileLoader, RequesterProfile, DEFAULT_HISTORY_WINDOW};
pub use scoring::{score_candidate, ScoreCard, ScoringContext, SCORING_RULES};

use thiserror::Error;
use crate::services::StoreError;

/// Errors that abort a match request
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Failed to load {stage}: {source}")]
    Upstream {
        stage: &'static str,
        #[source]
        source: StoreError,
    },
}

impl MatchError {
    /// Adapter for `map_err` that tags a store error with the stage it hit
    pub fn upstream(stage: &'static str) -> impl FnOnce(StoreError) -> MatchError {
        move |source| MatchError::Upstream { stage, source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            MatchError::Upstream {
                source: StoreError::Timeout { .. },
                ..
            }
        )
    }
}
