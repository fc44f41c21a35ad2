use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use crate::core::{
    distance::distance_between,
    profile::RequesterProfile,
    scoring::{score_candidate, ScoringContext},
};
use crate::models::{CandidateTask, Coordinates, EffectivePreferences, MatchResult, PreferenceDefaults};

/// Number of matches returned when the caller does not ask for a limit
pub const DEFAULT_MATCH_LIMIT: usize = 20;

/// Per-request inputs that are not stored data
#[derive(Debug, Clone, Copy)]
pub struct MatchQuery<'a> {
    pub requester_id: &'a str,
    pub location: Option<Coordinates>,
    pub category_filter: Option<&'a [String]>,
    pub limit: usize,
    pub now: DateTime<Utc>,
}

/// Ranked output of one match request
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    /// Candidates scored before truncation
    pub total_available: usize,
    pub preferences: EffectivePreferences,
}

/// Scores candidate tasks and assembles the ranked response
///
/// # Pipeline Stages
/// 1. Resolve effective preferences over the configured defaults
/// 2. Drop tasks that are not open or belong to the requester
/// 3. Score every candidate independently
/// 4. Sort with a deterministic tie-break and truncate
#[derive(Debug, Clone)]
pub struct Matcher {
    defaults: PreferenceDefaults,
}

impl Matcher {
    pub fn new(defaults: PreferenceDefaults) -> Self {
        Self { defaults }
    }

    pub fn with_default_preferences() -> Self {
        Self {
            defaults: PreferenceDefaults::default(),
        }
    }

    pub fn defaults(&self) -> &PreferenceDefaults {
        &self.defaults
    }

    /// Rank `candidates` for the requester described by `profile`
    pub fn find_matches(
        &self,
        profile: &RequesterProfile,
        candidates: Vec<CandidateTask>,
        query: &MatchQuery<'_>,
    ) -> MatchOutcome {
        let preferences = EffectivePreferences::resolve(profile.preferences.as_ref(), &self.defaults);

        let mut scored: Vec<MatchResult> = candidates
            .into_iter()
            .filter(|task| task.is_candidate_for(query.requester_id))
            .map(|task| {
                let distance_km = distance_between(query.location, task.coordinates());
                let card = score_candidate(&ScoringContext {
                    task: &task,
                    preferences: &preferences,
                    affinity: &profile.affinity,
                    category_filter: query.category_filter,
                    distance_km,
                    now: query.now,
                });

                MatchResult {
                    task_id: task.id,
                    title: task.title,
                    category: task.category,
                    pay_amount: task.pay_amount,
                    location: task.location,
                    distance_km: card.distance_km.map(round_km),
                    match_score: card.score,
                    match_reasons: card.reasons,
                    urgency: task.priority,
                    created_at: task.created_at,
                }
            })
            .collect();

        let total_available = scored.len();

        scored.sort_by(compare_ranked);
        scored.truncate(query.limit);

        MatchOutcome {
            matches: scored,
            total_available,
            preferences,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_preferences()
    }
}

/// Ranking order: score descending, then newest first, then task id
pub fn compare_ranked(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.match_score
        .cmp(&a.match_score)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.task_id.cmp(&b.task_id))
}

/// Round a distance to one decimal for display
#[inline]
fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}
