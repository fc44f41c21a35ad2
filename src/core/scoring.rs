use chrono::{DateTime, Utc};
use crate::models::{CandidateTask, CategoryAffinity, EffectivePreferences, PriorityTier};

/// Score every candidate starts from before adjustments
pub const BASE_SCORE: i32 = 50;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;
/// Maximum number of reasons reported per match
pub const MAX_REASONS: usize = 3;

pub const PREFERRED_CATEGORY_BONUS: i32 = 20;
pub const HISTORY_BONUS_PER_BOOKING: i32 = 2;
pub const HISTORY_BONUS_CAP: i32 = 5;
pub const CATEGORY_FILTER_BONUS: i32 = 5;
pub const VERY_CLOSE_BONUS: i32 = 20;
pub const NEARBY_BONUS: i32 = 15;
pub const WITHIN_RADIUS_BONUS: i32 = 10;
pub const BEYOND_RADIUS_PENALTY: i32 = -10;
pub const PRICE_RANGE_BONUS: i32 = 10;
pub const HIGH_VALUE_BONUS: i32 = 5;
pub const URGENT_BONUS: i32 = 10;
pub const HIGH_PRIORITY_BONUS: i32 = 5;
pub const JUST_POSTED_BONUS: i32 = 10;
pub const RECENTLY_POSTED_BONUS: i32 = 5;
pub const DEADLINE_SOON_BONUS: i32 = 5;

pub const VERY_CLOSE_KM: f64 = 5.0;
pub const NEARBY_KM: f64 = 10.0;
pub const HIGH_VALUE_THRESHOLD: f64 = 100.0;
pub const JUST_POSTED_HOURS: f64 = 1.0;
pub const RECENTLY_POSTED_HOURS: f64 = 6.0;
pub const DEADLINE_SOON_DAYS: f64 = 2.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Everything a rule may look at when judging one candidate
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub task: &'a CandidateTask,
    pub preferences: &'a EffectivePreferences,
    pub affinity: &'a CategoryAffinity,
    pub category_filter: Option<&'a [String]>,
    /// `None` when either side has no coordinates
    pub distance_km: Option<f64>,
    pub now: DateTime<Utc>,
}

impl ScoringContext<'_> {
    /// Hours since posting; a `created_at` ahead of `now` (clock skew) counts as zero
    fn age_hours(&self) -> f64 {
        ((self.now - self.task.created_at).num_milliseconds() as f64 / MILLIS_PER_HOUR).max(0.0)
    }

    fn days_until_deadline(&self) -> Option<f64> {
        self.task
            .deadline
            .map(|deadline| (deadline - self.now).num_milliseconds() as f64 / MILLIS_PER_DAY)
    }
}

/// One entry of the weight table
///
/// `evaluate` returns the adjustment when the rule fires and `None` otherwise.
#[derive(Clone, Copy)]
pub struct ScoringRule {
    pub name: &'static str,
    pub reason: Option<&'static str>,
    pub evaluate: fn(&ScoringContext<'_>) -> Option<i32>,
}

/// The scoring rules, in evaluation order
///
/// Order matters: reasons are reported in this order and only the first
/// three survive. The four distance rules form a first-match chain, so at
/// most one of them fires, and none fires without coordinates.
pub const SCORING_RULES: [ScoringRule; 14] = [
    ScoringRule {
        name: "preferred_category",
        reason: Some("Matches your preferred category"),
        evaluate: preferred_category,
    },
    ScoringRule {
        name: "personal_history",
        reason: Some("You've done similar tasks before"),
        evaluate: personal_history,
    },
    ScoringRule {
        name: "category_filter",
        reason: None,
        evaluate: category_filter,
    },
    ScoringRule {
        name: "very_close",
        reason: Some("Very close to you"),
        evaluate: very_close,
    },
    ScoringRule {
        name: "nearby",
        reason: Some("Nearby location"),
        evaluate: nearby,
    },
    ScoringRule {
        name: "within_radius",
        reason: Some("Within your preferred distance"),
        evaluate: within_radius,
    },
    ScoringRule {
        name: "beyond_radius",
        reason: None,
        evaluate: beyond_radius,
    },
    ScoringRule {
        name: "price_range",
        reason: Some("Matches your price range"),
        evaluate: price_range,
    },
    ScoringRule {
        name: "high_value",
        reason: Some("High-value task"),
        evaluate: high_value,
    },
    ScoringRule {
        name: "urgent",
        reason: Some("Urgent - pays faster"),
        evaluate: urgent,
    },
    ScoringRule {
        name: "high_priority",
        reason: None,
        evaluate: high_priority,
    },
    ScoringRule {
        name: "just_posted",
        reason: Some("Just posted"),
        evaluate: just_posted,
    },
    ScoringRule {
        name: "recently_posted",
        reason: Some("Posted recently"),
        evaluate: recently_posted,
    },
    ScoringRule {
        name: "deadline_soon",
        reason: Some("Deadline soon"),
        evaluate: deadline_soon,
    },
];

fn fires(condition: bool, adjustment: i32) -> Option<i32> {
    condition.then_some(adjustment)
}

fn preferred_category(ctx: &ScoringContext<'_>) -> Option<i32> {
    fires(
        ctx.preferences.categories.iter().any(|c| *c == ctx.task.category),
        PREFERRED_CATEGORY_BONUS,
    )
}

fn personal_history(ctx: &ScoringContext<'_>) -> Option<i32> {
    ctx.affinity.count(&ctx.task.category).map(|count| {
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        count.saturating_mul(HISTORY_BONUS_PER_BOOKING).min(HISTORY_BONUS_CAP)
    })
}

fn category_filter(ctx: &ScoringContext<'_>) -> Option<i32> {
    let filter = ctx.category_filter?;
    fires(filter.iter().any(|c| *c == ctx.task.category), CATEGORY_FILTER_BONUS)
}

fn very_close(ctx: &ScoringContext<'_>) -> Option<i32> {
    let d = ctx.distance_km?;
    fires(d <= VERY_CLOSE_KM, VERY_CLOSE_BONUS)
}

fn nearby(ctx: &ScoringContext<'_>) -> Option<i32> {
    let d = ctx.distance_km?;
    fires(d > VERY_CLOSE_KM && d <= NEARBY_KM, NEARBY_BONUS)
}

fn within_radius(ctx: &ScoringContext<'_>) -> Option<i32> {
    let d = ctx.distance_km?;
    fires(d > NEARBY_KM && d <= ctx.preferences.max_distance_km, WITHIN_RADIUS_BONUS)
}

fn beyond_radius(ctx: &ScoringContext<'_>) -> Option<i32> {
    let d = ctx.distance_km?;
    fires(d > NEARBY_KM && d > ctx.preferences.max_distance_km, BEYOND_RADIUS_PENALTY)
}

fn price_range(ctx: &ScoringContext<'_>) -> Option<i32> {
    fires(ctx.preferences.price_range.contains(ctx.task.pay_amount), PRICE_RANGE_BONUS)
}

fn high_value(ctx: &ScoringContext<'_>) -> Option<i32> {
    fires(ctx.task.pay_amount > HIGH_VALUE_THRESHOLD, HIGH_VALUE_BONUS)
}

fn urgent(ctx: &ScoringContext<'_>) -> Option<i32> {
    fires(ctx.task.priority_tier() == PriorityTier::Urgent, URGENT_BONUS)
}

fn high_priority(ctx: &ScoringContext<'_>) -> Option<i32> {
    fires(ctx.task.priority_tier() == PriorityTier::High, HIGH_PRIORITY_BONUS)
}

fn just_posted(ctx: &ScoringContext<'_>) -> Option<i32> {
    fires(ctx.age_hours() < JUST_POSTED_HOURS, JUST_POSTED_BONUS)
}

fn recently_posted(ctx: &ScoringContext<'_>) -> Option<i32> {
    let hours = ctx.age_hours();
    fires(
        (JUST_POSTED_HOURS..RECENTLY_POSTED_HOURS).contains(&hours),
        RECENTLY_POSTED_BONUS,
    )
}

fn deadline_soon(ctx: &ScoringContext<'_>) -> Option<i32> {
    let days = ctx.days_until_deadline()?;
    fires(days > 0.0 && days <= DEADLINE_SOON_DAYS, DEADLINE_SOON_BONUS)
}

/// A rule that fired for a candidate, with the adjustment it applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedRule {
    pub name: &'static str,
    pub adjustment: i32,
    pub reason: Option<&'static str>,
}

/// Outcome of scoring a single candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub score: i32,
    pub reasons: Vec<String>,
    pub distance_km: Option<f64>,
}

/// Evaluate the rule table against one candidate, in order
pub fn applied_rules(ctx: &ScoringContext<'_>) -> Vec<AppliedRule> {
    SCORING_RULES
        .iter()
        .filter_map(|rule| {
            (rule.evaluate)(ctx).map(|adjustment| AppliedRule {
                name: rule.name,
                adjustment,
                reason: rule.reason,
            })
        })
        .collect()
}

/// Score a candidate task for the requester
///
/// Starts from [`BASE_SCORE`], adds every fired rule's adjustment, then
/// clamps to `[0, 100]`. Reasons keep rule order and are cut to
/// [`MAX_REASONS`].
pub fn score_candidate(ctx: &ScoringContext<'_>) -> ScoreCard {
    let applied = applied_rules(ctx);

    let raw = applied
        .iter()
        .fold(BASE_SCORE, |score, rule| score.saturating_add(rule.adjustment));

    let reasons = applied
        .iter()
        .filter_map(|rule| rule.reason)
        .take(MAX_REASONS)
        .map(str::to_string)
        .collect();

    tracing::trace!(
        task_id = %ctx.task.id,
        raw_score = raw,
        rules = ?applied.iter().map(|r| r.name).collect::<Vec<_>>(),
        "Scored candidate"
    );

    ScoreCard {
        score: raw.clamp(MIN_SCORE, MAX_SCORE),
        reasons,
        distance_km: ctx.distance_km,
    }
}
