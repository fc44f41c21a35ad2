use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build coordinates only when both halves are present and finite
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Self::new(lat, lon)),
            _ => None,
        }
    }
}

/// Stored match preferences for a user. Every field may be null in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchPreferences {
    pub user_id: String,
    #[serde(default)]
    pub preferred_categories: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_radius_km: Option<f64>,
    #[serde(default)]
    pub price_range_min: Option<f64>,
    #[serde(default)]
    pub price_range_max: Option<f64>,
}

/// Fallback values applied when a user has no stored preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceDefaults {
    pub radius_km: f64,
    pub price_min: f64,
    pub price_max: f64,
}

impl Default for PreferenceDefaults {
    fn default() -> Self {
        Self {
            radius_km: 25.0,
            price_min: 0.0,
            price_max: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    #[inline]
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Preferences actually used for scoring, echoed back in the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivePreferences {
    pub categories: Vec<String>,
    pub max_distance_km: f64,
    pub price_range: PriceRange,
}

impl EffectivePreferences {
    /// Merge stored preferences over the configured defaults
    ///
    /// A non-positive or non-finite radius falls back to the default radius.
    pub fn resolve(stored: Option<&MatchPreferences>, defaults: &PreferenceDefaults) -> Self {
        let categories = stored
            .and_then(|p| p.preferred_categories.clone())
            .unwrap_or_default();

        let max_distance_km = stored
            .and_then(|p| p.preferred_radius_km)
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(defaults.radius_km);

        let price_range = PriceRange {
            min: stored
                .and_then(|p| p.price_range_min)
                .unwrap_or(defaults.price_min),
            max: stored
                .and_then(|p| p.price_range_max)
                .unwrap_or(defaults.price_max),
        };

        Self {
            categories,
            max_distance_km,
            price_range,
        }
    }
}

/// Requester profile as stored by the marketplace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl UserProfile {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

/// A completed booking by the requester, with the category of its task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedBooking {
    pub task_id: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Count of the requester's completed bookings per task category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryAffinity(HashMap<String, u32>);

impl CategoryAffinity {
    pub fn from_history(history: &[CompletedBooking]) -> Self {
        let mut counts = HashMap::new();
        for category in history.iter().filter_map(|b| b.category.as_deref()) {
            *counts.entry(category.to_string()).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn count(&self, category: &str) -> Option<u32> {
        self.0.get(category).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u32)> for CategoryAffinity {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Priority tier of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTier {
    Urgent,
    High,
    Standard,
}

impl PriorityTier {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(p) if p.eq_ignore_ascii_case("urgent") => PriorityTier::Urgent,
            Some(p) if p.eq_ignore_ascii_case("high") => PriorityTier::High,
            _ => PriorityTier::Standard,
        }
    }
}

pub const STATUS_OPEN: &str = "open";

/// Treat an explicit JSON `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An open task that may be offered to the requester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTask {
    pub id: String,
    pub title: String,
    pub category: String,
    pub pay_amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub priority: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub status: String,
    /// Owner of the task
    pub user_id: String,
}

impl CandidateTask {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    pub fn priority_tier(&self) -> PriorityTier {
        PriorityTier::parse(self.priority.as_deref())
    }

    pub fn is_open(&self) -> bool {
        self.status == STATUS_OPEN
    }

    /// Whether this task may be offered to `requester_id` at all
    pub fn is_candidate_for(&self, requester_id: &str) -> bool {
        self.is_open() && self.user_id != requester_id
    }
}

/// A scored task returned to the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub task_id: String,
    pub title: String,
    pub category: String,
    pub pay_amount: f64,
    pub location: String,
    pub distance_km: Option<f64>,
    pub match_score: i32,
    pub match_reasons: Vec<String>,
    pub urgency: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One ranked entry kept in the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditedMatch {
    pub task_id: String,
    pub score: i32,
}

/// Append-only analytics record written after a match request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAuditRecord {
    pub user_id: String,
    pub top_matches: Vec<AuditedMatch>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub preferences: EffectivePreferences,
    pub created_at: DateTime<Utc>,
}
