// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AuditedMatch, CandidateTask, CategoryAffinity, CompletedBooking, Coordinates, EffectivePreferences,
    MatchAuditRecord, MatchPreferences, MatchResult, PreferenceDefaults, PriceRange, PriorityTier, UserProfile,
};
pub use requests::SmartMatchRequest;
pub use responses::{ErrorResponse, HealthResponse, SmartMatchResponse};
