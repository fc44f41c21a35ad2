//! Smart Match - personalized ranking of open marketplace tasks
//!
//! Given a requesting worker, their stored preferences and their completion
//! history, ranks currently open tasks by an explainable, bounded fit score.

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Matcher, MatchOutcome, MatchQuery, distance::haversine_distance, scoring::score_candidate};
pub use crate::models::{CandidateTask, MatchPreferences, MatchResult, SmartMatchRequest, SmartMatchResponse};
