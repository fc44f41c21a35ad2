use serde::{Deserialize, Serialize};
use crate::models::domain::{EffectivePreferences, MatchResult};

/// Response for the smart match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartMatchResponse {
    pub success: bool,
    pub matches: Vec<MatchResult>,
    pub total_available: usize,
    pub user_preferences: EffectivePreferences,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
