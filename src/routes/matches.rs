use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;
use crate::auth::{AuthenticatedUser, JwtValidator};
use crate::config::MatchingSettings;
use crate::core::{AuditLogger, CandidatePool, MatchQuery, Matcher, ProfileLoader};
use crate::models::{HealthResponse, PreferenceDefaults, SmartMatchRequest, SmartMatchResponse};
use crate::routes::error::ApiError;
use crate::services::{with_timeout, MatchStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MatchStore>,
    pub profiles: ProfileLoader,
    pub candidates: CandidatePool,
    pub matcher: Matcher,
    pub audit: AuditLogger,
    pub auth: Arc<JwtValidator>,
    pub matching: MatchingSettings,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MatchStore>,
        auth: JwtValidator,
        matching: MatchingSettings,
        defaults: PreferenceDefaults,
    ) -> Self {
        let timeout = matching.store_timeout();

        Self {
            profiles: ProfileLoader::new(Arc::clone(&store), matching.history_window, timeout),
            candidates: CandidatePool::new(Arc::clone(&store), matching.candidate_fetch_limit, timeout),
            matcher: Matcher::new(defaults),
            audit: AuditLogger::new(Arc::clone(&store), matching.audit_timeout()),
            auth: Arc::new(auth),
            store,
            matching,
        }
    }
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/smart", web::post().to(smart_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = with_timeout("health check", state.matching.store_timeout(), state.store.health_check())
        .await
        .unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Smart match endpoint
///
/// POST /api/v1/matches/smart
///
/// Request body:
/// ```json
/// {
///   "user_id": "string",
///   "latitude": 40.71,
///   "longitude": -74.0,
///   "limit": 20,
///   "categories": ["cleaning"]
/// }
/// ```
async fn smart_match(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<SmartMatchRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for smart match request: {}", errors);
        return Err(ApiError::BadRequest(format!("Validation failed: {}", errors)));
    }

    let user_id = user.user_id.as_str();
    let request_id = uuid::Uuid::new_v4();

    if let Some(claimed) = req.user_id.as_deref().filter(|claimed| *claimed != user_id) {
        tracing::debug!(%request_id, "Body user_id {} ignored in favour of token subject {}", claimed, user_id);
    }

    let limit = state.matching.resolve_limit(req.limit);
    let category_filter = req.category_filter();

    tracing::info!(%request_id, "Finding smart matches for user: {}, limit: {}", user_id, limit);

    let (profile, candidates) = tokio::try_join!(
        state.profiles.load(user_id),
        state.candidates.fetch(user_id, category_filter)
    )?;

    let request_location = req.coordinates();
    let location = request_location.or_else(|| {
        if state.matching.use_profile_location {
            profile.profile.as_ref().and_then(|p| p.coordinates())
        } else {
            None
        }
    });

    tracing::debug!(%request_id, "Scoring {} candidates for {}", candidates.len(), user_id);

    let now = chrono::Utc::now();
    let outcome = state.matcher.find_matches(
        &profile,
        candidates,
        &MatchQuery {
            requester_id: user_id,
            location,
            category_filter,
            limit,
            now,
        },
    );

    if !outcome.matches.is_empty() {
        let record = state.audit.build_record(
            user_id,
            &outcome.matches,
            request_location,
            &outcome.preferences,
            now,
        );
        // detached: the response never waits on the audit write
        drop(state.audit.spawn(record));
    }

    tracing::info!(
        %request_id,
        "Returning {} matches for user {} (from {} candidates)",
        outcome.matches.len(),
        user_id,
        outcome.total_available
    );

    Ok(HttpResponse::Ok().json(SmartMatchResponse {
        success: true,
        matches: outcome.matches,
        total_available: outcome.total_available,
        user_preferences: outcome.preferences,
    }))
}
