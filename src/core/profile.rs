use std::sync::Arc;
use std::time::Duration;
use crate::core::MatchError;
use crate::models::{CategoryAffinity, MatchPreferences, UserProfile};
use crate::services::{with_timeout, MatchStore};

/// How many recent completed bookings feed the category affinity
pub const DEFAULT_HISTORY_WINDOW: usize = 50;

/// Read-only view of the requester, assembled before scoring starts
#[derive(Debug, Clone, Default)]
pub struct RequesterProfile {
    /// `None` means the user never saved preferences; defaults apply
    pub preferences: Option<MatchPreferences>,
    pub profile: Option<UserProfile>,
    pub affinity: CategoryAffinity,
}

/// Loads preferences, profile and completion history for a requester
#[derive(Clone)]
pub struct ProfileLoader {
    store: Arc<dyn MatchStore>,
    history_window: usize,
    timeout: Duration,
}

impl ProfileLoader {
    pub fn new(store: Arc<dyn MatchStore>, history_window: usize, timeout: Duration) -> Self {
        Self {
            store,
            history_window,
            timeout,
        }
    }

    /// Issue the three reads concurrently and build the category affinity
    ///
    /// Any failed or timed-out read fails the whole load.
    pub async fn load(&self, user_id: &str) -> Result<RequesterProfile, MatchError> {
        let preferences = async {
            with_timeout("preferences", self.timeout, self.store.get_preferences(user_id))
                .await
                .map_err(MatchError::upstream("preferences"))
        };
        let profile = async {
            with_timeout("profile", self.timeout, self.store.get_profile(user_id))
                .await
                .map_err(MatchError::upstream("profile"))
        };
        let history = async {
            with_timeout(
                "booking history",
                self.timeout,
                self.store.get_completed_bookings(user_id, self.history_window),
            )
            .await
            .map_err(MatchError::upstream("booking history"))
        };

        let (preferences, profile, history) = tokio::try_join!(preferences, profile, history)?;

        // the store is asked for the window, but do not trust it blindly
        let window = &history[..history.len().min(self.history_window)];
        let affinity = CategoryAffinity::from_history(window);

        tracing::debug!(
            user_id,
            has_preferences = preferences.is_some(),
            history = window.len(),
            categories = affinity.len(),
            "Loaded requester profile"
        );

        Ok(RequesterProfile {
            preferences,
            profile,
            affinity,
        })
    }
}
