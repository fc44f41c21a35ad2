use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use crate::models::{CandidateTask, CompletedBooking, MatchAuditRecord, MatchPreferences, UserProfile};
use crate::services::{MatchStore, StoreError};

/// Direct PostgreSQL access to the marketplace tables
///
/// Used when the service runs next to the database instead of going through
/// the REST gateway. The schema belongs to the marketplace; this client only
/// reads it and appends to `match_logs`.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection string
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }
}

fn task_from_row(row: &PgRow) -> Result<CandidateTask, sqlx::Error> {
    Ok(CandidateTask {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        category: row.try_get("category")?,
        pay_amount: row.try_get("pay_amount")?,
        location: row.try_get("location")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        priority: row.try_get("priority")?,
        created_at: row.try_get("created_at")?,
        deadline: row.try_get("deadline")?,
        status: row.try_get("status")?,
        user_id: row.try_get("user_id")?,
    })
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn get_preferences(&self, user_id: &str) -> Result<Option<MatchPreferences>, StoreError> {
        let query = r#"
            SELECT
                user_id::text AS user_id,
                preferred_categories,
                preferred_radius_km::float8 AS preferred_radius_km,
                price_range_min::float8 AS price_range_min,
                price_range_max::float8 AS price_range_max
            FROM match_preferences
            WHERE user_id::text = $1
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<MatchPreferences, StoreError> {
            Ok(MatchPreferences {
                user_id: row.try_get("user_id")?,
                preferred_categories: row.try_get("preferred_categories")?,
                preferred_radius_km: row.try_get("preferred_radius_km")?,
                price_range_min: row.try_get("price_range_min")?,
                price_range_max: row.try_get("price_range_max")?,
            })
        })
        .transpose()
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let query = r#"
            SELECT
                id::text AS id,
                latitude::float8 AS latitude,
                longitude::float8 AS longitude
            FROM profiles
            WHERE id::text = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<UserProfile, StoreError> {
            Ok(UserProfile {
                id: row.try_get("id")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
            })
        })
        .transpose()
    }

    async fn get_completed_bookings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CompletedBooking>, StoreError> {
        let query = r#"
            SELECT b.task_id::text AS task_id, t.category
            FROM bookings b
            LEFT JOIN tasks t ON t.id = b.task_id
            WHERE b.worker_id::text = $1 AND b.status = 'completed'
            ORDER BY b.updated_at DESC
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let history = rows
            .iter()
            .map(|row| -> Result<CompletedBooking, sqlx::Error> {
                Ok(CompletedBooking {
                    task_id: row.try_get("task_id")?,
                    category: row.try_get("category")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!("User {} has {} completed bookings in window", user_id, history.len());

        Ok(history)
    }

    async fn get_open_tasks(
        &self,
        exclude_owner: &str,
        categories: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<CandidateTask>, StoreError> {
        let query = r#"
            SELECT
                id::text AS id,
                title,
                category,
                pay_amount::float8 AS pay_amount,
                COALESCE(location, '') AS location,
                latitude::float8 AS latitude,
                longitude::float8 AS longitude,
                priority,
                created_at,
                deadline,
                status,
                user_id::text AS user_id
            FROM tasks
            WHERE status = 'open'
              AND user_id::text <> $1
              AND ($2::text[] IS NULL OR category = ANY($2))
            ORDER BY created_at DESC
            LIMIT $3
        "#;

        let categories: Option<Vec<String>> = categories
            .filter(|c| !c.is_empty())
            .map(|c| c.to_vec());

        let rows = sqlx::query(query)
            .bind(exclude_owner)
            .bind(categories)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let tasks = rows
            .iter()
            .map(task_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!("Fetched {} open tasks excluding owner {}", tasks.len(), exclude_owner);

        Ok(tasks)
    }

    async fn insert_match_log(&self, record: &MatchAuditRecord) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO match_logs (user_id, top_matches, latitude, longitude, preferences, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;

        sqlx::query(query)
            .bind(&record.user_id)
            .bind(Json(record.top_matches.clone()))
            .bind(record.latitude)
            .bind(record.longitude)
            .bind(Json(record.preferences.clone()))
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Recorded match log for user {}", record.user_id);

        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
