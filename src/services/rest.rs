use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use crate::models::{CandidateTask, CompletedBooking, MatchAuditRecord, MatchPreferences, UserProfile};
use crate::services::{MatchStore, StoreError};

const TASK_COLUMNS: &str =
    "id,title,category,pay_amount,location,latitude,longitude,priority,created_at,deadline,status,user_id";

/// REST client for the managed marketplace database
///
/// Talks to a PostgREST-compatible endpoint (`<project>/rest/v1`) using the
/// service key, and handles:
/// - Fetching match preferences and profiles
/// - Fetching completed-booking history and open tasks
/// - Appending match log rows
pub struct RestStore {
    base_url: String,
    api_key: String,
    client: Client,
    tables: RestTables,
}

/// Table names exposed by the REST endpoint
#[derive(Debug, Clone)]
pub struct RestTables {
    pub preferences: String,
    pub profiles: String,
    pub bookings: String,
    pub tasks: String,
    pub match_logs: String,
}

impl Default for RestTables {
    fn default() -> Self {
        Self {
            preferences: "match_preferences".to_string(),
            profiles: "profiles".to_string(),
            bookings: "bookings".to_string(),
            tasks: "tasks".to_string(),
            match_logs: "match_logs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BookingRow {
    task_id: String,
    #[serde(default)]
    tasks: Option<BookingTask>,
}

#[derive(Debug, Deserialize)]
struct BookingTask {
    #[serde(default)]
    category: Option<String>,
}

impl RestStore {
    /// Create a new REST store client
    pub fn new(
        base_url: String,
        api_key: String,
        tables: RestTables,
        request_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn fetch_rows(&self, url: &str, what: &str) -> Result<Vec<Value>, StoreError> {
        tracing::debug!("Fetching {} from: {}", what, url);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = check_status(response, what).await?;

        let json: Value = response.json().await?;
        match json {
            Value::Array(rows) => Ok(rows),
            _ => Err(StoreError::InvalidResponse(format!("Expected a row array for {}", what))),
        }
    }

    async fn fetch_first<T>(&self, url: &str, what: &str) -> Result<Option<T>, StoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let rows = self.fetch_rows(url, what).await?;

        rows.into_iter()
            .next()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
            })
            .transpose()
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read body".to_string());
    tracing::error!("Data store request for {} failed: {} - {}", what, status, body);

    Err(StoreError::ApiError {
        status: status.as_u16(),
        message: format!("Request for {} failed", what),
    })
}

/// Build a PostgREST `in.(...)` filter value with quoted members
fn in_filter(values: &[String]) -> String {
    let members = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({})", members)
}

#[async_trait]
impl MatchStore for RestStore {
    async fn get_preferences(&self, user_id: &str) -> Result<Option<MatchPreferences>, StoreError> {
        let url = format!(
            "{}?select=*&user_id=eq.{}&limit=1",
            self.table_url(&self.tables.preferences),
            urlencoding::encode(user_id)
        );

        self.fetch_first(&url, "preferences").await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let url = format!(
            "{}?select=id,latitude,longitude&id=eq.{}&limit=1",
            self.table_url(&self.tables.profiles),
            urlencoding::encode(user_id)
        );

        self.fetch_first(&url, "profile").await
    }

    async fn get_completed_bookings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CompletedBooking>, StoreError> {
        let url = format!(
            "{}?select=task_id,tasks(category)&worker_id=eq.{}&status=eq.completed&order=updated_at.desc&limit={}",
            self.table_url(&self.tables.bookings),
            urlencoding::encode(user_id),
            limit
        );

        let rows = self.fetch_rows(&url, "booking history").await?;

        rows.into_iter()
            .map(|row| {
                let row: BookingRow = serde_json::from_value(row)
                    .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse booking: {}", e)))?;
                Ok(CompletedBooking {
                    task_id: row.task_id,
                    category: row.tasks.and_then(|t| t.category),
                })
            })
            .collect()
    }

    async fn get_open_tasks(
        &self,
        exclude_owner: &str,
        categories: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<CandidateTask>, StoreError> {
        let mut url = format!(
            "{}?select={}&status=eq.open&user_id=neq.{}&order=created_at.desc&limit={}",
            self.table_url(&self.tables.tasks),
            TASK_COLUMNS,
            urlencoding::encode(exclude_owner),
            limit
        );

        if let Some(categories) = categories.filter(|c| !c.is_empty()) {
            url.push_str("&category=");
            url.push_str(&urlencoding::encode(&in_filter(categories)));
        }

        let rows = self.fetch_rows(&url, "open tasks").await?;

        let tasks = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value::<CandidateTask>(row)
                    .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse task: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} open tasks", tasks.len());

        Ok(tasks)
    }

    async fn insert_match_log(&self, record: &MatchAuditRecord) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.post(self.table_url(&self.tables.match_logs)))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        check_status(response, "match log insert").await?;

        tracing::debug!("Recorded match log for user {}", record.user_id);

        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!("{}?select=id&limit=1", self.table_url(&self.tables.tasks));
        let response = self.authorized(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }
}
