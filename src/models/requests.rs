use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::Coordinates;

/// Request to rank open tasks for the authenticated user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SmartMatchRequest {
    /// Informational only; identity comes from the bearer token
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub limit: Option<u32>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

impl SmartMatchRequest {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// The category filter, with an empty list meaning "no filter"
    pub fn category_filter(&self) -> Option<&[String]> {
        self.categories
            .as_deref()
            .filter(|categories| !categories.is_empty())
    }
}
