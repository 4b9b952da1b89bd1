use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where the student registered from. Stored, never checked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Location {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "name": "Ada Lovelace",
    "location": { "latitude": 23.8103, "longitude": 90.4125 },
    "login_token": 482913,
    "registered_at": "2026-01-01T09:00:00Z"
}))]
pub struct Student {
    pub id: u64,
    pub name: String,
    #[sqlx(flatten)]
    pub location: Location,
    #[serde(rename = "login_token")]
    pub token: u32,
    #[schema(value_type = String, format = "date-time")]
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub location: Location,
    pub token: u32,
    pub registered_at: DateTime<Utc>,
}
