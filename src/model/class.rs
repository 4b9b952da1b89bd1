use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// One scheduled session of a classroom.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct Class {
    pub id: u64,
    pub classroom_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub start_time: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub end_time: DateTime<Utc>,
    #[sqlx(rename = "link")]
    #[schema(example = "https://meet.example.com/abc-defg-hij")]
    pub meet_link: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub classroom_id: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub meet_link: String,
    pub created_at: DateTime<Utc>,
}
