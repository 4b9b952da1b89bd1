use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct Enrollment {
    pub id: u64,
    pub student_id: u64,
    pub classroom_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub joined_at: DateTime<Utc>,
}
