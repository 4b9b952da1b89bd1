use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Distributed Systems",
    "description": "Spring cohort",
    "teacher_name": "Prof. Lamport",
    "created_at": "2026-01-01T08:00:00Z"
}))]
pub struct Classroom {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub teacher_name: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClassroom {
    pub name: String,
    pub description: String,
    pub teacher_name: String,
    pub created_at: DateTime<Utc>,
}
