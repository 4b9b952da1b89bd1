//! Request bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{domain::StudentToken, error::AppError, model::attendance::AttendanceStatus};

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[serde(default)]
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[serde(default)]
    #[schema(example = 90.4125)]
    pub longitude: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct JoinReq {
    #[schema(example = 482913, value_type = u32)]
    pub token: StudentToken,
}

#[derive(Deserialize, ToSchema)]
pub struct ClassroomReq {
    #[schema(example = "Distributed Systems")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Spring cohort")]
    pub description: String,
    #[schema(example = "Prof. Lamport")]
    pub teacher_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ClassReq {
    #[schema(example = "2026-03-02T09:00:00Z", format = "date-time")]
    pub start_time: String,
    #[schema(example = "2026-03-02T10:30:00Z", format = "date-time")]
    pub end_time: String,
    #[schema(example = "https://meet.example.com/abc-defg-hij")]
    pub link: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AttendanceReq {
    #[schema(example = "2026-03-02T09:03:00Z", value_type = String, format = "date-time")]
    pub checked_in_time: DateTime<Utc>,
    #[schema(example = "present")]
    pub status: Option<AttendanceStatus>,
    /// Older clients send a flag instead of `status`.
    #[schema(example = true)]
    pub is_present: Option<bool>,
}

impl AttendanceReq {
    pub fn status(&self) -> Result<AttendanceStatus, AppError> {
        let legacy = self.is_present.map(AttendanceStatus::from_presence);
        match (self.status, legacy) {
            (Some(status), None) | (None, Some(status)) => Ok(status),
            (Some(status), Some(flag)) if status == flag => Ok(status),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "status and is_present disagree".to_string(),
            )),
            (None, None) => Err(AppError::Validation(
                "Attendance status is required".to_string(),
            )),
        }
    }
}
