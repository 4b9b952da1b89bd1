use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn from_presence(is_present: bool) -> Self {
        if is_present {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Absent
        }
    }
}

/// A write request against the event table and the classroom aggregate.
#[derive(Debug, Clone)]
pub struct AttendanceMark {
    pub student_id: u64,
    pub class_id: u64,
    pub classroom_id: u64,
    pub status: AttendanceStatus,
    pub attended_at: DateTime<Utc>,
}
