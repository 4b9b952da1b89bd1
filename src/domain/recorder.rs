//! Attendance recorder: one event per (student, class), one aggregate per
//! (student, classroom), moved together.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::{
    domain::{AppState, StudentToken, reader::Tally},
    error::AppError,
    model::attendance::{AttendanceMark, AttendanceStatus},
};

/// Signed change to apply to an aggregate when an event is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delta {
    pub present: i32,
    pub absent: i32,
}

impl Delta {
    fn unit(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => Delta { present: 1, absent: 0 },
            AttendanceStatus::Absent => Delta { present: 0, absent: 1 },
        }
    }

    /// A first mark counts once; a re-mark moves one unit from the old status
    /// to the new one, so the total never grows past the number of classes.
    pub fn between(previous: Option<AttendanceStatus>, current: AttendanceStatus) -> Self {
        let added = Self::unit(current);
        match previous {
            None => added,
            Some(old) => {
                let removed = Self::unit(old);
                Delta {
                    present: added.present - removed.present,
                    absent: added.absent - removed.absent,
                }
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.present == 0 && self.absent == 0
    }
}

impl Tally {
    pub fn apply(self, delta: Delta) -> Tally {
        Tally {
            present: self.present.saturating_add_signed(delta.present),
            absent: self.absent.saturating_add_signed(delta.absent),
        }
    }
}

/// Records the mark and returns the class's meeting link.
#[instrument(skip(state, attended_at))]
pub async fn mark_attendance(
    state: &AppState,
    token: StudentToken,
    class_id: u64,
    status: AttendanceStatus,
    attended_at: DateTime<Utc>,
) -> Result<String, AppError> {
    let student = state.resolve_student(token).await?;

    let class = state
        .store
        .class(class_id)
        .await
        .map_err(AppError::storage("Database error finding class"))?
        .ok_or(AppError::NotFound("Class not found"))?;

    let record = state
        .store
        .record_attendance(AttendanceMark {
            student_id: student.id,
            class_id: class.id,
            classroom_id: class.classroom_id,
            status,
            attended_at,
        })
        .await
        .map_err(AppError::storage("Failed to mark attendance"))?;

    info!(
        student_id = student.id,
        classroom_id = class.classroom_id,
        %status,
        present = record.present_count,
        absent = record.absent_count,
        "Attendance marked"
    );

    Ok(class.meet_link)
}
