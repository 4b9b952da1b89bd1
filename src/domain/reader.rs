//! Attendance statistics for every read path.
//!
//! Classroom detail, per-student detail, student history and the CSV export all
//! derive their numbers from [`Tally::percentage`] over the stored aggregate.
//! None of them look at individual attendance events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    domain::{AppState, StudentToken},
    error::AppError,
    model::{classroom::Classroom, record::RosterEntry},
};

/// Present/absent counters of one student within one classroom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub present: u32,
    pub absent: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.present + self.absent
    }

    /// `present / total * 100`, or `0.0` when nothing has been recorded.
    pub fn percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.present) / f64::from(total) * 100.0
    }
}

/// Two-decimal rendering used by the CSV export only.
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.2}")
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RosterStudent {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = 4)]
    pub total_classes: u32,
    #[schema(example = 3)]
    pub present_count: u32,
    #[schema(example = 1)]
    pub absent_count: u32,
    #[schema(example = 75.0)]
    pub attendance_percentage: f64,
}

impl From<RosterEntry> for RosterStudent {
    fn from(entry: RosterEntry) -> Self {
        Self {
            id: entry.student_id,
            name: entry.name,
            total_classes: entry.tally.total(),
            present_count: entry.tally.present,
            absent_count: entry.tally.absent,
            attendance_percentage: entry.tally.percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClassroomDetail {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub teacher_name: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    pub total_students: usize,
    pub classes_conducted: u64,
    pub students: Vec<RosterStudent>,
}

/// Attendance summary of one student in one classroom.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StudentProgress {
    pub id: u64,
    pub name: String,
    pub total_class_taken: u32,
    pub present_count: u32,
    pub absent_count: u32,
    pub attendance_percentage: f64,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_attended: Option<DateTime<Utc>>,
}

/// The roster shared by the classroom detail and the CSV export.
pub async fn roster(state: &AppState, classroom_id: u64) -> Result<Vec<RosterStudent>, AppError> {
    let entries = state
        .store
        .roster(classroom_id)
        .await
        .map_err(AppError::storage("Failed to fetch student data"))?;

    Ok(entries.into_iter().map(RosterStudent::from).collect())
}

#[instrument(skip(state))]
pub async fn classroom_detail(state: &AppState, classroom_id: u64) -> Result<ClassroomDetail, AppError> {
    let Classroom {
        id,
        name,
        description,
        teacher_name,
        created_at,
    } = state
        .store
        .classroom(classroom_id)
        .await
        .map_err(AppError::storage("Database error"))?
        .ok_or(AppError::NotFound("Classroom not found"))?;

    let classes_conducted = state
        .store
        .count_classes(classroom_id)
        .await
        .map_err(AppError::storage("Failed to count classes"))?;

    let students = roster(state, classroom_id).await?;

    Ok(ClassroomDetail {
        id,
        name,
        description,
        teacher_name,
        created_at,
        total_students: students.len(),
        classes_conducted,
        students,
    })
}

/// Progress of a student addressed by id; the student must be enrolled.
#[instrument(skip(state))]
pub async fn enrolled_student_progress(
    state: &AppState,
    classroom_id: u64,
    student_id: u64,
) -> Result<StudentProgress, AppError> {
    let student = state
        .store
        .student_by_id(student_id)
        .await
        .map_err(AppError::storage("Database error fetching student"))?
        .ok_or(AppError::NotFound("Student not found"))?;

    let enrolled = state
        .store
        .enrollment_exists(student.id, classroom_id)
        .await
        .map_err(AppError::storage("Failed to check enrollment"))?;
    if !enrolled {
        return Err(AppError::NotFound("Student not enrolled in this classroom"));
    }

    progress(state, student.id, student.name, classroom_id).await
}

/// Progress of a student addressed by token (the student's own history view).
#[instrument(skip(state))]
pub async fn history(
    state: &AppState,
    token: StudentToken,
    classroom_id: u64,
) -> Result<StudentProgress, AppError> {
    let student = state.resolve_student(token).await?;

    state
        .store
        .classroom(classroom_id)
        .await
        .map_err(AppError::storage("Database error"))?
        .ok_or(AppError::NotFound("Classroom not found"))?;

    progress(state, student.id, student.name, classroom_id).await
}

async fn progress(
    state: &AppState,
    student_id: u64,
    name: String,
    classroom_id: u64,
) -> Result<StudentProgress, AppError> {
    let record = state
        .store
        .record(student_id, classroom_id)
        .await
        .map_err(AppError::storage("Failed to fetch attendance record"))?;

    let tally = record.as_ref().map(|r| r.tally()).unwrap_or_default();

    Ok(StudentProgress {
        id: student_id,
        name,
        total_class_taken: tally.total(),
        present_count: tally.present,
        absent_count: tally.absent,
        attendance_percentage: tally.percentage(),
        last_attended: record.and_then(|r| r.last_attended),
    })
}
