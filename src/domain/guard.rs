//! Enrollment guard: decides whether a student may still join a classroom.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::{
    domain::{AppState, StudentToken},
    error::AppError,
    model::enrollment::Enrollment,
    store::StoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Open,
    Closed,
}

/// The window closes at the first class's start instant; a classroom with no
/// classes is always open.
pub fn enrollment_window(earliest_start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Window {
    match earliest_start {
        Some(start) if start <= now => Window::Closed,
        _ => Window::Open,
    }
}

#[instrument(skip(state, now))]
pub async fn join_classroom(
    state: &AppState,
    token: StudentToken,
    classroom_id: u64,
    now: DateTime<Utc>,
) -> Result<Enrollment, AppError> {
    let student = state.resolve_student(token).await?;

    state
        .store
        .classroom(classroom_id)
        .await
        .map_err(AppError::storage("Database error"))?
        .ok_or(AppError::NotFound("Classroom not found"))?;

    let enrolled = state
        .store
        .enrollment_exists(student.id, classroom_id)
        .await
        .map_err(AppError::storage("Failed to check enrollment"))?;
    if enrolled {
        return Err(AppError::Conflict("Student already enrolled in this classroom"));
    }

    let earliest = state
        .store
        .earliest_class_start(classroom_id)
        .await
        .map_err(AppError::storage("Failed to check class schedule"))?;
    if enrollment_window(earliest, now) == Window::Closed {
        info!(student_id = student.id, "Enrollment window closed");
        return Err(AppError::WindowClosed);
    }

    let enrollment = state
        .store
        .insert_enrollment(student.id, classroom_id, now)
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => AppError::Conflict("Student already enrolled in this classroom"),
            other => AppError::storage("Failed to enroll student")(other),
        })?;

    info!(student_id = student.id, enrollment_id = enrollment.id, "Student enrolled");
    Ok(enrollment)
}
