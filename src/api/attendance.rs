use actix_web::{Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{AppState, StudentToken, reader, recorder},
    error::AppError,
    models::AttendanceReq,
    utils::response,
};

#[derive(Deserialize)]
pub struct MarkPath {
    pub token: StudentToken,
    pub id: u64,
}

#[derive(Deserialize)]
pub struct ProgressPath {
    pub token: StudentToken,
    pub classroom_id: u64,
}

#[derive(Serialize, ToSchema)]
pub struct MeetLink {
    #[schema(example = "https://meet.example.com/abc-defg-hij")]
    pub meet_link: String,
}

/// Mark attendance for a class and get its meeting link
#[utoipa::path(
    post,
    path = "/api/student/{token}/classes/{id}/attendance",
    params(
        ("token" = u32, Path, description = "Six-digit student token"),
        ("id" = u64, Path, description = "Class ID")
    ),
    request_body = AttendanceReq,
    responses(
        (status = 200, description = "Attendance recorded", body = MeetLink),
        (status = 400, description = "Invalid token, class ID or payload"),
        (status = 404, description = "Student or class not found", body = Object, example = json!({
            "status": "error",
            "message": "Class not found"
        }))
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    state: web::Data<AppState>,
    path: web::Path<MarkPath>,
    payload: web::Json<AttendanceReq>,
) -> Result<impl Responder, AppError> {
    let status = payload.status()?;

    let meet_link =
        recorder::mark_attendance(&state, path.token, path.id, status, payload.checked_in_time)
            .await?;

    Ok(response::ok("Attendance marked successfully", MeetLink { meet_link }))
}

/// A student's own attendance history in a classroom
#[utoipa::path(
    get,
    path = "/api/students/{token}/classrooms/{classroom_id}/progress",
    params(
        ("token" = u32, Path, description = "Six-digit student token"),
        ("classroom_id" = u64, Path, description = "Classroom ID")
    ),
    responses(
        (status = 200, description = "Attendance progress", body = StudentProgress),
        (status = 400, description = "Invalid token or classroom ID"),
        (status = 404, description = "Student or classroom not found")
    ),
    tag = "Attendance"
)]
pub async fn student_progress(
    state: web::Data<AppState>,
    path: web::Path<ProgressPath>,
) -> Result<impl Responder, AppError> {
    let progress = reader::history(&state, path.token, path.classroom_id).await?;
    Ok(response::ok("Student attendance progress retrieved", progress))
}

/// Attendance of one enrolled student, as seen by the teacher
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/students/{student_id}/attendance",
    params(
        ("id" = u64, Path, description = "Classroom ID"),
        ("student_id" = u64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Attendance details", body = StudentProgress),
        (status = 404, description = "Student not found or not enrolled", body = Object, example = json!({
            "status": "error",
            "message": "Student not enrolled in this classroom"
        }))
    ),
    tag = "Attendance"
)]
pub async fn student_attendance(
    state: web::Data<AppState>,
    path: web::Path<(u64, u64)>,
) -> Result<impl Responder, AppError> {
    let (classroom_id, student_id) = path.into_inner();
    let progress = reader::enrolled_student_progress(&state, classroom_id, student_id).await?;
    Ok(response::ok("Student attendance details retrieved", progress))
}
