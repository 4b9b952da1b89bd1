use actix_web::{Responder, web};
use chrono::Utc;
use tracing::info;

use crate::{
    domain::{AppState, guard, reader},
    error::AppError,
    model::classroom::NewClassroom,
    models::{ClassroomReq, JoinReq},
    utils::response,
};

/// Create a classroom
#[utoipa::path(
    post,
    path = "/api/classrooms",
    request_body = ClassroomReq,
    responses(
        (status = 201, description = "Classroom created", body = Classroom),
        (status = 400, description = "name and teacher_name are required", body = Object, example = json!({
            "status": "error",
            "message": "Invalid request payload. 'name' and 'teacher_name' are required."
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Classroom"
)]
pub async fn create_classroom(
    state: web::Data<AppState>,
    payload: web::Json<ClassroomReq>,
) -> Result<impl Responder, AppError> {
    let ClassroomReq {
        name,
        description,
        teacher_name,
    } = payload.into_inner();

    if name.trim().is_empty() || teacher_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Invalid request payload. 'name' and 'teacher_name' are required.".to_string(),
        ));
    }

    let classroom = state
        .store
        .insert_classroom(NewClassroom {
            name: name.trim().to_string(),
            description,
            teacher_name: teacher_name.trim().to_string(),
            created_at: Utc::now(),
        })
        .await
        .map_err(AppError::storage("Failed to create classroom"))?;

    info!(classroom_id = classroom.id, "Classroom created");
    Ok(response::created("Classroom created successfully", classroom))
}

/// List all classrooms
#[utoipa::path(
    get,
    path = "/api/classrooms",
    responses(
        (status = 200, description = "All classrooms", body = [Classroom]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Classroom"
)]
pub async fn list_classrooms(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let classrooms = state
        .store
        .classrooms()
        .await
        .map_err(AppError::storage("Failed to fetch classrooms"))?;

    Ok(response::ok("Classrooms retrieved successfully", classrooms))
}

/// Classroom detail with the roster and each student's attendance
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}",
    params(
        ("id" = u64, Path, description = "Classroom ID")
    ),
    responses(
        (status = 200, description = "Classroom details", body = ClassroomDetail),
        (status = 404, description = "Classroom not found", body = Object, example = json!({
            "status": "error",
            "message": "Classroom not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Classroom"
)]
pub async fn classroom_detail(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let detail = reader::classroom_detail(&state, path.into_inner()).await?;
    Ok(response::ok("Classroom details retrieved", detail))
}

/// Enroll a student, allowed only before the first class starts
#[utoipa::path(
    post,
    path = "/api/classrooms/{id}/join",
    params(
        ("id" = u64, Path, description = "Classroom ID")
    ),
    request_body = JoinReq,
    responses(
        (status = 200, description = "Student enrolled", body = Enrollment),
        (status = 400, description = "Invalid classroom ID or payload"),
        (status = 403, description = "First class already started", body = Object, example = json!({
            "status": "error",
            "message": "Classes already started. Cannot enroll now."
        })),
        (status = 404, description = "Student or classroom not found"),
        (status = 409, description = "Already enrolled", body = Object, example = json!({
            "status": "error",
            "message": "Student already enrolled in this classroom"
        }))
    ),
    tag = "Classroom"
)]
pub async fn join_classroom(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<JoinReq>,
) -> Result<impl Responder, AppError> {
    let enrollment =
        guard::join_classroom(&state, payload.token, path.into_inner(), Utc::now()).await?;

    Ok(response::ok("Student enrolled in classroom successfully", enrollment))
}
