use actix_web::{Responder, web};
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;
use tracing::info;

use crate::{
    domain::{AppState, StudentToken, issuer},
    error::AppError,
    model::student::Location,
    models::RegisterReq,
    utils::response,
};

#[derive(Deserialize)]
pub struct TokenPath {
    pub token: StudentToken,
}

/// Register a student and issue their token
#[utoipa::path(
    post,
    path = "/api/student/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Student registered", body = Student),
        (status = 400, description = "Invalid request payload", body = Object, example = json!({
            "status": "error",
            "message": "Student name must not be empty"
        })),
        (status = 500, description = "Token space exhausted or database error", body = Object, example = json!({
            "status": "error",
            "message": "Failed to generate unique token"
        }))
    ),
    tag = "Student"
)]
pub async fn register_student(
    state: web::Data<AppState>,
    payload: web::Json<RegisterReq>,
) -> Result<impl Responder, AppError> {
    info!("Registration request received");

    let location = Location {
        latitude: payload.latitude,
        longitude: payload.longitude,
    };
    let mut rng = StdRng::from_entropy();
    let student = issuer::register(&state, &payload.name, location, &mut rng).await?;

    Ok(response::created("Student registered successfully", student))
}

/// Fetch a student by token
#[utoipa::path(
    get,
    path = "/api/student/user/{token}",
    params(
        ("token" = u32, Path, description = "Six-digit student token")
    ),
    responses(
        (status = 200, description = "Student found", body = Student),
        (status = 400, description = "Invalid token format"),
        (status = 404, description = "Student not found", body = Object, example = json!({
            "status": "error",
            "message": "Student not found"
        }))
    ),
    tag = "Student"
)]
pub async fn get_student(
    state: web::Data<AppState>,
    path: web::Path<TokenPath>,
) -> Result<impl Responder, AppError> {
    let student = state.resolve_student(path.token).await?;
    Ok(response::ok("Student retrieved successfully", student))
}

/// Classrooms the student is enrolled in
#[utoipa::path(
    get,
    path = "/api/student/{token}/classrooms",
    params(
        ("token" = u32, Path, description = "Six-digit student token")
    ),
    responses(
        (status = 200, description = "Enrolled classrooms, oldest first", body = [Classroom]),
        (status = 400, description = "Invalid token format"),
        (status = 404, description = "Student not found")
    ),
    tag = "Student"
)]
pub async fn student_classrooms(
    state: web::Data<AppState>,
    path: web::Path<TokenPath>,
) -> Result<impl Responder, AppError> {
    let student = state.resolve_student(path.token).await?;

    let classrooms = state
        .store
        .classrooms_of_student(student.id)
        .await
        .map_err(AppError::storage("Database error while fetching classrooms"))?;

    Ok(response::ok("Classrooms retrieved successfully", classrooms))
}
