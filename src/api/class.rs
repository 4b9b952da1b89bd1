use actix_web::{Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    domain::AppState,
    error::AppError,
    model::class::{Class, NewClass},
    models::ClassReq,
    utils::response,
};

#[derive(Serialize, ToSchema)]
pub struct ClassListResponse {
    pub classroom_id: u64,
    pub classes: Vec<Class>,
}

/// Parses and checks a class's schedule: both RFC 3339, end strictly after start.
pub fn class_times(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start_time = DateTime::parse_from_rfc3339(start)
        .map_err(|_| AppError::Validation("Invalid start_time format. Use RFC3339".to_string()))?
        .with_timezone(&Utc);

    let end_time = DateTime::parse_from_rfc3339(end)
        .ok()
        .map(|t| t.with_timezone(&Utc))
        .filter(|end_time| *end_time > start_time)
        .ok_or_else(|| {
            AppError::Validation("Invalid end_time. It must be after start_time".to_string())
        })?;

    Ok((start_time, end_time))
}

/// Schedule a class in a classroom
#[utoipa::path(
    post,
    path = "/api/classrooms/{id}/classes",
    params(
        ("id" = u64, Path, description = "Classroom ID")
    ),
    request_body = ClassReq,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Bad times or missing link", body = Object, example = json!({
            "status": "error",
            "message": "Invalid end_time. It must be after start_time"
        })),
        (status = 404, description = "Classroom not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Class"
)]
pub async fn create_class(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<ClassReq>,
) -> Result<impl Responder, AppError> {
    let classroom_id = path.into_inner();

    let (start_time, end_time) = class_times(&payload.start_time, &payload.end_time)?;

    let meet_link = payload.link.trim();
    if meet_link.is_empty() {
        return Err(AppError::Validation("Meeting link is required".to_string()));
    }

    state
        .store
        .classroom(classroom_id)
        .await
        .map_err(AppError::storage("Database error"))?
        .ok_or(AppError::NotFound("Classroom not found"))?;

    let class = state
        .store
        .insert_class(NewClass {
            classroom_id,
            start_time,
            end_time,
            meet_link: meet_link.to_string(),
            created_at: Utc::now(),
        })
        .await
        .map_err(AppError::storage("Failed to create class"))?;

    info!(classroom_id, class_id = class.id, "Class created");
    Ok(response::created("Class created successfully", class))
}

/// Classes of a classroom, earliest start first
#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/classes",
    params(
        ("id" = u64, Path, description = "Classroom ID")
    ),
    responses(
        (status = 200, description = "Classes ordered by start time", body = ClassListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Class"
)]
pub async fn list_classes(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let classroom_id = path.into_inner();

    let classes = state
        .store
        .classes(classroom_id)
        .await
        .map_err(AppError::storage("Database error while fetching classes"))?;

    Ok(response::ok(
        "Classes retrieved successfully",
        ClassListResponse {
            classroom_id,
            classes,
        },
    ))
}
