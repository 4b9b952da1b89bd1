use actix_web::{HttpResponse, Responder, web};
use tracing::error;

use crate::{domain::AppState, utils::response::ApiResponse};

/// Liveness check, including a store round-trip
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database reachable", body = Object, example = json!({
            "status": "success",
            "message": "ok"
        })),
        (status = 503, description = "Database unreachable")
    ),
    tag = "Health"
)]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::message("ok")),
        Err(e) => {
            error!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(ApiResponse::error("Database unreachable"))
        }
    }
}
