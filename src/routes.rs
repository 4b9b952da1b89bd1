use crate::{
    api::{attendance, class, classroom, export, health, student},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Route table plus the per-IP limiters. Built once and shared by every worker
/// so the limits hold across the whole server.
#[derive(Clone)]
pub struct Routes {
    api_prefix: String,
    register_limiter: Limiter,
    api_limiter: Limiter,
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let per_ms = 60_000 / u64::from(requests_per_min.max(1));
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

impl Routes {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            api_prefix: config.api_prefix.clone(),
            register_limiter: build_limiter(config.rate_register_per_min)?,
            api_limiter: build_limiter(config.rate_api_per_min)?,
        })
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected JSON body");
            AppError::Validation("Invalid request payload".to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected path parameter");
            AppError::Validation(path_error_message(&err.to_string())).into()
        }))
        .route("/health", web::get().to(health::health));

        cfg.service(
            web::scope(&self.api_prefix)
                .wrap(self.api_limiter.clone())
                .service(
                    web::scope("/student")
                        // /student/register
                        .service(
                            web::resource("/register")
                                .wrap(self.register_limiter.clone())
                                .route(web::post().to(student::register_student)),
                        )
                        // /student/user/{token}
                        .service(
                            web::resource("/user/{token}").route(web::get().to(student::get_student)),
                        )
                        // /student/{token}/classrooms
                        .service(
                            web::resource("/{token}/classrooms")
                                .route(web::get().to(student::student_classrooms)),
                        )
                        // /student/{token}/classes/{id}/attendance
                        .service(
                            web::resource("/{token}/classes/{id}/attendance")
                                .route(web::post().to(attendance::mark_attendance)),
                        ),
                )
                // /students/{token}/classrooms/{classroom_id}/progress
                .service(
                    web::resource("/students/{token}/classrooms/{classroom_id}/progress")
                        .route(web::get().to(attendance::student_progress)),
                )
                .service(
                    web::scope("/classrooms")
                        // /classrooms
                        .service(
                            web::resource("")
                                .route(web::post().to(classroom::create_classroom))
                                .route(web::get().to(classroom::list_classrooms)),
                        )
                        // /classrooms/{id}
                        .service(
                            web::resource("/{id}").route(web::get().to(classroom::classroom_detail)),
                        )
                        // /classrooms/{id}/join
                        .service(
                            web::resource("/{id}/join")
                                .route(web::post().to(classroom::join_classroom)),
                        )
                        // /classrooms/{id}/classes
                        .service(
                            web::resource("/{id}/classes")
                                .route(web::post().to(class::create_class))
                                .route(web::get().to(class::list_classes)),
                        )
                        // /classrooms/{id}/students/{student_id}/attendance
                        .service(
                            web::resource("/{id}/students/{student_id}/attendance")
                                .route(web::get().to(attendance::student_attendance)),
                        )
                        // /classrooms/{id}/export
                        .service(
                            web::resource("/{id}/export")
                                .route(web::get().to(export::export_attendance)),
                        ),
                ),
        );
    }
}

/// Token parse failures carry their own message; anything else is a bad id.
fn path_error_message(detail: &str) -> String {
    if detail.contains("Invalid token format") {
        "Invalid token format".to_string()
    } else {
        "Invalid path parameter".to_string()
    }
}
