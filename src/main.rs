use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use std::sync::Arc;

mod api;
mod config;
mod db;
mod docs;
mod domain;
mod error;
mod model;
mod models;
mod routes;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::domain::AppState;
use crate::routes::Routes;
use crate::store::mysql::MySqlStore;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Tokens loaded into the filter per batch at startup.
const FILTER_WARMUP_BATCH: usize = 500;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config).await?;
    let state = Data::new(AppState::new(Arc::new(MySqlStore::new(pool))));
    let routes = Routes::new(&config)?;

    let warmup_state = state.clone();
    actix_web::rt::spawn(async move {
        let filter = warmup_state.issuer.filter();
        if let Err(e) = filter
            .warmup(warmup_state.store.as_ref(), FILTER_WARMUP_BATCH)
            .await
        {
            error!(error = %e, "Failed to warm up token filter");
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .configure(|cfg| routes.configure(cfg))
    })
    .bind(&config.server_addr)
    .with_context(|| format!("failed to bind {}", config.server_addr))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
