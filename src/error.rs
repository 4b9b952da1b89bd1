use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use tracing::error;

use crate::{store::StoreError, utils::response::ApiResponse};

/// Every failure a request can end in. The `Display` text is what the client
/// sees in the envelope's `message`.
#[derive(Debug, Display)]
pub enum AppError {
    /// Malformed or missing input, rejected before touching storage.
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    NotFound(&'static str),

    #[display(fmt = "{}", _0)]
    Conflict(&'static str),

    /// The classroom's first class has started.
    #[display(fmt = "Classes already started. Cannot enroll now.")]
    WindowClosed,

    #[display(fmt = "Failed to generate unique token")]
    TokenExhausted,

    #[display(fmt = "{}", context)]
    Storage {
        context: &'static str,
        source: StoreError,
    },

    #[display(fmt = "{}", _0)]
    Internal(&'static str),
}

impl AppError {
    /// Wraps a store failure with the message the client should see, logging
    /// the underlying error.
    pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| {
            error!(error = %source, "{}", context);
            AppError::Storage { context, source }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::WindowClosed => StatusCode::FORBIDDEN,
            AppError::TokenExhausted | AppError::Storage { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::error(self.to_string()))
    }
}
