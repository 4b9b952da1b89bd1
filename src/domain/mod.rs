pub mod guard;
pub mod issuer;
pub mod reader;
pub mod recorder;

use std::sync::Arc;
use tracing::debug;

pub use issuer::{StudentToken, TokenIssuer};

use crate::{
    error::AppError,
    model::student::Student,
    store::Store,
    utils::{student_cache::StudentCache, token_filter::TokenFilter},
};

/// Process-wide state handed to every request through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub issuer: TokenIssuer,
    pub students: StudentCache,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            issuer: TokenIssuer::new(TokenFilter::new()),
            students: StudentCache::new(),
        }
    }

    /// Looks a student up by token, cache first. Students never change after
    /// registration so a cached entry is always current.
    pub async fn resolve_student(&self, token: StudentToken) -> Result<Student, AppError> {
        if let Some(student) = self.students.get(token).await {
            return Ok(student);
        }

        let student = self
            .store
            .student_by_token(token.value())
            .await
            .map_err(AppError::storage("Database error finding student"))?
            .ok_or(AppError::NotFound("Student not found"))?;

        debug!(student_id = student.id, "Student loaded from store");
        self.students.insert(student.clone()).await;
        Ok(student)
    }
}
