use moka::future::Cache;
use std::time::Duration;

use crate::{domain::StudentToken, model::student::Student};

/// Token -> student lookups. Students are immutable once registered, so the
/// TTL only bounds memory, never staleness.
pub struct StudentCache {
    inner: Cache<u32, Student>,
}

impl StudentCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(100_000) // tune based on memory
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    pub async fn get(&self, token: StudentToken) -> Option<Student> {
        self.inner.get(&token.value()).await
    }

    pub async fn insert(&self, student: Student) {
        self.inner.insert(student.token, student).await;
    }
}

impl Default for StudentCache {
    fn default() -> Self {
        Self::new()
    }
}
