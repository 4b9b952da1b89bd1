//! Student token issuance and registration.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::RangeInclusive, str::FromStr};
use tracing::{debug, info, instrument, warn};

use crate::{
    domain::AppState,
    error::AppError,
    model::student::{Location, NewStudent, Student},
    store::{Store, StoreError},
    utils::token_filter::TokenFilter,
};

/// Six-digit tokens.
pub const TOKEN_RANGE: RangeInclusive<u32> = 100_000..=999_999;
pub const MAX_ATTEMPTS: usize = 10;

/// A validated student token: always six digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StudentToken(u32);

impl StudentToken {
    pub fn new(value: u32) -> Result<Self, AppError> {
        if TOKEN_RANGE.contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::Validation("Invalid token format".to_string()))
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for StudentToken {
    type Error = AppError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StudentToken> for u32 {
    fn from(token: StudentToken) -> Self {
        token.0
    }
}

impl FromStr for StudentToken {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<u32>()
            .map_err(|_| AppError::Validation("Invalid token format".to_string()))
            .and_then(Self::new)
    }
}

impl fmt::Display for StudentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Draws random tokens until one is unused, giving up after [`MAX_ATTEMPTS`].
pub struct TokenIssuer {
    range: RangeInclusive<u32>,
    filter: TokenFilter,
}

impl TokenIssuer {
    pub fn new(filter: TokenFilter) -> Self {
        Self::with_range(filter, TOKEN_RANGE)
    }

    pub fn with_range(filter: TokenFilter, range: RangeInclusive<u32>) -> Self {
        Self { range, filter }
    }

    pub fn filter(&self) -> &TokenFilter {
        &self.filter
    }

    /// The filter only short-circuits candidates that are probably taken; a
    /// candidate it has never seen is still confirmed against the store.
    pub async fn issue<R>(&self, store: &dyn Store, rng: &mut R) -> Result<StudentToken, AppError>
    where
        R: Rng,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = rng.gen_range(self.range.clone());

            if self.filter.might_exist(candidate) {
                debug!(attempt, "Token candidate rejected by filter");
                continue;
            }

            let taken = store
                .token_exists(candidate)
                .await
                .map_err(AppError::storage("Failed to generate unique token"))?;
            if !taken {
                return StudentToken::new(candidate);
            }

            // issued by another instance since warmup
            self.filter.insert(candidate);
            debug!(attempt, "Token candidate already issued");
        }

        warn!(attempts = MAX_ATTEMPTS, "Token space exhausted");
        Err(AppError::TokenExhausted)
    }
}

/// Issues a token and persists the student with it. A uniqueness violation on
/// insert means a concurrent registration won the same token; it is reported,
/// not retried.
#[instrument(name = "register_student", skip(state, rng, location))]
pub async fn register<R>(
    state: &AppState,
    name: &str,
    location: Location,
    rng: &mut R,
) -> Result<Student, AppError>
where
    R: Rng,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Student name must not be empty".to_string()));
    }

    let token = state.issuer.issue(state.store.as_ref(), rng).await?;

    let student = state
        .store
        .insert_student(NewStudent {
            name: name.to_string(),
            location,
            token: token.value(),
            registered_at: Utc::now(),
        })
        .await
        .map_err(|err| {
            if matches!(err, StoreError::Duplicate) {
                warn!(%token, "Token collided at insert");
            }
            AppError::storage("Failed to register student")(err)
        })?;

    state.issuer.filter().insert(student.token);
    state.students.insert(student.clone()).await;
    info!(student_id = student.id, "Student registered");

    Ok(student)
}
