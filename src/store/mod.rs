//! Storage handle shared by every request.
//!
//! The domain layer only talks to [`Store`]; production wires in [`mysql::MySqlStore`],
//! tests use the in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::Display;
use futures_util::stream::BoxStream;

use crate::model::{
    attendance::AttendanceMark,
    class::{Class, NewClass},
    classroom::{Classroom, NewClassroom},
    enrollment::Enrollment,
    record::{Record, RosterEntry},
    student::{NewStudent, Student},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Display)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[display(fmt = "unique constraint violated")]
    Duplicate,
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "corrupt row: {}", _0)]
    Corrupt(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Database(err),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // students
    async fn token_exists(&self, token: u32) -> StoreResult<bool>;
    /// Every issued token, for warming the in-process token filter.
    fn token_stream(&self) -> BoxStream<'_, StoreResult<u32>>;
    async fn insert_student(&self, student: NewStudent) -> StoreResult<Student>;
    async fn student_by_token(&self, token: u32) -> StoreResult<Option<Student>>;
    async fn student_by_id(&self, id: u64) -> StoreResult<Option<Student>>;

    // classrooms
    async fn insert_classroom(&self, classroom: NewClassroom) -> StoreResult<Classroom>;
    async fn classrooms(&self) -> StoreResult<Vec<Classroom>>;
    async fn classroom(&self, id: u64) -> StoreResult<Option<Classroom>>;
    async fn classrooms_of_student(&self, student_id: u64) -> StoreResult<Vec<Classroom>>;

    // classes
    async fn insert_class(&self, class: NewClass) -> StoreResult<Class>;
    async fn class(&self, id: u64) -> StoreResult<Option<Class>>;
    /// Classes of a classroom ordered by start time.
    async fn classes(&self, classroom_id: u64) -> StoreResult<Vec<Class>>;
    async fn count_classes(&self, classroom_id: u64) -> StoreResult<u64>;
    async fn earliest_class_start(&self, classroom_id: u64) -> StoreResult<Option<DateTime<Utc>>>;

    // enrollment
    async fn enrollment_exists(&self, student_id: u64, classroom_id: u64) -> StoreResult<bool>;
    /// Fails with [`StoreError::Duplicate`] when the pair is already enrolled.
    async fn insert_enrollment(
        &self,
        student_id: u64,
        classroom_id: u64,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<Enrollment>;

    // attendance
    /// Enrolled students of a classroom with their counters, ascending student id.
    async fn roster(&self, classroom_id: u64) -> StoreResult<Vec<RosterEntry>>;
    async fn record(&self, student_id: u64, classroom_id: u64) -> StoreResult<Option<Record>>;
    /// Replaces the (student, class) event and moves the classroom aggregate by
    /// the status delta, as one atomic unit. Returns the updated aggregate.
    async fn record_attendance(&self, mark: AttendanceMark) -> StoreResult<Record>;
}
