use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{StreamExt, TryStreamExt, stream::BoxStream};
use sqlx::MySqlPool;
use tracing::debug;

use crate::{
    domain::{reader::Tally, recorder::Delta},
    model::{
        attendance::{AttendanceMark, AttendanceStatus},
        class::{Class, NewClass},
        classroom::{Classroom, NewClassroom},
        enrollment::Enrollment,
        record::{Record, RosterEntry},
        student::{NewStudent, Student},
    },
    store::{Store, StoreError, StoreResult},
};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

#[async_trait]
impl Store for MySqlStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn token_exists(&self, token: u32) -> StoreResult<bool> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE token = ?")
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }

    fn token_stream(&self) -> BoxStream<'_, StoreResult<u32>> {
        sqlx::query_scalar::<_, u32>("SELECT token FROM students")
            .fetch(&self.pool)
            .map_err(StoreError::from)
            .boxed()
    }

    async fn insert_student(&self, student: NewStudent) -> StoreResult<Student> {
        let result = sqlx::query(
            r#"
            INSERT INTO students (name, latitude, longitude, token, registered_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.name)
        .bind(student.location.latitude)
        .bind(student.location.longitude)
        .bind(student.token)
        .bind(student.registered_at)
        .execute(&self.pool)
        .await?;

        Ok(Student {
            id: result.last_insert_id(),
            name: student.name,
            location: student.location,
            token: student.token,
            registered_at: student.registered_at,
        })
    }

    async fn student_by_token(&self, token: u32) -> StoreResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, latitude, longitude, token, registered_at
            FROM students
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn student_by_id(&self, id: u64) -> StoreResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, latitude, longitude, token, registered_at
            FROM students
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn insert_classroom(&self, classroom: NewClassroom) -> StoreResult<Classroom> {
        let result = sqlx::query(
            r#"
            INSERT INTO classrooms (name, description, teacher_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&classroom.name)
        .bind(&classroom.description)
        .bind(&classroom.teacher_name)
        .bind(classroom.created_at)
        .execute(&self.pool)
        .await?;

        Ok(Classroom {
            id: result.last_insert_id(),
            name: classroom.name,
            description: classroom.description,
            teacher_name: classroom.teacher_name,
            created_at: classroom.created_at,
        })
    }

    async fn classrooms(&self) -> StoreResult<Vec<Classroom>> {
        let rows = sqlx::query_as::<_, Classroom>(
            "SELECT id, name, description, teacher_name, created_at FROM classrooms ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn classroom(&self, id: u64) -> StoreResult<Option<Classroom>> {
        let row = sqlx::query_as::<_, Classroom>(
            "SELECT id, name, description, teacher_name, created_at FROM classrooms WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn classrooms_of_student(&self, student_id: u64) -> StoreResult<Vec<Classroom>> {
        let rows = sqlx::query_as::<_, Classroom>(
            r#"
            SELECT c.id, c.name, c.description, c.teacher_name, c.created_at
            FROM classrooms c
            INNER JOIN student_classroom_enrollment e ON c.id = e.classroom_id
            WHERE e.student_id = ?
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_class(&self, class: NewClass) -> StoreResult<Class> {
        let result = sqlx::query(
            r#"
            INSERT INTO classes (classroom_id, start_time, end_time, link, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(class.classroom_id)
        .bind(class.start_time)
        .bind(class.end_time)
        .bind(&class.meet_link)
        .bind(class.created_at)
        .execute(&self.pool)
        .await?;

        Ok(Class {
            id: result.last_insert_id(),
            classroom_id: class.classroom_id,
            start_time: class.start_time,
            end_time: class.end_time,
            meet_link: class.meet_link,
            created_at: class.created_at,
        })
    }

    async fn class(&self, id: u64) -> StoreResult<Option<Class>> {
        let row = sqlx::query_as::<_, Class>(
            r#"
            SELECT id, classroom_id, start_time, end_time, link, created_at
            FROM classes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn classes(&self, classroom_id: u64) -> StoreResult<Vec<Class>> {
        let rows = sqlx::query_as::<_, Class>(
            r#"
            SELECT id, classroom_id, start_time, end_time, link, created_at
            FROM classes
            WHERE classroom_id = ?
            ORDER BY start_time ASC, id ASC
            "#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_classes(&self, classroom_id: u64) -> StoreResult<u64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes WHERE classroom_id = ?")
            .bind(classroom_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }

    async fn earliest_class_start(&self, classroom_id: u64) -> StoreResult<Option<DateTime<Utc>>> {
        let start = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MIN(start_time) FROM classes WHERE classroom_id = ?",
        )
        .bind(classroom_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(start)
    }

    async fn enrollment_exists(&self, student_id: u64, classroom_id: u64) -> StoreResult<bool> {
        let n = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM student_classroom_enrollment
            WHERE student_id = ? AND classroom_id = ?
            "#,
        )
        .bind(student_id)
        .bind(classroom_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(n > 0)
    }

    async fn insert_enrollment(
        &self,
        student_id: u64,
        classroom_id: u64,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<Enrollment> {
        let result = sqlx::query(
            r#"
            INSERT INTO student_classroom_enrollment (student_id, classroom_id, joined_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(classroom_id)
        .bind(joined_at)
        .execute(&self.pool)
        .await?;

        Ok(Enrollment {
            id: result.last_insert_id(),
            student_id,
            classroom_id,
            joined_at,
        })
    }

    async fn roster(&self, classroom_id: u64) -> StoreResult<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, (u64, String, Option<u32>, Option<u32>)>(
            r#"
            SELECT s.id, s.name, r.present_count, r.absent_count
            FROM students s
            INNER JOIN student_classroom_enrollment e ON s.id = e.student_id
            LEFT JOIN record r ON r.student_id = s.id AND r.classroom_id = e.classroom_id
            WHERE e.classroom_id = ?
            ORDER BY s.id ASC
            "#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(student_id, name, present, absent)| RosterEntry {
                student_id,
                name,
                tally: Tally {
                    present: present.unwrap_or(0),
                    absent: absent.unwrap_or(0),
                },
            })
            .collect())
    }

    async fn record(&self, student_id: u64, classroom_id: u64) -> StoreResult<Option<Record>> {
        let row = sqlx::query_as::<_, Record>(
            r#"
            SELECT student_id, classroom_id, present_count, absent_count, last_attended
            FROM record
            WHERE student_id = ? AND classroom_id = ?
            "#,
        )
        .bind(student_id)
        .bind(classroom_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn record_attendance(&self, mark: AttendanceMark) -> StoreResult<Record> {
        let mut tx = self.pool.begin().await?;

        // Lock the previous decision so concurrent re-marks serialize here.
        // Two concurrent first marks for the same pair both hold a gap lock on
        // the missing row; MySQL aborts one with a deadlock, surfaced as a 500.
        let previous = sqlx::query_scalar::<_, String>(
            "SELECT status FROM attendance WHERE student_id = ? AND class_id = ? FOR UPDATE",
        )
        .bind(mark.student_id)
        .bind(mark.class_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|raw| {
            raw.parse::<AttendanceStatus>()
                .map_err(|_| StoreError::Corrupt(format!("unknown attendance status {raw:?}")))
        })
        .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO attendance (student_id, class_id, status, attended_at)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE status = VALUES(status), attended_at = VALUES(attended_at)
            "#,
        )
        .bind(mark.student_id)
        .bind(mark.class_id)
        .bind(mark.status.as_ref())
        .bind(mark.attended_at)
        .execute(&mut *tx)
        .await?;

        let delta = Delta::between(previous, mark.status);
        let seed = Tally::default().apply(delta);
        if delta.is_zero() {
            debug!(?previous, "Status unchanged, counters kept");
        } else {
            debug!(?previous, ?delta, "Applying attendance delta");
        }

        sqlx::query(
            r#"
            INSERT INTO record (student_id, classroom_id, present_count, absent_count, last_attended)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                present_count = GREATEST(CAST(present_count AS SIGNED) + ?, 0),
                absent_count = GREATEST(CAST(absent_count AS SIGNED) + ?, 0),
                last_attended = VALUES(last_attended)
            "#,
        )
        .bind(mark.student_id)
        .bind(mark.classroom_id)
        .bind(seed.present)
        .bind(seed.absent)
        .bind(mark.attended_at)
        .bind(delta.present)
        .bind(delta.absent)
        .execute(&mut *tx)
        .await?;

        let record = sqlx::query_as::<_, Record>(
            r#"
            SELECT student_id, classroom_id, present_count, absent_count, last_attended
            FROM record
            WHERE student_id = ? AND classroom_id = ?
            "#,
        )
        .bind(mark.student_id)
        .bind(mark.classroom_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }
}
