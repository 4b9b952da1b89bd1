//! In-memory [`Store`] for tests. One mutex guards every table, so each
//! operation is atomic the way a transaction is in MySQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{StreamExt, stream::BoxStream};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

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

/// The single stored decision for a (student, class) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEvent {
    pub status: AttendanceStatus,
    pub attended_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    students: BTreeMap<u64, Student>,
    classrooms: BTreeMap<u64, Classroom>,
    classes: BTreeMap<u64, Class>,
    enrollments: Vec<Enrollment>,
    events: HashMap<(u64, u64), AttendanceEvent>,
    records: HashMap<(u64, u64), Record>,
}

impl Tables {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn event(&self, student_id: u64, class_id: u64) -> Option<AttendanceEvent> {
        self.lock().events.get(&(student_id, class_id)).cloned()
    }

    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn token_exists(&self, token: u32) -> StoreResult<bool> {
        Ok(self.lock().students.values().any(|s| s.token == token))
    }

    fn token_stream(&self) -> BoxStream<'_, StoreResult<u32>> {
        let tokens: Vec<u32> = self.lock().students.values().map(|s| s.token).collect();
        futures_util::stream::iter(tokens.into_iter().map(Ok)).boxed()
    }

    async fn insert_student(&self, student: NewStudent) -> StoreResult<Student> {
        let mut tables = self.lock();
        if tables.students.values().any(|s| s.token == student.token) {
            return Err(StoreError::Duplicate);
        }
        let id = tables.id();
        let student = Student {
            id,
            name: student.name,
            location: student.location,
            token: student.token,
            registered_at: student.registered_at,
        };
        tables.students.insert(id, student.clone());
        Ok(student)
    }

    async fn student_by_token(&self, token: u32) -> StoreResult<Option<Student>> {
        Ok(self.lock().students.values().find(|s| s.token == token).cloned())
    }

    async fn student_by_id(&self, id: u64) -> StoreResult<Option<Student>> {
        Ok(self.lock().students.get(&id).cloned())
    }

    async fn insert_classroom(&self, classroom: NewClassroom) -> StoreResult<Classroom> {
        let mut tables = self.lock();
        let id = tables.id();
        let classroom = Classroom {
            id,
            name: classroom.name,
            description: classroom.description,
            teacher_name: classroom.teacher_name,
            created_at: classroom.created_at,
        };
        tables.classrooms.insert(id, classroom.clone());
        Ok(classroom)
    }

    async fn classrooms(&self) -> StoreResult<Vec<Classroom>> {
        Ok(self.lock().classrooms.values().cloned().collect())
    }

    async fn classroom(&self, id: u64) -> StoreResult<Option<Classroom>> {
        Ok(self.lock().classrooms.get(&id).cloned())
    }

    async fn classrooms_of_student(&self, student_id: u64) -> StoreResult<Vec<Classroom>> {
        let tables = self.lock();
        let mut rows: Vec<Classroom> = tables
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .filter_map(|e| tables.classrooms.get(&e.classroom_id).cloned())
            .collect();
        rows.sort_by_key(|c| (c.created_at, c.id));
        Ok(rows)
    }

    async fn insert_class(&self, class: NewClass) -> StoreResult<Class> {
        let mut tables = self.lock();
        let id = tables.id();
        let class = Class {
            id,
            classroom_id: class.classroom_id,
            start_time: class.start_time,
            end_time: class.end_time,
            meet_link: class.meet_link,
            created_at: class.created_at,
        };
        tables.classes.insert(id, class.clone());
        Ok(class)
    }

    async fn class(&self, id: u64) -> StoreResult<Option<Class>> {
        Ok(self.lock().classes.get(&id).cloned())
    }

    async fn classes(&self, classroom_id: u64) -> StoreResult<Vec<Class>> {
        let mut rows: Vec<Class> = self
            .lock()
            .classes
            .values()
            .filter(|c| c.classroom_id == classroom_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.start_time, c.id));
        Ok(rows)
    }

    async fn count_classes(&self, classroom_id: u64) -> StoreResult<u64> {
        let n = self
            .lock()
            .classes
            .values()
            .filter(|c| c.classroom_id == classroom_id)
            .count();
        Ok(n as u64)
    }

    async fn earliest_class_start(&self, classroom_id: u64) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self
            .lock()
            .classes
            .values()
            .filter(|c| c.classroom_id == classroom_id)
            .map(|c| c.start_time)
            .min())
    }

    async fn enrollment_exists(&self, student_id: u64, classroom_id: u64) -> StoreResult<bool> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .any(|e| e.student_id == student_id && e.classroom_id == classroom_id))
    }

    async fn insert_enrollment(
        &self,
        student_id: u64,
        classroom_id: u64,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<Enrollment> {
        let mut tables = self.lock();
        if tables
            .enrollments
            .iter()
            .any(|e| e.student_id == student_id && e.classroom_id == classroom_id)
        {
            return Err(StoreError::Duplicate);
        }
        let enrollment = Enrollment {
            id: tables.id(),
            student_id,
            classroom_id,
            joined_at,
        };
        tables.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn roster(&self, classroom_id: u64) -> StoreResult<Vec<RosterEntry>> {
        let tables = self.lock();
        let mut rows: Vec<RosterEntry> = tables
            .enrollments
            .iter()
            .filter(|e| e.classroom_id == classroom_id)
            .filter_map(|e| {
                let student = tables.students.get(&e.student_id)?;
                let tally = tables
                    .records
                    .get(&(e.student_id, classroom_id))
                    .map(Record::tally)
                    .unwrap_or_default();
                Some(RosterEntry {
                    student_id: student.id,
                    name: student.name.clone(),
                    tally,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.student_id);
        Ok(rows)
    }

    async fn record(&self, student_id: u64, classroom_id: u64) -> StoreResult<Option<Record>> {
        Ok(self.lock().records.get(&(student_id, classroom_id)).cloned())
    }

    async fn record_attendance(&self, mark: AttendanceMark) -> StoreResult<Record> {
        let mut tables = self.lock();

        let previous = tables
            .events
            .insert(
                (mark.student_id, mark.class_id),
                AttendanceEvent {
                    status: mark.status,
                    attended_at: mark.attended_at,
                },
            )
            .map(|event| event.status);

        let delta = Delta::between(previous, mark.status);
        let record = tables
            .records
            .entry((mark.student_id, mark.classroom_id))
            .or_insert_with(|| Record {
                student_id: mark.student_id,
                classroom_id: mark.classroom_id,
                present_count: 0,
                absent_count: 0,
                last_attended: None,
            });

        let tally = record.tally().apply(delta);
        record.present_count = tally.present;
        record.absent_count = tally.absent;
        record.last_attended = Some(mark.attended_at);

        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[actix_web::test]
    async fn duplicate_enrollment_is_rejected() {
        let store = MemoryStore::default();
        let now = Utc::now();
        store.insert_enrollment(1, 2, now).await.unwrap();
        assert!(matches!(
            store.insert_enrollment(1, 2, now).await,
            Err(StoreError::Duplicate)
        ));
    }

    #[actix_web::test]
    async fn counters_are_per_classroom() {
        let store = MemoryStore::default();
        let now = Utc::now();
        for (class_id, classroom_id) in [(10, 1), (11, 1), (20, 2)] {
            store
                .record_attendance(AttendanceMark {
                    student_id: 5,
                    class_id,
                    classroom_id,
                    status: AttendanceStatus::Present,
                    attended_at: now,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.record(5, 1).await.unwrap().unwrap().tally(), Tally { present: 2, absent: 0 });
        assert_eq!(store.record(5, 2).await.unwrap().unwrap().tally(), Tally { present: 1, absent: 0 });
    }
}
