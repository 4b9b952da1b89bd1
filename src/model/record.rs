use chrono::{DateTime, Utc};

use crate::domain::reader::Tally;

/// Per (student, classroom) running counters, table `record`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Record {
    pub student_id: u64,
    pub classroom_id: u64,
    pub present_count: u32,
    pub absent_count: u32,
    pub last_attended: Option<DateTime<Utc>>,
}

impl Record {
    pub fn tally(&self) -> Tally {
        Tally {
            present: self.present_count,
            absent: self.absent_count,
        }
    }
}

/// An enrolled student with their counters; missing aggregates read as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub student_id: u64,
    pub name: String,
    pub tally: Tally,
}
