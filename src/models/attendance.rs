use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::Level;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub term: Option<String>,
    pub level: Option<Level>,
    pub notes: Option<String>,
    pub marked_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

/// Everything needed to create-or-update the row for one
/// (student, subject, date) triple.
#[derive(Debug, Clone)]
pub struct AttendanceUpsert {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub term: Option<String>,
    pub level: Option<Level>,
    pub notes: Option<String>,
    pub marked_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub record: AttendanceRecord,
    pub created: bool,
}

/// POST /api/teachers/attendance
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub status: Option<AttendanceStatus>,
    pub term: Option<String>,
    pub level: Option<Level>,
    pub notes: Option<String>,
}

/// POST /api/teachers/attendance/bulk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceRequest {
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub term: Option<String>,
    pub level: Option<Level>,
    #[serde(default)]
    pub attendance_list: Vec<BulkAttendanceItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceItem {
    pub student_id: Uuid,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFailure {
    pub student_id: Uuid,
    pub error: String,
}

/// PUT /api/teachers/attendance/:id
#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub term: Option<String>,
    pub level: Option<Level>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Subject,
    Student,
}

impl GroupBy {
    pub fn key_of(&self, record: &AttendanceRecord) -> Uuid {
        match self {
            GroupBy::Subject => record.subject_id,
            GroupBy::Student => record.student_id,
        }
    }
}

/// Filters accepted by attendance listings and statistics. Date bounds are
/// inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub subject_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub term: Option<String>,
    pub level: Option<Level>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Only honoured for admin statistics.
    pub group_by: Option<GroupBy>,
}

impl AttendanceQuery {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        if self.subject_id.is_some_and(|id| record.subject_id != id) {
            return false;
        }
        if self.student_id.is_some_and(|id| record.student_id != id) {
            return false;
        }
        if let Some(term) = self.term.as_deref().filter(|t| !t.is_empty()) {
            if record.term.as_deref() != Some(term) {
                return false;
            }
        }
        if self.level.is_some_and(|level| record.level != Some(level)) {
            return false;
        }
        if self.start_date.is_some_and(|start| record.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| record.date > end) {
            return false;
        }
        true
    }

    /// The filter value that pins the grouping dimension itself, if any.
    pub fn pinned_key(&self, group_by: GroupBy) -> Option<Uuid> {
        match group_by {
            GroupBy::Subject => self.subject_id,
            GroupBy::Student => self.student_id,
        }
    }
}

/// Which slice of attendance rows a caller may read.
#[derive(Debug, Clone)]
pub enum AttendanceScope {
    Student(Uuid),
    Subjects(Vec<Uuid>),
    All,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceGroup {
    pub group_key: Uuid,
    pub name: String,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    pub attendance_rate: f64,
}
