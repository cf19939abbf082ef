use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::store::AttendanceStore;
use crate::error::{AppError, AppResult};
use crate::models::attendance::{
    AttendanceFailure, AttendanceGroup, AttendanceQuery, AttendanceRecord, AttendanceScope,
    AttendanceStatus, AttendanceUpsert, BulkAttendanceRequest, GroupBy, MarkAttendanceRequest,
    UpsertOutcome,
};
use crate::models::batch::BatchReport;
use crate::models::user::{non_blank, Level};
use crate::services::access::{ensure_teaches, find_student};
use crate::services::aggregation::{aggregate_attendance, unknown_label};

/// Who is asking for attendance statistics.
#[derive(Debug, Clone, Copy)]
pub enum StatsScope {
    /// A student's own records, one group per subject.
    Student(Uuid),
    /// Records in a teacher's subjects, one group per student.
    Teacher(Uuid),
    /// Every record, grouped as the query asks (students by default).
    Admin,
}

struct MarkInput<'a> {
    student_id: Uuid,
    subject_id: Uuid,
    date: NaiveDate,
    status: Option<AttendanceStatus>,
    term: Option<&'a str>,
    level: Option<Level>,
    notes: Option<&'a str>,
}

async fn mark_one<S: AttendanceStore>(
    store: &S,
    marked_by: Uuid,
    input: MarkInput<'_>,
) -> AppResult<UpsertOutcome> {
    let status = input
        .status
        .ok_or_else(|| AppError::Validation("Status is required".into()))?;
    find_student(store, input.student_id).await?;

    store
        .upsert_attendance(AttendanceUpsert {
            student_id: input.student_id,
            subject_id: input.subject_id,
            date: input.date,
            status,
            term: non_blank(input.term).map(String::from),
            level: input.level,
            notes: non_blank(input.notes).map(String::from),
            marked_by,
        })
        .await
}

/// Creates the record for (student, subject, date) or updates the one that
/// already exists.
pub async fn upsert_attendance<S: AttendanceStore>(
    store: &S,
    teacher_id: Uuid,
    req: MarkAttendanceRequest,
) -> AppResult<UpsertOutcome> {
    ensure_teaches(store, teacher_id, req.subject_id).await?;

    mark_one(
        store,
        teacher_id,
        MarkInput {
            student_id: req.student_id,
            subject_id: req.subject_id,
            date: req.date,
            status: req.status,
            term: req.term.as_deref(),
            level: req.level,
            notes: req.notes.as_deref(),
        },
    )
    .await
}

/// Marks every listed student independently. A failing item is reported
/// and the rest carry on.
pub async fn bulk_upsert_attendance<S: AttendanceStore>(
    store: &S,
    teacher_id: Uuid,
    req: BulkAttendanceRequest,
) -> AppResult<BatchReport<AttendanceRecord, AttendanceFailure>> {
    ensure_teaches(store, teacher_id, req.subject_id).await?;

    if req.attendance_list.is_empty() {
        return Err(AppError::Validation("Attendance list is required".into()));
    }

    let mut results = Vec::with_capacity(req.attendance_list.len());
    let mut failures = Vec::new();

    for item in &req.attendance_list {
        let outcome = mark_one(
            store,
            teacher_id,
            MarkInput {
                student_id: item.student_id,
                subject_id: req.subject_id,
                date: req.date,
                status: item.status,
                term: req.term.as_deref(),
                level: req.level,
                notes: item.notes.as_deref(),
            },
        )
        .await;

        match outcome {
            Ok(outcome) => results.push(outcome.record),
            Err(e) => {
                tracing::warn!(
                    student_id = %item.student_id,
                    subject_id = %req.subject_id,
                    error = %e,
                    "Bulk attendance item failed"
                );
                failures.push(AttendanceFailure {
                    student_id: item.student_id,
                    error: e.public_message(),
                });
            }
        }
    }

    Ok(BatchReport::new(results, failures).with_message("Attendance marked"))
}

/// Records visible to the caller, narrowed by the query filters.
pub async fn list_attendance<S: AttendanceStore>(
    store: &S,
    scope: StatsScope,
    query: &AttendanceQuery,
) -> AppResult<Vec<AttendanceRecord>> {
    let Some(records) = scoped_records(store, scope).await? else {
        return Ok(Vec::new());
    };
    Ok(records.into_iter().filter(|r| query.matches(r)).collect())
}

async fn scoped_records<S: AttendanceStore>(
    store: &S,
    scope: StatsScope,
) -> AppResult<Option<Vec<AttendanceRecord>>> {
    let store_scope = match scope {
        StatsScope::Student(id) => AttendanceScope::Student(id),
        StatsScope::Teacher(id) => {
            let subjects = store.subjects_for_teacher(id).await?;
            if subjects.is_empty() {
                return Ok(None);
            }
            AttendanceScope::Subjects(subjects.into_iter().map(|s| s.id).collect())
        }
        StatsScope::Admin => AttendanceScope::All,
    };
    store.list_attendance(&store_scope).await.map(Some)
}

/// Per-group attendance counts and rates.
///
/// Groups are taken from every record in the caller's scope before the
/// filters apply, so a group whose records are all filtered out is still
/// reported with zero counts. A filter on the grouping dimension itself
/// keeps only that group.
pub async fn attendance_stats<S: AttendanceStore>(
    store: &S,
    scope: StatsScope,
    query: &AttendanceQuery,
) -> AppResult<Vec<AttendanceGroup>> {
    let group_by = match scope {
        StatsScope::Student(_) => GroupBy::Subject,
        StatsScope::Teacher(_) => GroupBy::Student,
        StatsScope::Admin => query.group_by.unwrap_or(GroupBy::Student),
    };

    let Some(records) = scoped_records(store, scope).await? else {
        return Ok(Vec::new());
    };

    let mut keys: BTreeSet<Uuid> = records.iter().map(|r| group_by.key_of(r)).collect();
    if let Some(pinned) = query.pinned_key(group_by) {
        keys.retain(|k| *k == pinned);
    }

    let labels = group_labels(store, group_by, &keys).await?;
    let filtered: Vec<AttendanceRecord> = records.into_iter().filter(|r| query.matches(r)).collect();

    Ok(aggregate_attendance(&filtered, group_by, &labels))
}

async fn group_labels<S: AttendanceStore>(
    store: &S,
    group_by: GroupBy,
    keys: &BTreeSet<Uuid>,
) -> AppResult<BTreeMap<Uuid, String>> {
    let ids: Vec<Uuid> = keys.iter().copied().collect();
    let mut labels: BTreeMap<Uuid, String> = match group_by {
        GroupBy::Subject => store
            .subjects_by_ids(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect(),
        GroupBy::Student => store
            .users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect(),
    };

    // keys whose subject or student no longer exists still form a group
    for key in keys {
        labels
            .entry(*key)
            .or_insert_with(|| unknown_label(group_by).to_string());
    }
    Ok(labels)
}
