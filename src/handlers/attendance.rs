use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::models::attendance::{
    AttendanceFailure, AttendanceGroup, AttendanceQuery, AttendanceRecord, BulkAttendanceRequest,
    MarkAttendanceRequest, UpdateAttendanceRequest,
};
use crate::models::batch::BatchReport;
use crate::models::user::non_blank;
use crate::services::access::ensure_teaches;
use crate::services::attendance::{self, StatsScope};
use crate::AppState;

pub const DUPLICATE_ATTENDANCE: &str = "Attendance already marked for this student, subject and date";

// ---- Teacher ----

/// 201 when a new record was created, 200 when an existing one was updated.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<MarkAttendanceRequest>,
) -> AppResult<(StatusCode, Json<AttendanceRecord>)> {
    let outcome = attendance::upsert_attendance(&state.store, auth_user.id, body).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.record)))
}

pub async fn bulk_mark_attendance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<BulkAttendanceRequest>,
) -> AppResult<Json<BatchReport<AttendanceRecord, AttendanceFailure>>> {
    let report = attendance::bulk_upsert_attendance(&state.store, auth_user.id, body).await?;
    tracing::info!(
        teacher_id = %auth_user.id,
        success = report.success,
        errors = report.errors,
        "Bulk attendance processed"
    );
    Ok(Json(report))
}

pub async fn teacher_attendance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<AttendanceQuery>,
) -> AppResult<Json<Vec<AttendanceRecord>>> {
    let records =
        attendance::list_attendance(&state.store, StatsScope::Teacher(auth_user.id), &query).await?;
    Ok(Json(records))
}

async fn owned_record(state: &AppState, teacher_id: Uuid, id: Uuid) -> AppResult<AttendanceRecord> {
    let record = sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;

    ensure_teaches(&state.store, teacher_id, record.subject_id).await?;
    Ok(record)
}

pub async fn update_attendance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<UpdateAttendanceRequest>,
) -> AppResult<Json<AttendanceRecord>> {
    let current = owned_record(&state, auth_user.id, id).await?;

    let record = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        UPDATE attendance SET
            date = $2,
            status = $3,
            term = $4,
            level = $5,
            notes = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(body.date.unwrap_or(current.date))
    .bind(body.status.unwrap_or(current.status))
    .bind(non_blank(body.term.as_deref()).or(current.term.as_deref()))
    .bind(body.level.or(current.level))
    .bind(non_blank(body.notes.as_deref()).or(current.notes.as_deref()))
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::on_unique_violation(e, DUPLICATE_ATTENDANCE))?;

    Ok(Json(record))
}

pub async fn delete_attendance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    owned_record(&state, auth_user.id, id).await?;

    sqlx::query("DELETE FROM attendance WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "message": "Attendance record deleted" })))
}

pub async fn teacher_attendance_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<AttendanceQuery>,
) -> AppResult<Json<Vec<AttendanceGroup>>> {
    let groups =
        attendance::attendance_stats(&state.store, StatsScope::Teacher(auth_user.id), &query).await?;
    Ok(Json(groups))
}

// ---- Student ----

pub async fn student_attendance(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<AttendanceQuery>,
) -> AppResult<Json<Vec<AttendanceRecord>>> {
    let records =
        attendance::list_attendance(&state.store, StatsScope::Student(auth_user.id), &query).await?;
    Ok(Json(records))
}

pub async fn student_attendance_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<AttendanceQuery>,
) -> AppResult<Json<Vec<AttendanceGroup>>> {
    let groups =
        attendance::attendance_stats(&state.store, StatsScope::Student(auth_user.id), &query).await?;
    Ok(Json(groups))
}

// ---- Admin ----

pub async fn admin_attendance_stats(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AttendanceQuery>,
) -> AppResult<Json<Vec<AttendanceGroup>>> {
    let groups = attendance::attendance_stats(&state.store, StatsScope::Admin, &query).await?;
    Ok(Json(groups))
}
