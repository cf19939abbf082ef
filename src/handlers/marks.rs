use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::store::MarkStore;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::models::mark::{
    CreateMarkRequest, Mark, MarkDetail, MarkFilters, MarkStatsResponse, UpdateMarkRequest,
};
use crate::models::user::non_blank;
use crate::services::access::{ensure_teaches, find_student};
use crate::services::marks::{self, MarkScope};
use crate::AppState;

async fn find_mark(db: &PgPool, mark_id: Uuid) -> AppResult<Mark> {
    sqlx::query_as::<_, Mark>("SELECT * FROM marks WHERE id = $1")
        .bind(mark_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Mark not found".into()))
}

async fn apply_update(db: &PgPool, current: Mark, body: UpdateMarkRequest) -> AppResult<Mark> {
    body.validate()?;

    let mark = sqlx::query_as::<_, Mark>(
        r#"
        UPDATE marks SET marks = $2, term = $3, level = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(current.id)
    .bind(body.marks.unwrap_or(current.marks))
    .bind(non_blank(body.term.as_deref()).or(current.term.as_deref()))
    .bind(body.level.or(current.level))
    .fetch_one(db)
    .await?;

    Ok(mark)
}

async fn remove(db: &PgPool, mark_id: Uuid) -> AppResult<Json<Value>> {
    sqlx::query("DELETE FROM marks WHERE id = $1")
        .bind(mark_id)
        .execute(db)
        .await?;
    Ok(Json(json!({ "message": "Mark deleted successfully" })))
}

// ---- Teacher ----

pub async fn create_mark(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateMarkRequest>,
) -> AppResult<(StatusCode, Json<Mark>)> {
    body.validate()?;
    ensure_teaches(&state.store, auth_user.id, body.subject_id).await?;
    find_student(&state.store, body.student_id).await?;

    let mark = sqlx::query_as::<_, Mark>(
        r#"
        INSERT INTO marks (id, student_id, subject_id, marks, term, level)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.student_id)
    .bind(body.subject_id)
    .bind(body.marks)
    .bind(non_blank(body.term.as_deref()))
    .bind(body.level)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(mark)))
}

pub async fn teacher_update_mark(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mark_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateMarkRequest>,
) -> AppResult<Json<Mark>> {
    let current = find_mark(&state.db, mark_id).await?;
    ensure_teaches(&state.store, auth_user.id, current.subject_id).await?;
    Ok(Json(apply_update(&state.db, current, body).await?))
}

pub async fn teacher_delete_mark(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mark_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let current = find_mark(&state.db, mark_id).await?;
    ensure_teaches(&state.store, auth_user.id, current.subject_id).await?;
    remove(&state.db, mark_id).await
}

pub async fn subject_marks(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(subject_id): Path<Uuid>,
) -> AppResult<Json<Vec<MarkDetail>>> {
    ensure_teaches(&state.store, auth_user.id, subject_id).await?;
    let details = state.store.list_mark_details(Some(&[subject_id])).await?;
    Ok(Json(details))
}

pub async fn my_marks(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MarkDetail>>> {
    let details = marks::list_marks(
        &state.store,
        MarkScope::Teacher(auth_user.id),
        &MarkFilters::default(),
    )
    .await?;
    Ok(Json(details))
}

pub async fn teacher_all_marks(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(filters): AppQuery<MarkFilters>,
) -> AppResult<Json<Vec<MarkDetail>>> {
    let details = marks::list_marks(&state.store, MarkScope::Teacher(auth_user.id), &filters).await?;
    Ok(Json(details))
}

pub async fn teacher_marks_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(filters): AppQuery<MarkFilters>,
) -> AppResult<Json<MarkStatsResponse>> {
    let stats = marks::marks_stats(&state.store, MarkScope::Teacher(auth_user.id), &filters).await?;
    Ok(Json(MarkStatsResponse { stats }))
}

// ---- Student ----

pub async fn student_marks(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MarkDetail>>> {
    let details = state.store.mark_details_for_student(auth_user.id).await?;
    Ok(Json(details))
}

// ---- Admin ----

pub async fn admin_student_marks(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<Vec<MarkDetail>>> {
    let details = state.store.mark_details_for_student(student_id).await?;
    Ok(Json(details))
}

pub async fn admin_all_marks(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<MarkFilters>,
) -> AppResult<Json<Vec<MarkDetail>>> {
    let details = marks::list_marks(&state.store, MarkScope::All, &filters).await?;
    Ok(Json(details))
}

pub async fn admin_marks_stats(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<MarkFilters>,
) -> AppResult<Json<MarkStatsResponse>> {
    let stats = marks::marks_stats(&state.store, MarkScope::All, &filters).await?;
    Ok(Json(MarkStatsResponse { stats }))
}

pub async fn admin_update_mark(
    State(state): State<AppState>,
    Path(mark_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateMarkRequest>,
) -> AppResult<Json<Mark>> {
    let current = find_mark(&state.db, mark_id).await?;
    Ok(Json(apply_update(&state.db, current, body).await?))
}

pub async fn admin_delete_mark(
    State(state): State<AppState>,
    Path(mark_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    find_mark(&state.db, mark_id).await?;
    remove(&state.db, mark_id).await
}
