use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::study::{
    CreateFlashCardRequest, CreateStudyNoteRequest, CreateStudyPlanRequest, FlashCard, StudyNote,
    StudyPlan, UpdateStudyPlanRequest,
};
use crate::models::user::non_blank;
use crate::AppState;

// ---- Notes ----

pub async fn list_notes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<StudyNote>>> {
    let notes = sqlx::query_as::<_, StudyNote>(
        "SELECT * FROM study_notes WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateStudyNoteRequest>,
) -> AppResult<(StatusCode, Json<StudyNote>)> {
    body.validate()?;
    let content = non_blank(Some(body.content.as_str()))
        .ok_or_else(|| AppError::Validation("Note content is required".into()))?;

    let note = sqlx::query_as::<_, StudyNote>(
        r#"
        INSERT INTO study_notes (id, user_id, content)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(content)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

// ---- Study plans ----

pub async fn list_study_plans(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<StudyPlan>>> {
    let plans = sqlx::query_as::<_, StudyPlan>(
        "SELECT * FROM study_plans WHERE user_id = $1 ORDER BY due_date ASC, created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(plans))
}

pub async fn create_study_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateStudyPlanRequest>,
) -> AppResult<(StatusCode, Json<StudyPlan>)> {
    body.validate()?;

    let plan = sqlx::query_as::<_, StudyPlan>(
        r#"
        INSERT INTO study_plans (id, user_id, subject, topic, description, due_date, estimated_hours)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.subject.trim())
    .bind(body.topic.trim())
    .bind(non_blank(body.description.as_deref()))
    .bind(body.due_date)
    .bind(body.estimated_hours)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn update_study_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateStudyPlanRequest>,
) -> AppResult<Json<StudyPlan>> {
    let plan = sqlx::query_as::<_, StudyPlan>(
        r#"
        UPDATE study_plans SET completed = $3
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(plan_id)
    .bind(auth_user.id)
    .bind(body.completed)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Study plan not found".into()))?;

    Ok(Json(plan))
}

pub async fn delete_study_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM study_plans WHERE id = $1 AND user_id = $2")
        .bind(plan_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Study plan not found".into()));
    }

    Ok(Json(json!({ "message": "Study plan deleted successfully" })))
}

// ---- Flashcards ----

async fn ensure_owns_plan(db: &sqlx::PgPool, user_id: Uuid, plan_id: Uuid) -> AppResult<()> {
    let owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM study_plans WHERE id = $1 AND user_id = $2)",
    )
    .bind(plan_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;

    if !owned {
        return Err(AppError::NotFound("Study plan not found".into()));
    }
    Ok(())
}

pub async fn list_flashcards(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<Vec<FlashCard>>> {
    ensure_owns_plan(&state.db, auth_user.id, plan_id).await?;

    let cards = sqlx::query_as::<_, FlashCard>(
        "SELECT * FROM flash_cards WHERE study_plan_id = $1 ORDER BY created_at ASC",
    )
    .bind(plan_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(cards))
}

pub async fn create_flashcard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
    AppJson(body): AppJson<CreateFlashCardRequest>,
) -> AppResult<(StatusCode, Json<FlashCard>)> {
    body.validate()?;
    ensure_owns_plan(&state.db, auth_user.id, plan_id).await?;

    let card = sqlx::query_as::<_, FlashCard>(
        r#"
        INSERT INTO flash_cards (id, study_plan_id, question, answer, difficulty)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(plan_id)
    .bind(body.question.trim())
    .bind(body.answer.trim())
    .bind(body.difficulty)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn delete_flashcard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(card_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query(
        r#"
        DELETE FROM flash_cards fc
        USING study_plans sp
        WHERE fc.id = $1 AND fc.study_plan_id = sp.id AND sp.user_id = $2
        "#,
    )
    .bind(card_id)
    .bind(auth_user.id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Flashcard not found".into()));
    }

    Ok(Json(json!({ "message": "Flashcard deleted" })))
}
