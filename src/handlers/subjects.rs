use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::store::DirectoryStore;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::subject::{CreateSubjectRequest, Subject};
use crate::models::user::{Role, User};
use crate::AppState;

pub async fn list_subjects(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Subject>>> {
    let subjects = state.store.subjects_for_teacher(auth_user.id).await?;
    Ok(Json(subjects))
}

pub async fn create_subject(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateSubjectRequest>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    body.validate()?;

    let subject = sqlx::query_as::<_, Subject>(
        r#"
        INSERT INTO subjects (id, name, teacher_id)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.name.trim())
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(subject_id = %subject.id, teacher_id = %auth_user.id, "Subject created");

    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn list_students(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let students = sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 ORDER BY name ASC")
        .bind(Role::Student)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(students))
}
