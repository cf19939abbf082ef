use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::handlers::auth::{find_user_by_email, insert_user};
use crate::models::parent_child::{
    BulkLinkResponse, LinkFailure, LinkRequest, ParentChild, UnlinkRequest,
};
use crate::models::user::{
    non_blank, CreateUserRequest, NewUser, Role, UpdateUserRequest, User, UserListQuery,
};
use crate::AppState;

// ---- Users ----

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> AppResult<Json<Vec<User>>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE ($1::user_role IS NULL OR role = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.role)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    body.validate()?;

    let email = body.email.trim().to_string();
    if find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let is_student = body.role == Role::Student;
    let admission_number = non_blank(body.admission_number.as_deref()).map(String::from);
    if is_student && admission_number.is_none() {
        return Err(AppError::Validation(
            "Admission number is required for students".into(),
        ));
    }

    let user = insert_user(
        &state.db,
        NewUser {
            name: body.name.trim().to_string(),
            email,
            password_hash: hash_password(&body.password)?,
            role: body.role,
            admission_number: admission_number.filter(|_| is_student),
            level: body.level.filter(|_| is_student),
            term: non_blank(body.term.as_deref())
                .map(String::from)
                .filter(|_| is_student),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created by admin");

    Ok((StatusCode::CREATED, Json(user)))
}

async fn find_user(db: &PgPool, user_id: Uuid) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    body.validate()?;
    let current = find_user(&state.db, user_id).await?;

    let password_hash = match body.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => hash_password(password)?,
        None => current.password_hash.clone(),
    };

    let role = body.role.unwrap_or(current.role);
    let (admission_number, level, term) = if role == Role::Student {
        (
            non_blank(body.admission_number.as_deref())
                .map(String::from)
                .or(current.admission_number),
            body.level.or(current.level),
            non_blank(body.term.as_deref())
                .map(String::from)
                .or(current.term),
        )
    } else {
        (None, None, None)
    };

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name = $2,
            email = $3,
            password_hash = $4,
            role = $5,
            admission_number = $6,
            level = $7,
            term = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(non_blank(body.name.as_deref()).unwrap_or(&current.name))
    .bind(non_blank(body.email.as_deref()).unwrap_or(&current.email))
    .bind(password_hash)
    .bind(role)
    .bind(admission_number)
    .bind(level)
    .bind(term)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        AppError::on_unique_violation(e, "User with this email or admission number already exists")
    })?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::info!(user_id = %user_id, "User deleted by admin");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

pub async fn dashboard_stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let (students, teachers, parents, subjects) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users WHERE role = 'student'),
            (SELECT COUNT(*) FROM users WHERE role = 'teacher'),
            (SELECT COUNT(*) FROM users WHERE role = 'parent'),
            (SELECT COUNT(*) FROM subjects)
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({
        "totalStudents": students,
        "totalTeachers": teachers,
        "totalParents": parents,
        "totalSubjects": subjects,
    })))
}

// ---- Parent / child links ----

/// A child reference is a user id or, failing that, an admission number.
async fn resolve_child(db: &PgPool, reference: &str) -> AppResult<Option<User>> {
    let reference = reference.trim();
    let child = match Uuid::parse_str(reference) {
        Ok(id) => {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND role = $2")
                .bind(id)
                .bind(Role::Student)
                .fetch_optional(db)
                .await?
        }
        Err(_) => None,
    };

    match child {
        Some(child) => Ok(Some(child)),
        None => {
            let child = sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE admission_number = $1 AND role = $2",
            )
            .bind(reference)
            .bind(Role::Student)
            .fetch_optional(db)
            .await?;
            Ok(child)
        }
    }
}

async fn link(db: &PgPool, parent_id: Uuid, reference: &str) -> AppResult<ParentChild> {
    let child = resolve_child(db, reference)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid child".into()))?;

    let relationship = sqlx::query_as::<_, ParentChild>(
        r#"
        INSERT INTO parent_child (id, parent_id, child_id)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(parent_id)
    .bind(child.id)
    .fetch_one(db)
    .await
    .map_err(|e| AppError::on_unique_violation(e, "Relationship already exists"))?;

    Ok(relationship)
}

pub async fn link_parent_child(
    State(state): State<AppState>,
    AppJson(body): AppJson<LinkRequest>,
) -> AppResult<Response> {
    let parent = match find_user(&state.db, body.parent_id).await {
        Ok(user) if user.role == Role::Parent => user,
        Ok(_) | Err(AppError::NotFound(_)) => {
            return Err(AppError::Validation("Invalid parent".into()))
        }
        Err(e) => return Err(e),
    };

    if let Some(child_ids) = body.child_ids.filter(|ids| !ids.is_empty()) {
        let mut results = Vec::new();
        let mut errors = Vec::new();
        for child_id in child_ids {
            match link(&state.db, parent.id, &child_id).await {
                Ok(rel) => results.push(rel),
                Err(e) => errors.push(LinkFailure {
                    child_id,
                    error: e.public_message(),
                }),
            }
        }

        tracing::info!(
            parent_id = %parent.id,
            linked = results.len(),
            failed = errors.len(),
            "Parent links processed"
        );

        let response = BulkLinkResponse {
            success: true,
            linked: results.len(),
            failed: errors.len(),
            results,
            errors,
        };
        return Ok((StatusCode::CREATED, Json(response)).into_response());
    }

    let child_id = non_blank(body.child_id.as_deref())
        .ok_or_else(|| AppError::Validation("Parent ID and child ID are required".into()))?;
    let relationship = link(&state.db, parent.id, child_id).await?;

    Ok((StatusCode::CREATED, Json(relationship)).into_response())
}

pub async fn unlink_parent_child(
    State(state): State<AppState>,
    AppJson(body): AppJson<UnlinkRequest>,
) -> AppResult<Json<Value>> {
    let reference = non_blank(body.child_id.as_deref())
        .ok_or_else(|| AppError::Validation("Parent ID and child ID are required".into()))?;

    let child = resolve_child(&state.db, reference)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))?;

    let result = sqlx::query("DELETE FROM parent_child WHERE parent_id = $1 AND child_id = $2")
        .bind(body.parent_id)
        .bind(child.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Relationship not found".into()));
    }

    Ok(Json(json!({ "message": "Unlinked successfully" })))
}
