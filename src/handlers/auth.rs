use axum::{extract::State, http::StatusCode, Extension, Json};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::create_access_token,
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::user::{
    non_blank, AuthResponse, LoginRequest, NewUser, RegisterRequest, Role, User, UserSummary,
};
use crate::AppState;

/// Inserts a user, reporting a taken email or admission number as a
/// conflict.
pub async fn insert_user(db: &PgPool, new_user: NewUser) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, admission_number, name, email, password_hash, role, level, term)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new_user.admission_number)
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.role)
    .bind(new_user.level)
    .bind(&new_user.term)
    .fetch_one(db)
    .await
    .map_err(|e| {
        AppError::on_unique_violation(e, "User with this email or admission number already exists")
    })
}

pub async fn find_user_by_email(db: &PgPool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    body.validate()?;

    if body.role == Role::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts can only be created by existing administrators. Please contact an administrator."
                .into(),
        ));
    }

    let email = body.email.trim().to_string();
    if find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let admission_number = non_blank(body.admission_number.as_deref()).map(String::from);
    if body.role == Role::Student && admission_number.is_none() {
        return Err(AppError::Validation(
            "Admission number is required for students".into(),
        ));
    }

    let is_student = body.role == Role::Student;
    let user = insert_user(
        &state.db,
        NewUser {
            name: body.name.trim().to_string(),
            email,
            password_hash: hash_password(&body.password)?,
            role: body.role,
            admission_number: admission_number.filter(|_| is_student),
            level: body.level.filter(|_| is_student),
            term: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");

    let token = create_access_token(user.id, user.role, &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide email and password".into(),
        ));
    }

    let user = find_user_by_email(&state.db, body.email.trim())
        .await?
        .filter(|u| verify_password(&body.password, &u.password_hash))
        .ok_or_else(|| AppError::Validation("Invalid credentials".into()))?;

    tracing::info!(user_id = %user.id, "User logged in");

    let token = create_access_token(user.id, user.role, &state.config)?;
    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(user))
}
