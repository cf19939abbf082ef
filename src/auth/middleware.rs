use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::models::user::Role;
use crate::AppState;

#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied".into()))
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let token_data = verify_token(token, &state.config)?;

    let auth_user = AuthUser {
        id: token_data.claims.sub,
        role: token_data.claims.role,
    };

    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

async fn require_role(req: Request, next: Next, allowed: &[Role]) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;
    user.require(allowed)?;
    Ok(next.run(req).await)
}

pub async fn require_student(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(req, next, &[Role::Student]).await
}

pub async fn require_teacher(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(req, next, &[Role::Teacher]).await
}

pub async fn require_parent(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(req, next, &[Role::Parent]).await
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(req, next, &[Role::Admin]).await
}
