use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::mood::{CreateMoodEntryRequest, MoodEntry, MoodRecommendation};
use crate::services::mood;
use crate::AppState;

pub async fn create_mood_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateMoodEntryRequest>,
) -> AppResult<(StatusCode, Json<MoodEntry>)> {
    let entry = mood::record_mood(&state.store, auth_user.id, body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_mood_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let entries = mood::list_mood_entries(&state.store, auth_user.id).await?;
    Ok(Json(entries))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<Vec<MoodRecommendation>>> {
    let recs = mood::get_recommendations(&state.store, auth_user.id, entry_id).await?;
    Ok(Json(recs))
}

pub async fn delete_mood_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    mood::delete_mood_entry(&state.store, auth_user.id, entry_id).await?;
    Ok(Json(json!({ "message": "Mood entry deleted" })))
}
