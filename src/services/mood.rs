use uuid::Uuid;
use validator::Validate;

use crate::db::store::MoodStore;
use crate::error::{AppError, AppResult};
use crate::models::mood::{CreateMoodEntryRequest, MoodEntry, MoodRecommendation, NewMoodEntry};
use crate::models::user::non_blank;
use crate::services::recommendations::generate_recommendations;

/// Persists a mood entry, then stores the generated recommendations for it.
///
/// Recommendations are best-effort: if storing them fails the entry is
/// still returned and the failure is only logged.
pub async fn record_mood<S: MoodStore>(
    store: &S,
    owner_id: Uuid,
    req: CreateMoodEntryRequest,
) -> AppResult<MoodEntry> {
    req.validate()?;

    let mood = req
        .mood
        .filter(|m| !m.is_blank())
        .ok_or_else(|| AppError::Validation("Mood is required".into()))?;

    let entry = store
        .insert_mood_entry(NewMoodEntry {
            owner_id,
            mood,
            energy: req.energy,
            stress: req.stress,
            note: non_blank(req.note.as_deref()).map(String::from),
        })
        .await?;

    let recommendations = generate_recommendations(&entry.mood, entry.energy, entry.stress);
    match store.insert_recommendations(entry.id, &recommendations).await {
        Ok(saved) => {
            tracing::debug!(entry_id = %entry.id, count = saved.len(), "Recommendations stored");
        }
        Err(e) => {
            tracing::warn!(
                entry_id = %entry.id,
                error = %e,
                "Failed to store mood recommendations"
            );
        }
    }

    Ok(entry)
}

pub async fn get_recommendations<S: MoodStore>(
    store: &S,
    owner_id: Uuid,
    entry_id: Uuid,
) -> AppResult<Vec<MoodRecommendation>> {
    store
        .find_mood_entry(owner_id, entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Mood entry not found".into()))?;

    store.list_recommendations(entry_id).await
}

pub async fn list_mood_entries<S: MoodStore>(store: &S, owner_id: Uuid) -> AppResult<Vec<MoodEntry>> {
    store.list_mood_entries(owner_id).await
}

pub async fn delete_mood_entry<S: MoodStore>(
    store: &S,
    owner_id: Uuid,
    entry_id: Uuid,
) -> AppResult<()> {
    if !store.delete_mood_entry(owner_id, entry_id).await? {
        return Err(AppError::NotFound("Mood entry not found".into()));
    }
    Ok(())
}
