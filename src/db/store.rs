//! Persistence seams used by the service layer.
//!
//! `PgStore` is the production implementation; tests run the same services
//! against the in-memory store.

use std::future::Future;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::attendance::{AttendanceRecord, AttendanceScope, AttendanceUpsert, UpsertOutcome};
use crate::models::mark::MarkDetail;
use crate::models::mood::{MoodEntry, MoodRecommendation, NewMoodEntry, Recommendation};
use crate::models::subject::Subject;
use crate::models::user::User;

/// Lookups of the people and subjects other records point at.
pub trait DirectoryStore: Send + Sync {
    fn find_user(&self, id: Uuid) -> impl Future<Output = AppResult<Option<User>>> + Send;

    fn users_by_ids(&self, ids: &[Uuid]) -> impl Future<Output = AppResult<Vec<User>>> + Send;

    fn find_subject(&self, id: Uuid) -> impl Future<Output = AppResult<Option<Subject>>> + Send;

    fn subjects_by_ids(&self, ids: &[Uuid])
        -> impl Future<Output = AppResult<Vec<Subject>>> + Send;

    fn subjects_for_teacher(
        &self,
        teacher_id: Uuid,
    ) -> impl Future<Output = AppResult<Vec<Subject>>> + Send;
}

pub trait MoodStore: Send + Sync {
    fn insert_mood_entry(
        &self,
        entry: NewMoodEntry,
    ) -> impl Future<Output = AppResult<MoodEntry>> + Send;

    /// Persists a batch of recommendations for one entry, in order.
    fn insert_recommendations(
        &self,
        mood_entry_id: Uuid,
        items: &[Recommendation],
    ) -> impl Future<Output = AppResult<Vec<MoodRecommendation>>> + Send;

    fn find_mood_entry(
        &self,
        owner_id: Uuid,
        entry_id: Uuid,
    ) -> impl Future<Output = AppResult<Option<MoodEntry>>> + Send;

    /// Newest first.
    fn list_mood_entries(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = AppResult<Vec<MoodEntry>>> + Send;

    fn list_recommendations(
        &self,
        mood_entry_id: Uuid,
    ) -> impl Future<Output = AppResult<Vec<MoodRecommendation>>> + Send;

    /// Removes the entry and its recommendations as one unit. Returns
    /// `false` when no entry with that id belongs to `owner_id`, in which
    /// case nothing is touched.
    fn delete_mood_entry(
        &self,
        owner_id: Uuid,
        entry_id: Uuid,
    ) -> impl Future<Output = AppResult<bool>> + Send;
}

pub trait AttendanceStore: DirectoryStore {
    /// Create-or-update keyed by (student, subject, date). Must be atomic
    /// with respect to that key.
    fn upsert_attendance(
        &self,
        input: AttendanceUpsert,
    ) -> impl Future<Output = AppResult<UpsertOutcome>> + Send;

    fn list_attendance(
        &self,
        scope: &AttendanceScope,
    ) -> impl Future<Output = AppResult<Vec<AttendanceRecord>>> + Send;
}

pub trait MarkStore: DirectoryStore {
    /// Marks joined with student and subject details, newest first.
    /// `subject_ids = None` means every subject.
    fn list_mark_details(
        &self,
        subject_ids: Option<&[Uuid]>,
    ) -> impl Future<Output = AppResult<Vec<MarkDetail>>> + Send;
}
