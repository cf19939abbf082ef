//! In-memory store used by the service tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::store::{AttendanceStore, DirectoryStore, MarkStore, MoodStore};
use crate::error::{AppError, AppResult};
use crate::models::attendance::{AttendanceRecord, AttendanceScope, AttendanceUpsert, UpsertOutcome};
use crate::models::mark::{Mark, MarkDetail};
use crate::models::mood::{
    MoodEntry, MoodRecommendation, NewMoodEntry, Recommendation, SYSTEM_PROVIDER,
};
use crate::models::subject::Subject;
use crate::models::user::{Level, Role, User};

#[derive(Default)]
struct Data {
    users: HashMap<Uuid, User>,
    subjects: HashMap<Uuid, Subject>,
    marks: Vec<Mark>,
    mood_entries: Vec<MoodEntry>,
    recommendations: Vec<MoodRecommendation>,
    attendance: Vec<AttendanceRecord>,
    fail_recommendations: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Data>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, name: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            admission_number: None,
            name: name.to_string(),
            email: format!("{}@school.test", name.to_lowercase().replace(' ', ".")),
            password_hash: String::new(),
            role,
            level: None,
            term: None,
            created_at: Utc::now(),
        };
        self.data.lock().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn add_subject(&self, name: &str, teacher_id: Uuid) -> Subject {
        let subject = Subject {
            id: Uuid::new_v4(),
            name: name.to_string(),
            teacher_id,
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .await
            .subjects
            .insert(subject.id, subject.clone());
        subject
    }

    pub async fn add_mark(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        marks: f64,
        term: Option<&str>,
        level: Option<Level>,
    ) -> Mark {
        let mark = Mark {
            id: Uuid::new_v4(),
            student_id,
            subject_id,
            marks,
            term: term.map(String::from),
            level,
            created_at: Utc::now(),
        };
        self.data.lock().await.marks.push(mark.clone());
        mark
    }

    /// Makes every subsequent recommendation insert fail.
    pub async fn fail_recommendations(&self) {
        self.data.lock().await.fail_recommendations = true;
    }

    pub async fn recommendation_count(&self, mood_entry_id: Uuid) -> usize {
        self.data
            .lock()
            .await
            .recommendations
            .iter()
            .filter(|r| r.mood_entry_id == mood_entry_id)
            .count()
    }

    pub async fn mood_entry_count(&self) -> usize {
        self.data.lock().await.mood_entries.len()
    }

    pub async fn attendance_rows(&self) -> Vec<AttendanceRecord> {
        self.data.lock().await.attendance.clone()
    }
}

impl DirectoryStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.data.lock().await.users.get(&id).cloned())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        let data = self.data.lock().await;
        let mut users: Vec<User> = ids.iter().filter_map(|id| data.users.get(id).cloned()).collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn find_subject(&self, id: Uuid) -> AppResult<Option<Subject>> {
        Ok(self.data.lock().await.subjects.get(&id).cloned())
    }

    async fn subjects_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Subject>> {
        let data = self.data.lock().await;
        let mut subjects: Vec<Subject> = ids
            .iter()
            .filter_map(|id| data.subjects.get(id).cloned())
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn subjects_for_teacher(&self, teacher_id: Uuid) -> AppResult<Vec<Subject>> {
        let data = self.data.lock().await;
        let mut subjects: Vec<Subject> = data
            .subjects
            .values()
            .filter(|s| s.teacher_id == teacher_id)
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }
}

impl MoodStore for MemoryStore {
    async fn insert_mood_entry(&self, entry: NewMoodEntry) -> AppResult<MoodEntry> {
        let row = MoodEntry {
            id: Uuid::new_v4(),
            owner_id: entry.owner_id,
            mood: entry.mood,
            energy: entry.energy,
            stress: entry.stress,
            note: entry.note,
            created_at: Utc::now(),
        };
        self.data.lock().await.mood_entries.push(row.clone());
        Ok(row)
    }

    async fn insert_recommendations(
        &self,
        mood_entry_id: Uuid,
        items: &[Recommendation],
    ) -> AppResult<Vec<MoodRecommendation>> {
        let mut data = self.data.lock().await;
        if data.fail_recommendations {
            return Err(AppError::Internal(anyhow::anyhow!("recommendation store offline")));
        }
        let rows: Vec<MoodRecommendation> = items
            .iter()
            .map(|item| MoodRecommendation {
                id: Uuid::new_v4(),
                mood_entry_id,
                text: item.text.clone(),
                category: item.category,
                provider: SYSTEM_PROVIDER.to_string(),
                created_at: Utc::now(),
            })
            .collect();
        data.recommendations.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn find_mood_entry(&self, owner_id: Uuid, entry_id: Uuid) -> AppResult<Option<MoodEntry>> {
        Ok(self
            .data
            .lock()
            .await
            .mood_entries
            .iter()
            .find(|e| e.id == entry_id && e.owner_id == owner_id)
            .cloned())
    }

    async fn list_mood_entries(&self, owner_id: Uuid) -> AppResult<Vec<MoodEntry>> {
        Ok(self
            .data
            .lock()
            .await
            .mood_entries
            .iter()
            .rev()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_recommendations(&self, mood_entry_id: Uuid) -> AppResult<Vec<MoodRecommendation>> {
        Ok(self
            .data
            .lock()
            .await
            .recommendations
            .iter()
            .filter(|r| r.mood_entry_id == mood_entry_id)
            .cloned()
            .collect())
    }

    async fn delete_mood_entry(&self, owner_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let mut data = self.data.lock().await;
        let owned = data
            .mood_entries
            .iter()
            .any(|e| e.id == entry_id && e.owner_id == owner_id);
        if !owned {
            return Ok(false);
        }
        data.recommendations.retain(|r| r.mood_entry_id != entry_id);
        data.mood_entries.retain(|e| e.id != entry_id);
        Ok(true)
    }
}

impl AttendanceStore for MemoryStore {
    async fn upsert_attendance(&self, input: AttendanceUpsert) -> AppResult<UpsertOutcome> {
        let mut data = self.data.lock().await;
        let existing = data.attendance.iter_mut().find(|r| {
            r.student_id == input.student_id
                && r.subject_id == input.subject_id
                && r.date == input.date
        });

        if let Some(record) = existing {
            record.status = input.status;
            if input.term.is_some() {
                record.term = input.term;
            }
            if input.level.is_some() {
                record.level = input.level;
            }
            if input.notes.is_some() {
                record.notes = input.notes;
            }
            record.updated_at = Utc::now();
            return Ok(UpsertOutcome {
                record: record.clone(),
                created: false,
            });
        }

        let now = Utc::now();
        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            student_id: input.student_id,
            subject_id: input.subject_id,
            date: input.date,
            status: input.status,
            term: input.term,
            level: input.level,
            notes: input.notes,
            marked_by: input.marked_by,
            created_at: now,
            updated_at: now,
        };
        data.attendance.push(record.clone());
        Ok(UpsertOutcome {
            record,
            created: true,
        })
    }

    async fn list_attendance(&self, scope: &AttendanceScope) -> AppResult<Vec<AttendanceRecord>> {
        let data = self.data.lock().await;
        let mut rows: Vec<AttendanceRecord> = data
            .attendance
            .iter()
            .filter(|r| match scope {
                AttendanceScope::Student(id) => r.student_id == *id,
                AttendanceScope::Subjects(ids) => ids.contains(&r.subject_id),
                AttendanceScope::All => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }
}

impl MarkStore for MemoryStore {
    async fn list_mark_details(&self, subject_ids: Option<&[Uuid]>) -> AppResult<Vec<MarkDetail>> {
        let data = self.data.lock().await;
        Ok(data
            .marks
            .iter()
            .rev()
            .filter(|m| subject_ids.map_or(true, |ids| ids.contains(&m.subject_id)))
            .map(|m| {
                let student = data.users.get(&m.student_id);
                let subject = data.subjects.get(&m.subject_id);
                MarkDetail {
                    mark: m.clone(),
                    student_name: student.map(|u| u.name.clone()),
                    admission_number: student.and_then(|u| u.admission_number.clone()),
                    student_email: student.map(|u| u.email.clone()),
                    subject_name: subject.map(|s| s.name.clone()),
                }
            })
            .collect())
    }
}
