use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::store::{AttendanceStore, DirectoryStore, MarkStore, MoodStore};
use crate::error::AppResult;
use crate::models::attendance::{
    AttendanceRecord, AttendanceScope, AttendanceUpsert, UpsertOutcome,
};
use crate::models::mark::MarkDetail;
use crate::models::mood::{
    MoodEntry, MoodRecommendation, NewMoodEntry, Recommendation, SYSTEM_PROVIDER,
};
use crate::models::subject::Subject;
use crate::models::user::User;

const MARK_DETAIL_SELECT: &str = r#"
    SELECT m.id, m.student_id, m.subject_id, m.marks, m.term, m.level, m.created_at,
           u.name AS student_name, u.admission_number, u.email AS student_email,
           s.name AS subject_name
    FROM marks m
    LEFT JOIN users u ON u.id = m.student_id
    LEFT JOIN subjects s ON s.id = m.subject_id
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    record: AttendanceRecord,
    inserted: bool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn mark_details_for_student(&self, student_id: Uuid) -> AppResult<Vec<MarkDetail>> {
        let sql = format!(
            "{} WHERE m.student_id = $1 ORDER BY m.created_at DESC",
            MARK_DETAIL_SELECT
        );
        let rows = sqlx::query_as::<_, MarkDetail>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

impl DirectoryStore for PgStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ANY($1) ORDER BY name ASC",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_subject(&self, id: Uuid) -> AppResult<Option<Subject>> {
        let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(subject)
    }

    async fn subjects_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT * FROM subjects WHERE id = ANY($1) ORDER BY name ASC",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    async fn subjects_for_teacher(&self, teacher_id: Uuid) -> AppResult<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT * FROM subjects WHERE teacher_id = $1 ORDER BY name ASC",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }
}

impl MoodStore for PgStore {
    async fn insert_mood_entry(&self, entry: NewMoodEntry) -> AppResult<MoodEntry> {
        let row = sqlx::query_as::<_, MoodEntry>(
            r#"
            INSERT INTO mood_entries (id, owner_id, mood, energy, stress, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.owner_id)
        .bind(entry.mood.as_str())
        .bind(entry.energy)
        .bind(entry.stress)
        .bind(&entry.note)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_recommendations(
        &self,
        mood_entry_id: Uuid,
        items: &[Recommendation],
    ) -> AppResult<Vec<MoodRecommendation>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        // Single statement, so the batch lands completely or not at all.
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO mood_recommendations \
             (id, mood_entry_id, recommendation, category, provider, position) ",
        );
        qb.push_values(items.iter().enumerate(), |mut row, (position, item)| {
            row.push_bind(Uuid::new_v4())
                .push_bind(mood_entry_id)
                .push_bind(item.text.as_str())
                .push_bind(item.category)
                .push_bind(SYSTEM_PROVIDER)
                .push_bind(position as i32);
        });
        qb.push(" RETURNING *");

        let rows = qb
            .build_query_as::<MoodRecommendation>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_mood_entry(&self, owner_id: Uuid, entry_id: Uuid) -> AppResult<Option<MoodEntry>> {
        let row = sqlx::query_as::<_, MoodEntry>(
            "SELECT * FROM mood_entries WHERE id = $1 AND owner_id = $2",
        )
        .bind(entry_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_mood_entries(&self, owner_id: Uuid) -> AppResult<Vec<MoodEntry>> {
        let rows = sqlx::query_as::<_, MoodEntry>(
            "SELECT * FROM mood_entries WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_recommendations(&self, mood_entry_id: Uuid) -> AppResult<Vec<MoodRecommendation>> {
        let rows = sqlx::query_as::<_, MoodRecommendation>(
            r#"
            SELECT * FROM mood_recommendations
            WHERE mood_entry_id = $1
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(mood_entry_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_mood_entry(&self, owner_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM mood_entries WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(entry_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            // dropping the transaction rolls it back
            return Ok(false);
        }

        let removed = sqlx::query("DELETE FROM mood_recommendations WHERE mood_entry_id = $1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM mood_entries WHERE id = $1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            entry_id = %entry_id,
            recommendations_removed = removed,
            "Mood entry deleted"
        );
        Ok(true)
    }
}

impl AttendanceStore for PgStore {
    async fn upsert_attendance(&self, input: AttendanceUpsert) -> AppResult<UpsertOutcome> {
        // The unique index on (student_id, subject_id, date) makes this a
        // single atomic create-or-update; marked_by keeps the first marker.
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO attendance
                (id, student_id, subject_id, date, status, term, level, notes, marked_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (student_id, subject_id, date) DO UPDATE SET
                status = EXCLUDED.status,
                term = COALESCE(EXCLUDED.term, attendance.term),
                level = COALESCE(EXCLUDED.level, attendance.level),
                notes = COALESCE(EXCLUDED.notes, attendance.notes),
                updated_at = NOW()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.student_id)
        .bind(input.subject_id)
        .bind(input.date)
        .bind(input.status)
        .bind(&input.term)
        .bind(input.level)
        .bind(&input.notes)
        .bind(input.marked_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(UpsertOutcome {
            record: row.record,
            created: row.inserted,
        })
    }

    async fn list_attendance(&self, scope: &AttendanceScope) -> AppResult<Vec<AttendanceRecord>> {
        let rows = match scope {
            AttendanceScope::Student(student_id) => {
                sqlx::query_as::<_, AttendanceRecord>(
                    r#"
                    SELECT * FROM attendance
                    WHERE student_id = $1
                    ORDER BY date DESC, created_at DESC
                    "#,
                )
                .bind(student_id)
                .fetch_all(&self.pool)
                .await?
            }
            AttendanceScope::Subjects(subject_ids) => {
                sqlx::query_as::<_, AttendanceRecord>(
                    r#"
                    SELECT * FROM attendance
                    WHERE subject_id = ANY($1)
                    ORDER BY date DESC, created_at DESC
                    "#,
                )
                .bind(subject_ids.clone())
                .fetch_all(&self.pool)
                .await?
            }
            AttendanceScope::All => {
                sqlx::query_as::<_, AttendanceRecord>(
                    "SELECT * FROM attendance ORDER BY date DESC, created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }
}

impl MarkStore for PgStore {
    async fn list_mark_details(&self, subject_ids: Option<&[Uuid]>) -> AppResult<Vec<MarkDetail>> {
        let sql = format!(
            "{} WHERE ($1::uuid[] IS NULL OR m.subject_id = ANY($1)) ORDER BY m.created_at DESC",
            MARK_DETAIL_SELECT
        );
        let rows = sqlx::query_as::<_, MarkDetail>(&sql)
            .bind(subject_ids.map(|ids| ids.to_vec()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
