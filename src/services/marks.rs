use uuid::Uuid;

use crate::db::store::MarkStore;
use crate::error::{AppError, AppResult};
use crate::models::mark::{MarkDetail, MarkFilters, SubjectMarkStats};
use crate::services::aggregation::aggregate_marks;

#[derive(Debug, Clone, Copy)]
pub enum MarkScope {
    /// Only subjects taught by this teacher.
    Teacher(Uuid),
    All,
}

/// Marks in the caller's subjects that pass `filters`, newest first.
/// `None` when a teacher has no subjects at all.
async fn scoped_marks<S: MarkStore>(
    store: &S,
    scope: MarkScope,
    filters: &MarkFilters,
) -> AppResult<Option<Vec<MarkDetail>>> {
    let details = match scope {
        MarkScope::Teacher(teacher_id) => {
            let subject_ids: Vec<Uuid> = store
                .subjects_for_teacher(teacher_id)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect();
            if subject_ids.is_empty() {
                return Ok(None);
            }
            store.list_mark_details(Some(&subject_ids)).await?
        }
        MarkScope::All => store.list_mark_details(None).await?,
    };

    Ok(Some(
        details
            .into_iter()
            .filter(|d| filters.matches(&d.mark))
            .collect(),
    ))
}

pub async fn list_marks<S: MarkStore>(
    store: &S,
    scope: MarkScope,
    filters: &MarkFilters,
) -> AppResult<Vec<MarkDetail>> {
    Ok(scoped_marks(store, scope, filters).await?.unwrap_or_default())
}

/// Per-subject statistics. Subjects without a matching mark are left out.
pub async fn marks_stats<S: MarkStore>(
    store: &S,
    scope: MarkScope,
    filters: &MarkFilters,
) -> AppResult<Vec<SubjectMarkStats>> {
    let details = scoped_marks(store, scope, filters).await?.unwrap_or_default();
    Ok(aggregate_marks(&details))
}

/// Rows for the marks CSV report.
pub async fn marks_report<S: MarkStore>(
    store: &S,
    scope: MarkScope,
    filters: &MarkFilters,
) -> AppResult<Vec<MarkDetail>> {
    scoped_marks(store, scope, filters)
        .await?
        .ok_or_else(|| AppError::Validation("No subjects found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::user::{Level, Role};
    use crate::services::csv_export::render_marks_csv;

    #[tokio::test]
    async fn test_teacher_stats_only_cover_own_subjects() {
        let store = MemoryStore::new();
        let teacher = store.add_user("Mrs Obi", Role::Teacher).await;
        let other = store.add_user("Mr Lawal", Role::Teacher).await;
        let student = store.add_user("Ada", Role::Student).await;
        let maths = store.add_subject("Mathematics", teacher.id).await;
        let _empty = store.add_subject("Geography", teacher.id).await;
        let art = store.add_subject("Art", other.id).await;

        store.add_mark(student.id, maths.id, 60.0, Some("Term 1"), None).await;
        store.add_mark(student.id, maths.id, 90.0, Some("Term 1"), None).await;
        store.add_mark(student.id, art.id, 40.0, Some("Term 1"), None).await;

        let stats = marks_stats(&store, MarkScope::Teacher(teacher.id), &MarkFilters::default())
            .await
            .unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].subject_name, "Mathematics");
        assert_eq!(stats[0].average, 75.0);
        assert_eq!((stats[0].highest, stats[0].lowest), (90.0, 60.0));
        assert_eq!(stats[0].assessment_count, 2);
    }

    #[tokio::test]
    async fn test_filtered_out_subject_is_omitted() {
        let store = MemoryStore::new();
        let teacher = store.add_user("Mrs Obi", Role::Teacher).await;
        let student = store.add_user("Ada", Role::Student).await;
        let maths = store.add_subject("Mathematics", teacher.id).await;
        let physics = store.add_subject("Physics", teacher.id).await;

        store.add_mark(student.id, maths.id, 70.0, Some("Term 2"), Some(Level::SeniorSecondary)).await;
        store.add_mark(student.id, physics.id, 55.0, Some("Term 1"), Some(Level::SeniorSecondary)).await;

        let filters = MarkFilters {
            term: Some("Term 2".into()),
            ..Default::default()
        };
        let stats = marks_stats(&store, MarkScope::All, &filters).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].subject_id, maths.id);
    }

    #[tokio::test]
    async fn test_teacher_without_subjects() {
        let store = MemoryStore::new();
        let teacher = store.add_user("New Teacher", Role::Teacher).await;

        let stats = marks_stats(&store, MarkScope::Teacher(teacher.id), &MarkFilters::default())
            .await
            .unwrap();
        assert!(stats.is_empty());

        let err = marks_report(&store, MarkScope::Teacher(teacher.id), &MarkFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "No subjects found"));
    }

    #[tokio::test]
    async fn test_foreign_subject_filter_yields_nothing() {
        let store = MemoryStore::new();
        let teacher = store.add_user("Mrs Obi", Role::Teacher).await;
        let other = store.add_user("Mr Lawal", Role::Teacher).await;
        let student = store.add_user("Ada", Role::Student).await;
        let maths = store.add_subject("Mathematics", teacher.id).await;
        let art = store.add_subject("Art", other.id).await;
        store.add_mark(student.id, maths.id, 80.0, None, None).await;
        store.add_mark(student.id, art.id, 45.0, None, None).await;

        let filters = MarkFilters {
            subject_id: Some(art.id),
            ..Default::default()
        };
        let rows = marks_report(&store, MarkScope::Teacher(teacher.id), &filters).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_report_rows_render_with_names() {
        let store = MemoryStore::new();
        let teacher = store.add_user("Mrs Obi", Role::Teacher).await;
        let student = store.add_user("Ada", Role::Student).await;
        let maths = store.add_subject("Mathematics", teacher.id).await;
        store.add_mark(student.id, maths.id, 88.5, Some("Term 1"), None).await;

        let rows = marks_report(&store, MarkScope::Teacher(teacher.id), &MarkFilters::default())
            .await
            .unwrap();
        let csv = render_marks_csv(&rows);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.starts_with(r#""Ada","N/A","ada@school.test","Mathematics","Term 1","N/A",88.5,"#));
    }
}
