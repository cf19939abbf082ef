use uuid::Uuid;

use crate::db::store::DirectoryStore;
use crate::error::{AppError, AppResult};
use crate::models::subject::Subject;
use crate::models::user::{Role, User};

/// Loads the subject and checks that `teacher_id` teaches it.
pub async fn ensure_teaches<S: DirectoryStore>(
    store: &S,
    teacher_id: Uuid,
    subject_id: Uuid,
) -> AppResult<Subject> {
    let subject = store
        .find_subject(subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))?;

    if subject.teacher_id != teacher_id {
        return Err(AppError::Forbidden(
            "You can only manage records for your own subjects".into(),
        ));
    }
    Ok(subject)
}

pub async fn find_student<S: DirectoryStore>(store: &S, student_id: Uuid) -> AppResult<User> {
    store
        .find_user(student_id)
        .await?
        .filter(|u| u.role == Role::Student)
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    #[tokio::test]
    async fn test_ensure_teaches() {
        let store = MemoryStore::new();
        let owner = store.add_user("Mrs Obi", Role::Teacher).await;
        let other = store.add_user("Mr Lawal", Role::Teacher).await;
        let subject = store.add_subject("Biology", owner.id).await;

        assert!(ensure_teaches(&store, owner.id, subject.id).await.is_ok());
        assert!(matches!(
            ensure_teaches(&store, other.id, subject.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_teaches(&store, owner.id, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_student_rejects_other_roles() {
        let store = MemoryStore::new();
        let teacher = store.add_user("Mr Lawal", Role::Teacher).await;
        let student = store.add_user("Ada", Role::Student).await;

        assert_eq!(find_student(&store, student.id).await.unwrap().id, student.id);
        assert!(matches!(
            find_student(&store, teacher.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
