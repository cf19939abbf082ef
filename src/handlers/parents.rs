use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::db::store::AttendanceStore;
use crate::error::AppResult;
use crate::models::attendance::AttendanceScope;
use crate::models::parent_child::ChildOverview;
use crate::models::user::User;
use crate::AppState;

/// Every child linked to the caller with their marks and attendance.
pub async fn list_children(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<ChildOverview>>> {
    let children = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM parent_child pc
        JOIN users u ON u.id = pc.child_id
        WHERE pc.parent_id = $1
        ORDER BY u.name ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let mut overviews = Vec::with_capacity(children.len());
    for student in children {
        let marks = state.store.mark_details_for_student(student.id).await?;
        let attendance = state
            .store
            .list_attendance(&AttendanceScope::Student(student.id))
            .await?;
        overviews.push(ChildOverview {
            student,
            marks,
            attendance,
        });
    }

    Ok(Json(overviews))
}
