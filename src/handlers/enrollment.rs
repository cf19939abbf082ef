use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::placeholder_hash;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::auth::insert_user;
use crate::handlers::reports::csv_attachment;
use crate::models::batch::BatchReport;
use crate::models::user::{
    non_blank, EnrollRequest, EnrollmentResponse, NewUser, Role, UpdateEnrollmentRequest, User,
};
use crate::services::access::find_student;
use crate::services::csv_export::render_students_csv;
use crate::services::roster::{
    match_existing_student, parse_roster, RosterAction, RosterFailure, RosterResult, RosterRow,
    RosterStudent,
};
use crate::AppState;

pub async fn enroll_student(
    State(state): State<AppState>,
    AppJson(body): AppJson<EnrollRequest>,
) -> AppResult<Json<EnrollmentResponse>> {
    let (Some(term), Some(level)) = (non_blank(body.term.as_deref()), body.level) else {
        return Err(AppError::Validation(
            "Student ID, term, and level are required".into(),
        ));
    };
    find_student(&state.store, body.student_id).await?;

    let student = sqlx::query_as::<_, User>(
        "UPDATE users SET term = $2, level = $3 WHERE id = $1 RETURNING *",
    )
    .bind(body.student_id)
    .bind(term)
    .bind(level)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(EnrollmentResponse {
        message: "Student enrolled successfully".into(),
        student,
    }))
}

async fn enrolled_students(db: &PgPool) -> AppResult<Vec<User>> {
    let students = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE role = $1 AND term IS NOT NULL AND level IS NOT NULL
        ORDER BY name ASC
        "#,
    )
    .bind(Role::Student)
    .fetch_all(db)
    .await?;
    Ok(students)
}

pub async fn list_enrollments(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(enrolled_students(&state.db).await?))
}

pub async fn update_enrollment(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateEnrollmentRequest>,
) -> AppResult<Json<EnrollmentResponse>> {
    let current = find_student(&state.store, student_id).await?;

    let student = sqlx::query_as::<_, User>(
        "UPDATE users SET term = $2, level = $3 WHERE id = $1 RETURNING *",
    )
    .bind(student_id)
    .bind(non_blank(body.term.as_deref()).or(current.term.as_deref()))
    .bind(body.level.or(current.level))
    .fetch_one(&state.db)
    .await?;

    Ok(Json(EnrollmentResponse {
        message: "Enrollment updated successfully".into(),
        student,
    }))
}

pub async fn export_students(State(state): State<AppState>) -> AppResult<Response> {
    let students = enrolled_students(&state.db).await?;
    let filename = format!(
        "enrolled_students_{}.csv",
        chrono::Utc::now().timestamp_millis()
    );
    Ok(csv_attachment(&filename, render_students_csv(&students)))
}

fn roster_student(user: &User) -> RosterStudent {
    RosterStudent {
        name: user.name.clone(),
        email: user.email.clone(),
        admission_number: user.admission_number.clone(),
        term: user.term.clone(),
        level: user.level,
    }
}

/// Updates the student matching the row's email or admission number, or
/// creates a new student with an unusable password. Rows whose keys point
/// at a non-student or at two different students fail.
async fn reconcile_row(db: &PgPool, row: &RosterRow) -> AppResult<RosterResult> {
    let candidates = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE email = $1 OR admission_number = $2",
    )
    .bind(&row.email)
    .bind(&row.admission_number)
    .fetch_all(db)
    .await?;

    if let Some(student) = match_existing_student(row, &candidates)? {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET name = $2, term = $3, level = $4
            WHERE id = $1 AND role = $5
            RETURNING *
            "#,
        )
        .bind(student.id)
        .bind(&row.name)
        .bind(&row.term)
        .bind(row.level)
        .bind(Role::Student)
        .fetch_one(db)
        .await?;

        return Ok(RosterResult {
            action: RosterAction::Updated,
            student: roster_student(&updated),
        });
    }

    let created = insert_user(
        db,
        NewUser {
            name: row.name.clone(),
            email: row.email.clone(),
            password_hash: placeholder_hash()?,
            role: Role::Student,
            admission_number: Some(row.admission_number.clone()),
            level: Some(row.level),
            term: Some(row.term.clone()),
        },
    )
    .await?;

    Ok(RosterResult {
        action: RosterAction::Created,
        student: roster_student(&created),
    })
}

pub async fn import_students(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<BatchReport<RosterResult, RosterFailure>>> {
    let (rows, mut failures) = parse_roster(&body)?;

    let mut results = Vec::with_capacity(rows.len());
    for row in &rows {
        match reconcile_row(&state.db, row).await {
            Ok(result) => results.push(result),
            Err(e) => failures.push(RosterFailure {
                row: row.line,
                error: e.public_message(),
            }),
        }
    }
    failures.sort_by_key(|f| f.row);

    tracing::info!(
        created = results.iter().filter(|r| r.action == RosterAction::Created).count(),
        updated = results.iter().filter(|r| r.action == RosterAction::Updated).count(),
        failed = failures.len(),
        "Roster import finished"
    );

    Ok(Json(
        BatchReport::new(results, failures).with_message("Import completed"),
    ))
}
