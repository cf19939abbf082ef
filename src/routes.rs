use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::{
    require_admin, require_auth, require_parent, require_student, require_teacher,
};
use crate::auth::rate_limit::rate_limit_auth;
use crate::config::Config;
use crate::handlers;
use crate::AppState;

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(config.cors_extra_origins.iter())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

fn student_routes() -> Router<AppState> {
    use handlers::{attendance, marks, mood, study};

    Router::new()
        .route("/api/students/marks", get(marks::student_marks))
        .route("/api/students/attendance", get(attendance::student_attendance))
        .route(
            "/api/students/attendance/stats",
            get(attendance::student_attendance_stats),
        )
        // Mood
        .route(
            "/api/students/mood-entries",
            get(mood::list_mood_entries).post(mood::create_mood_entry),
        )
        .route(
            "/api/students/mood-entries/:id",
            delete(mood::delete_mood_entry),
        )
        .route(
            "/api/students/mood-entries/:id/recommendations",
            get(mood::get_recommendations),
        )
        // Study tools
        .route(
            "/api/students/notes",
            get(study::list_notes).post(study::create_note),
        )
        .route(
            "/api/students/study-plans",
            get(study::list_study_plans).post(study::create_study_plan),
        )
        .route(
            "/api/students/study-plans/:id",
            patch(study::update_study_plan).delete(study::delete_study_plan),
        )
        .route(
            "/api/students/study-plans/:id/flashcards",
            get(study::list_flashcards).post(study::create_flashcard),
        )
        .route(
            "/api/students/flashcards/:id",
            delete(study::delete_flashcard),
        )
        .route_layer(middleware::from_fn(require_student))
}

fn teacher_routes() -> Router<AppState> {
    use handlers::{attendance, enrollment, marks, reports, subjects};

    Router::new()
        .route(
            "/api/teachers/subjects",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route("/api/teachers/subjects/:id/marks", get(marks::subject_marks))
        .route("/api/teachers/students", get(subjects::list_students))
        .route(
            "/api/teachers/subjects/:id/students",
            get(subjects::list_students),
        )
        // Marks
        .route("/api/teachers/marks", post(marks::create_mark))
        .route("/api/teachers/marks/all", get(marks::teacher_all_marks))
        .route("/api/teachers/marks/stats", get(marks::teacher_marks_stats))
        .route(
            "/api/teachers/marks/:id",
            put(marks::teacher_update_mark).delete(marks::teacher_delete_mark),
        )
        .route("/api/teachers/my-marks", get(marks::my_marks))
        .route("/api/teachers/reports/marks", get(reports::teacher_marks_report))
        // Enrollment and roster
        .route("/api/teachers/enroll", post(enrollment::enroll_student))
        .route("/api/teachers/enrollments", get(enrollment::list_enrollments))
        .route(
            "/api/teachers/enrollments/:id",
            put(enrollment::update_enrollment),
        )
        .route(
            "/api/teachers/import-students",
            post(enrollment::import_students),
        )
        .route(
            "/api/teachers/export-students",
            get(enrollment::export_students),
        )
        // Attendance
        .route(
            "/api/teachers/attendance",
            get(attendance::teacher_attendance).post(attendance::mark_attendance),
        )
        .route(
            "/api/teachers/attendance/bulk",
            post(attendance::bulk_mark_attendance),
        )
        .route(
            "/api/teachers/attendance/stats",
            get(attendance::teacher_attendance_stats),
        )
        .route(
            "/api/teachers/attendance/:id",
            put(attendance::update_attendance).delete(attendance::delete_attendance),
        )
        .route_layer(middleware::from_fn(require_teacher))
}

fn parent_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/parents/children",
            get(handlers::parents::list_children),
        )
        .route_layer(middleware::from_fn(require_parent))
}

fn admin_routes() -> Router<AppState> {
    use handlers::{admin, attendance, marks, reports};

    Router::new()
        .route("/api/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/api/admin/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/api/admin/stats", get(admin::dashboard_stats))
        .route(
            "/api/admin/students/:id/marks",
            get(marks::admin_student_marks),
        )
        .route("/api/admin/marks/all", get(marks::admin_all_marks))
        .route("/api/admin/marks/stats", get(marks::admin_marks_stats))
        .route(
            "/api/admin/marks/:id",
            put(marks::admin_update_mark).delete(marks::admin_delete_mark),
        )
        .route("/api/admin/reports/marks", get(reports::admin_marks_report))
        .route(
            "/api/admin/attendance/stats",
            get(attendance::admin_attendance_stats),
        )
        .route(
            "/api/admin/parent-child",
            post(admin::link_parent_child).delete(admin::unlink_parent_child),
        )
        .route_layer(middleware::from_fn(require_admin))
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .merge(student_routes())
        .merge(teacher_routes())
        .merge(parent_routes())
        .merge(admin_routes())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::jwt::{create_access_token, test_config};
    use crate::auth::rate_limit::RateLimiter;
    use crate::db::PgStore;
    use crate::models::user::Role;

    fn test_app(auth_limit: u32) -> (Router, Arc<Config>) {
        let config = Arc::new(test_config());
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let state = AppState {
            store: PgStore::new(db.clone()),
            db,
            config: config.clone(),
            rate_limiter: RateLimiter::new(auth_limit, 60),
        };
        let app = build_router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        (app, config)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_database() {
        let (app, _) = test_app(5);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["service"], "edubridge-api");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _) = test_app(5);
        let response = app
            .oneshot(
                Request::get("/api/students/mood-entries")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let (app, config) = test_app(5);
        let token = create_access_token(Uuid::new_v4(), Role::Student, &config).unwrap();

        let response = app
            .oneshot(
                Request::get("/api/teachers/marks/stats")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Access denied");
    }

    #[tokio::test]
    async fn test_subject_students_alias_is_teacher_only() {
        let (app, config) = test_app(5);
        let uri = format!("/api/teachers/subjects/{}/students", Uuid::new_v4());

        let response = app
            .clone()
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = create_access_token(Uuid::new_v4(), Role::Parent, &config).unwrap();
        let response = app
            .oneshot(
                Request::get(uri.as_str())
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Access denied");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_payload() {
        let (app, _) = test_app(5);
        let response = app
            .oneshot(
                Request::post("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_login_is_rate_limited_per_client() {
        let (app, _) = test_app(2);
        let login = || {
            Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"","password":""}"#))
                .unwrap()
        };

        for _ in 0..2 {
            let response = app.clone().oneshot(login()).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = app.oneshot(login()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
