use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::models::mark::MarkFilters;
use crate::services::csv_export::render_marks_csv;
use crate::services::marks::{self, MarkScope};
use crate::AppState;

/// Wraps a rendered CSV document as a file download.
pub fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn marks_filename() -> String {
    format!("marks_report_{}.csv", chrono::Utc::now().timestamp_millis())
}

async fn marks_report(state: &AppState, scope: MarkScope, filters: &MarkFilters) -> AppResult<Response> {
    let records = marks::marks_report(&state.store, scope, filters).await?;
    tracing::info!(rows = records.len(), "Marks report generated");
    Ok(csv_attachment(&marks_filename(), render_marks_csv(&records)))
}

pub async fn teacher_marks_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(filters): AppQuery<MarkFilters>,
) -> AppResult<Response> {
    marks_report(&state, MarkScope::Teacher(auth_user.id), &filters).await
}

pub async fn admin_marks_report(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<MarkFilters>,
) -> AppResult<Response> {
    marks_report(&state, MarkScope::All, &filters).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_csv_attachment_headers() {
        let response = csv_attachment("marks_report_1.csv", "a,b\n".into());
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"marks_report_1.csv\""
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"a,b\n");
    }

    #[test]
    fn test_marks_filename_shape() {
        let name = marks_filename();
        assert!(name.starts_with("marks_report_"));
        assert!(name.ends_with(".csv"));
    }
}
