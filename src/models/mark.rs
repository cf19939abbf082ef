use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::Level;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub marks: f64,
    pub term: Option<String>,
    pub level: Option<Level>,
    pub created_at: DateTime<Utc>,
}

/// A mark joined with the student and subject it refers to. The joined
/// columns are optional because either side may have been removed.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MarkDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub mark: Mark,
    pub student_name: Option<String>,
    pub admission_number: Option<String>,
    pub student_email: Option<String>,
    pub subject_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarkRequest {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    #[validate(range(min = 0.0, max = 100.0, message = "Marks must be between 0 and 100"))]
    pub marks: f64,
    pub term: Option<String>,
    pub level: Option<Level>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMarkRequest {
    #[validate(range(min = 0.0, max = 100.0, message = "Marks must be between 0 and 100"))]
    pub marks: Option<f64>,
    pub term: Option<String>,
    pub level: Option<Level>,
}

/// Query filters shared by mark listings, statistics and the CSV report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkFilters {
    pub term: Option<String>,
    pub level: Option<Level>,
    pub subject_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
}

impl MarkFilters {
    pub fn matches(&self, mark: &Mark) -> bool {
        if let Some(term) = self.term.as_deref().filter(|t| !t.is_empty()) {
            if mark.term.as_deref() != Some(term) {
                return false;
            }
        }
        if let Some(level) = self.level {
            if mark.level != Some(level) {
                return false;
            }
        }
        if let Some(subject_id) = self.subject_id {
            if mark.subject_id != subject_id {
                return false;
            }
        }
        if let Some(student_id) = self.student_id {
            if mark.student_id != student_id {
                return false;
            }
        }
        true
    }
}

/// Per-subject summary of marks.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMarkStats {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub assessment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkStatsResponse {
    pub stats: Vec<SubjectMarkStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(term: Option<&str>, level: Option<Level>) -> Mark {
        Mark {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            marks: 70.0,
            term: term.map(String::from),
            level,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert!(MarkFilters::default().matches(&mark(None, None)));
    }

    #[test]
    fn test_term_and_level_filters() {
        let filters = MarkFilters {
            term: Some("Term 2".into()),
            level: Some(Level::SeniorSecondary),
            ..Default::default()
        };
        assert!(filters.matches(&mark(Some("Term 2"), Some(Level::SeniorSecondary))));
        assert!(!filters.matches(&mark(Some("Term 1"), Some(Level::SeniorSecondary))));
        assert!(!filters.matches(&mark(Some("Term 2"), None)));
    }

    #[test]
    fn test_blank_term_filter_is_ignored() {
        let filters = MarkFilters {
            term: Some(String::new()),
            ..Default::default()
        };
        assert!(filters.matches(&mark(None, None)));
    }

    #[test]
    fn test_create_request_camel_case() {
        let json = r#"{"studentId":"5f8d0d55-b54a-4c5f-9a6b-1c3e1c2b1a01","subjectId":"5f8d0d55-b54a-4c5f-9a6b-1c3e1c2b1a02","marks":88.5,"term":"Term 1"}"#;
        let req: CreateMarkRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.marks, 88.5);
        assert!(req.level.is_none());
    }
}
