use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub topic: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub estimated_hours: f64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudyPlanRequest {
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, max = 200, message = "Topic is required"))]
    pub topic: String,
    #[validate(length(max = 5000, message = "Description must be under 5000 characters"))]
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[validate(range(min = 0.0, max = 1000.0, message = "Estimated hours must be between 0 and 1000"))]
    pub estimated_hours: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudyPlanRequest {
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudyNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudyNoteRequest {
    #[validate(length(min = 1, max = 20000, message = "Note content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "card_difficulty", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FlashCard {
    pub id: Uuid,
    pub study_plan_id: Uuid,
    pub question: String,
    pub answer: String,
    pub difficulty: Option<Difficulty>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFlashCardRequest {
    #[validate(length(min = 1, max = 2000, message = "Question is required"))]
    pub question: String,
    #[validate(length(min = 1, max = 5000, message = "Answer is required"))]
    pub answer: String,
    pub difficulty: Option<Difficulty>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_plan_request_requires_due_date() {
        let json = r#"{"subject":"Maths","topic":"Algebra","estimatedHours":2}"#;
        assert!(serde_json::from_str::<CreateStudyPlanRequest>(json).is_err());
    }

    #[test]
    fn test_blank_topic_fails_validation() {
        let json = r#"{"subject":"Maths","topic":"","dueDate":"2025-06-01","estimatedHours":2}"#;
        let req: CreateStudyPlanRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_flashcard_difficulty_is_strict() {
        let bad = r#"{"question":"q","answer":"a","difficulty":"brutal"}"#;
        assert!(serde_json::from_str::<CreateFlashCardRequest>(bad).is_err());
    }
}
