use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Self-reported mood. Values outside the known set are kept verbatim in
/// `Other`: they are stored as given and simply earn no mood-specific
/// recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
    Stressed,
    Okay,
    Other(String),
}

impl Mood {
    pub fn as_str(&self) -> &str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Stressed => "stressed",
            Mood::Okay => "okay",
            Mood::Other(raw) => raw,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for Mood {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "happy" => Mood::Happy,
            "neutral" => Mood::Neutral,
            "sad" => Mood::Sad,
            "stressed" => Mood::Stressed,
            "okay" => Mood::Okay,
            _ => Mood::Other(raw),
        }
    }
}

impl From<&str> for Mood {
    fn from(raw: &str) -> Self {
        Mood::from(raw.to_string())
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        match mood {
            Mood::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[sqlx(try_from = "String")]
    pub mood: Mood,
    pub energy: Option<i32>,
    pub stress: Option<i32>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "recommendation_category")]
pub enum RecommendationCategory {
    Wellbeing,
    #[sqlx(rename = "Study Tips")]
    #[serde(rename = "Study Tips")]
    StudyTips,
    #[sqlx(rename = "Energy Boost")]
    #[serde(rename = "Energy Boost")]
    EnergyBoost,
    #[sqlx(rename = "Stress Relief")]
    #[serde(rename = "Stress Relief")]
    StressRelief,
    Support,
    General,
}

/// Origin tag stored with generated recommendations.
pub const SYSTEM_PROVIDER: &str = "system";

/// A generated suggestion before it is attached to a stored entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub text: String,
    pub category: RecommendationCategory,
}

impl Recommendation {
    pub fn new(category: RecommendationCategory, text: &str) -> Self {
        Self {
            text: text.to_string(),
            category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecommendation {
    pub id: Uuid,
    pub mood_entry_id: Uuid,
    #[sqlx(rename = "recommendation")]
    pub text: String,
    pub category: RecommendationCategory,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

/// POST /api/students/mood-entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodEntryRequest {
    pub mood: Option<Mood>,
    #[validate(range(min = 0, max = 10, message = "Energy must be between 0 and 10"))]
    pub energy: Option<i32>,
    #[validate(range(min = 0, max = 10, message = "Stress must be between 0 and 10"))]
    pub stress: Option<i32>,
    #[serde(alias = "notes")]
    pub note: Option<String>,
}

/// Validated input for persisting a mood entry.
#[derive(Debug, Clone)]
pub struct NewMoodEntry {
    pub owner_id: Uuid,
    pub mood: Mood,
    pub energy: Option<i32>,
    pub stress: Option<i32>,
    pub note: Option<String>,
}
