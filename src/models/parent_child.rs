use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::attendance::AttendanceRecord;
use crate::models::mark::MarkDetail;
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ParentChild {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub child_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A child is identified either by user id or by admission number.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    pub parent_id: Uuid,
    pub child_id: Option<String>,
    pub child_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkRequest {
    pub parent_id: Uuid,
    pub child_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkFailure {
    pub child_id: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkLinkResponse {
    pub success: bool,
    pub linked: usize,
    pub failed: usize,
    pub results: Vec<ParentChild>,
    pub errors: Vec<LinkFailure>,
}

/// GET /api/parents/children
#[derive(Debug, Serialize)]
pub struct ChildOverview {
    #[serde(flatten)]
    pub student: User,
    pub marks: Vec<MarkDetail>,
    pub attendance: Vec<AttendanceRecord>,
}
