use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub admission_number: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub level: Option<Level>,
    pub term: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Parent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Admin => "admin",
        }
    }
}

/// School stage a student is enrolled in. Anything else is rejected at the
/// boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "school_level")]
pub enum Level {
    #[sqlx(rename = "Junior Secondary School")]
    #[serde(rename = "Junior Secondary School")]
    JuniorSecondary,
    #[sqlx(rename = "Senior Secondary School")]
    #[serde(rename = "Senior Secondary School")]
    SeniorSecondary,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::JuniorSecondary => "Junior Secondary School",
            Level::SeniorSecondary => "Senior Secondary School",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Junior Secondary School" => Some(Level::JuniorSecondary),
            "Senior Secondary School" => Some(Level::SeniorSecondary),
            _ => None,
        }
    }
}

/// Summary returned with a token on register / login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
            level: u.level,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
    pub role: Role,
    pub admission_number: Option<String>,
    pub level: Option<Level>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/admin/users
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
    pub role: Role,
    pub admission_number: Option<String>,
    pub level: Option<Level>,
    pub term: Option<String>,
}

/// PUT /api/admin/users/:id, every field optional
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub admission_number: Option<String>,
    pub level: Option<Level>,
    pub term: Option<String>,
}

/// GET /api/admin/users?role=
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub student_id: Uuid,
    pub term: Option<String>,
    pub level: Option<Level>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub term: Option<String>,
    pub level: Option<Level>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub message: String,
    pub student: User,
}

/// Validated input for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub admission_number: Option<String>,
    pub level: Option<Level>,
    pub term: Option<String>,
}

/// Returns the trimmed value, treating blank strings as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_rejects_unknown_value() {
        let ok: Result<Level, _> = serde_json::from_str(r#""Senior Secondary School""#);
        assert_eq!(ok.unwrap(), Level::SeniorSecondary);

        let bad: Result<Level, _> = serde_json::from_str(r#""Primary School""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_level_parse_trims() {
        assert_eq!(
            Level::parse("  Junior Secondary School "),
            Some(Level::JuniorSecondary)
        );
        assert_eq!(Level::parse("junior"), None);
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            admission_number: Some("ADM-1".into()),
            name: "Amina".into(),
            email: "amina@school.test".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Student,
            level: Some(Level::JuniorSecondary),
            term: Some("Term 1".into()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["admissionNumber"], "ADM-1");
        assert_eq!(json["role"], "student");
        assert_eq!(json["level"], "Junior Secondary School");
    }

    #[test]
    fn test_register_request_role_is_strict() {
        let json = r#"{"name":"A","email":"a@b.co","password":"secret1","role":"janitor"}"#;
        assert!(serde_json::from_str::<RegisterRequest>(json).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
