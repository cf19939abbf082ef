//! Parsing of the registry's student roster CSV.
//!
//! Expected columns: name, email, admissionNumber, term, level. Rows are
//! validated one by one; a bad row is reported and never stops the import.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::user::{non_blank, Level, Role, User};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRosterRow {
    name: Option<String>,
    email: Option<String>,
    admission_number: Option<String>,
    term: Option<String>,
    level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    /// 1-based line number in the file, header included.
    pub line: usize,
    pub name: String,
    pub email: String,
    pub admission_number: String,
    pub term: String,
    pub level: Level,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterFailure {
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RosterAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStudent {
    pub name: String,
    pub email: String,
    pub admission_number: Option<String>,
    pub term: Option<String>,
    pub level: Option<Level>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterResult {
    pub action: RosterAction,
    pub student: RosterStudent,
}

pub fn parse_roster(body: &str) -> AppResult<(Vec<RosterRow>, Vec<RosterFailure>)> {
    if body.trim().is_empty() {
        return Err(AppError::Validation("No file uploaded".into()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Error processing CSV file: {}", e)))?;

    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for (idx, result) in reader.deserialize::<RawRosterRow>().enumerate() {
        let line = idx + 2;
        match result {
            Ok(raw) => match validate_row(line, raw) {
                Ok(row) => rows.push(row),
                Err(error) => failures.push(RosterFailure { row: line, error }),
            },
            Err(e) => failures.push(RosterFailure {
                row: line,
                error: e.to_string(),
            }),
        }
    }

    Ok((rows, failures))
}

fn validate_row(line: usize, raw: RawRosterRow) -> Result<RosterRow, String> {
    let field = |v: &Option<String>| non_blank(v.as_deref()).map(String::from);

    let (Some(name), Some(email), Some(admission_number), Some(term), Some(level)) = (
        field(&raw.name),
        field(&raw.email),
        field(&raw.admission_number),
        field(&raw.term),
        field(&raw.level),
    ) else {
        return Err("Missing required fields: name, email, admissionNumber, term, level".into());
    };

    let level = Level::parse(&level).ok_or_else(|| {
        format!(
            "Invalid level: {}. Must be \"Junior Secondary School\" or \"Senior Secondary School\"",
            level
        )
    })?;

    Ok(RosterRow {
        line,
        name,
        email,
        admission_number,
        term,
        level,
    })
}

/// Picks the student a roster row refers to from the accounts whose email
/// or admission number matches it. `None` means a new student is created.
pub fn match_existing_student<'a>(
    row: &RosterRow,
    candidates: &'a [User],
) -> AppResult<Option<&'a User>> {
    if candidates.iter().any(|u| u.role != Role::Student) {
        return Err(AppError::Validation(
            "Email or admission number belongs to a non-student account".into(),
        ));
    }

    let by_email = candidates.iter().find(|u| u.email == row.email);
    let by_admission = candidates
        .iter()
        .find(|u| u.admission_number.as_deref() == Some(row.admission_number.as_str()));

    match (by_email, by_admission) {
        (Some(a), Some(b)) if a.id != b.id => Err(AppError::Validation(
            "Email and admission number belong to different students".into(),
        )),
        (Some(student), _) | (None, Some(student)) => Ok(Some(student)),
        (None, None) => Ok(None),
    }
}
