use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::mark::MarkDetail;
use crate::models::user::User;

pub const MARKS_HEADER: &str = "Student Name,Admission Number,Email,Subject,Term,Level,Marks (%),Date";
pub const STUDENTS_HEADER: &str = "Name,Email,Admission Number,Term,Level,Created At";

const MISSING: &str = "N/A";

/// Wraps a field in double quotes, doubling any quote inside it.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn quote_or(value: Option<&str>, fallback: &str) -> String {
    quote(value.filter(|v| !v.is_empty()).unwrap_or(fallback))
}

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn render_marks_csv(records: &[MarkDetail]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(MARKS_HEADER);
    out.push('\n');

    for detail in records {
        let mark = &detail.mark;
        let row = [
            quote_or(detail.student_name.as_deref(), MISSING),
            quote_or(detail.admission_number.as_deref(), MISSING),
            quote_or(detail.student_email.as_deref(), MISSING),
            quote_or(detail.subject_name.as_deref(), MISSING),
            quote_or(mark.term.as_deref(), MISSING),
            quote_or(mark.level.map(|l| l.as_str()), MISSING),
            mark.marks.to_string(),
            quote(&iso(&mark.created_at)),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn render_students_csv(students: &[User]) -> String {
    let mut out = String::with_capacity(64 * (students.len() + 1));
    out.push_str(STUDENTS_HEADER);
    out.push('\n');

    for student in students {
        let row = [
            quote(&student.name),
            quote(&student.email),
            quote_or(student.admission_number.as_deref(), ""),
            quote_or(student.term.as_deref(), ""),
            quote_or(student.level.map(|l| l.as_str()), ""),
            quote(&iso(&student.created_at)),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::models::mark::Mark;
    use crate::models::user::{Level, Role};

    fn detail(name: Option<&str>, marks: f64) -> MarkDetail {
        MarkDetail {
            mark: Mark {
                id: Uuid::new_v4(),
                student_id: Uuid::new_v4(),
                subject_id: Uuid::new_v4(),
                marks,
                term: Some("Term 1".into()),
                level: Some(Level::SeniorSecondary),
                created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
            },
            student_name: name.map(String::from),
            admission_number: None,
            student_email: Some("ada@school.test".into()),
            subject_name: Some("Chemistry".into()),
        }
    }

    #[test]
    fn test_marks_row_layout() {
        let csv = render_marks_csv(&[detail(Some("Ada"), 85.0)]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(MARKS_HEADER));
        assert_eq!(
            lines.next(),
            Some(r#""Ada","N/A","ada@school.test","Chemistry","Term 1","Senior Secondary School",85,"2025-03-14T09:30:00.000Z""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_missing_student_renders_placeholder() {
        let csv = render_marks_csv(&[detail(None, 0.0)]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(r#""N/A","N/A","#));
        assert!(row.contains(",0,"));
    }

    #[test]
    fn test_embedded_quote_survives_csv_parser() {
        let name = r#"Chinedu "CJ" Okafor"#;
        let csv = render_marks_csv(&[detail(Some(name), 72.5)]);
        assert!(csv.contains(r#""Chinedu ""CJ"" Okafor""#));

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(6), Some("Marks (%)"));

        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.get(0), Some(name));
        assert_eq!(record.get(6), Some("72.5"));
    }

    #[test]
    fn test_students_export_uses_blank_for_missing() {
        let student = User {
            id: Uuid::new_v4(),
            admission_number: None,
            name: "Bola, Jr".into(),
            email: "bola@school.test".into(),
            password_hash: String::new(),
            role: Role::Student,
            level: Some(Level::JuniorSecondary),
            term: Some("Term 2".into()),
            created_at: Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap(),
        };
        let csv = render_students_csv(&[student]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            r#""Bola, Jr","bola@school.test","","Term 2","Junior Secondary School","2025-01-06T00:00:00.000Z""#
        );
    }
}
