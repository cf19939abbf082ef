//! Grouped statistics over attendance and mark records.
//!
//! Attendance groups are materialized up front from the caller's scope, so a
//! group with no matching records still shows up with zero counts. Mark
//! groups only exist for subjects that have at least one record.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::attendance::{AttendanceGroup, AttendanceRecord, AttendanceStatus, GroupBy};
use crate::models::mark::{MarkDetail, SubjectMarkStats};

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `(present + excused) / total` as a percentage with one decimal; 0 for an
/// empty group.
pub fn attendance_rate(present: i64, excused: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1((present + excused) as f64 / total as f64 * 100.0)
}

pub fn unknown_label(group_by: GroupBy) -> &'static str {
    match group_by {
        GroupBy::Subject => "Unknown Subject",
        GroupBy::Student => "Unknown Student",
    }
}

/// Counts `records` (already filtered) per group.
///
/// Every key in `labels` yields a group even when it has no records. A
/// record whose key has no label still gets its own group.
pub fn aggregate_attendance(
    records: &[AttendanceRecord],
    group_by: GroupBy,
    labels: &BTreeMap<Uuid, String>,
) -> Vec<AttendanceGroup> {
    let mut groups: BTreeMap<Uuid, AttendanceGroup> = labels
        .iter()
        .map(|(key, name)| (*key, empty_group(*key, name.clone())))
        .collect();

    for record in records {
        let key = group_by.key_of(record);
        let group = groups
            .entry(key)
            .or_insert_with(|| empty_group(key, unknown_label(group_by).to_string()));

        group.total += 1;
        match record.status {
            AttendanceStatus::Present => group.present += 1,
            AttendanceStatus::Absent => group.absent += 1,
            AttendanceStatus::Late => group.late += 1,
            AttendanceStatus::Excused => group.excused += 1,
        }
    }

    groups
        .into_values()
        .map(|mut group| {
            group.attendance_rate = attendance_rate(group.present, group.excused, group.total);
            group
        })
        .collect()
}

fn empty_group(group_key: Uuid, name: String) -> AttendanceGroup {
    AttendanceGroup {
        group_key,
        name,
        total: 0,
        present: 0,
        absent: 0,
        late: 0,
        excused: 0,
        attendance_rate: 0.0,
    }
}

struct MarkAccumulator {
    name: Option<String>,
    sum: f64,
    highest: f64,
    lowest: f64,
    count: i64,
}

/// Per-subject average, highest, lowest and count, ordered by subject id.
pub fn aggregate_marks(records: &[MarkDetail]) -> Vec<SubjectMarkStats> {
    let mut groups: BTreeMap<Uuid, MarkAccumulator> = BTreeMap::new();

    for detail in records {
        let value = detail.mark.marks;
        let acc = groups
            .entry(detail.mark.subject_id)
            .or_insert_with(|| MarkAccumulator {
                name: None,
                sum: 0.0,
                highest: f64::MIN,
                lowest: f64::MAX,
                count: 0,
            });
        if acc.name.is_none() {
            acc.name = detail.subject_name.clone();
        }
        acc.sum += value;
        acc.highest = acc.highest.max(value);
        acc.lowest = acc.lowest.min(value);
        acc.count += 1;
    }

    groups
        .into_iter()
        .map(|(subject_id, acc)| SubjectMarkStats {
            subject_id,
            subject_name: acc
                .name
                .unwrap_or_else(|| unknown_label(GroupBy::Subject).to_string()),
            average: round1(acc.sum / acc.count as f64),
            highest: acc.highest,
            lowest: acc.lowest,
            assessment_count: acc.count,
        })
        .collect()
}
