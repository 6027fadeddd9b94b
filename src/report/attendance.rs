//! Attendance summary and its detailed breakdowns.

use chrono::TimeDelta;
use serde::Serialize;

use crate::aggregate::{self, DimensionKey, StatusTally};
use crate::config::ReportConfig;
use crate::directory::Directory;
use crate::models::duration::as_hours;
use crate::models::{
    AttendanceRecord, AttendanceStatus, EmployeeId, MonthlyAttendanceSummary, ScheduleStatus, WorkSchedule,
};
use crate::ranking::{self, RankedEntry};
use crate::rates::{self, Precision};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAttendance {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    #[serde(flatten)]
    pub counts: StatusTally<AttendanceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_records: usize,
    pub total_employees: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub late_rate: f64,
    pub absence_rate: f64,
    pub total_work_hours: f64,
    pub total_overtime_hours: f64,
    pub by_employee: Vec<EmployeeAttendance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_metrics: Option<AttendanceDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAttendance {
    pub shift_id: DimensionKey<i32>,
    pub shift_name: String,
    pub total: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDetail {
    pub by_status: StatusTally<AttendanceStatus>,
    pub by_shift: Vec<ShiftAttendance>,
    pub by_schedule_status: StatusTally<ScheduleStatus>,
    pub top_late: Vec<RankedEntry<EmployeeId>>,
    /// Employees with records but no late or absent day.
    pub perfect_attendance_count: usize,
    pub monthly_summaries: Vec<MonthlyAttendanceSummary>,
}

/// Name from the first attendance record of the employee, else the directory.
fn employee_name(records: &[AttendanceRecord], directory: &Directory, id: EmployeeId) -> String {
    let name = ranking::first_match_name(records, &id, |r| r.employee_id, |r| r.employee_name.as_str());
    if name.is_empty() { directory.employee_name(id) } else { name }
}

/// Sum of durations in hours, saturating at the `TimeDelta` bounds.
fn total_duration(durations: impl Iterator<Item = TimeDelta>) -> f64 {
    let total = durations.fold(TimeDelta::zero(), |acc, d| {
        acc.checked_add(&d)
            .unwrap_or(if d < TimeDelta::zero() { TimeDelta::MIN } else { TimeDelta::MAX })
    });
    rates::round_to(as_hours(total), 1)
}

/// Headline counts and per-employee status tallies.
pub fn summarize(records: &[AttendanceRecord], directory: &Directory, precision: Precision) -> AttendanceSummary {
    let by_status = aggregate::by_status(records, |r| r.status);
    let by_employee: Vec<EmployeeAttendance> = aggregate::by_employee(records, |r| r.employee_id, |r| r.status)
        .into_iter()
        .map(|bucket| EmployeeAttendance {
            employee_id: bucket.key,
            employee_name: employee_name(records, directory, bucket.key),
            counts: bucket.tally,
        })
        .collect();

    let total = records.len();
    let late = by_status.count(AttendanceStatus::Late);
    let absent = by_status.count(AttendanceStatus::Absent);

    AttendanceSummary {
        total_records: total,
        total_employees: by_employee.len(),
        present: by_status.count(AttendanceStatus::Present),
        late,
        absent,
        late_rate: rates::count_percentage(late, total, precision),
        absence_rate: rates::count_percentage(absent, total, precision),
        total_work_hours: total_duration(records.iter().map(|r| r.work_hours)),
        total_overtime_hours: total_duration(records.iter().map(|r| r.overtime_hours)),
        by_employee,
        detailed_metrics: None,
    }
}

/// Breakdowns for the attendance report.
pub fn detail(
    records: &[AttendanceRecord],
    schedules: &[WorkSchedule],
    monthly_summaries: Vec<MonthlyAttendanceSummary>,
    summary: &AttendanceSummary,
    directory: &Directory,
    settings: &ReportConfig,
) -> AttendanceDetail {
    let by_shift = aggregate::by_dimension(records, |r| r.work_shift_id)
        .into_iter()
        .map(|group| {
            let tally = aggregate::by_status(&group.records, |r| r.status);
            let shift_name = match &group.key {
                DimensionKey::Value(id) => directory.shift_name(*id),
                DimensionKey::Unassigned => aggregate::UNASSIGNED.to_string(),
            };
            ShiftAttendance {
                shift_id: group.key,
                shift_name,
                total: tally.total(),
                present: tally.count(AttendanceStatus::Present),
                late: tally.count(AttendanceStatus::Late),
                absent: tally.count(AttendanceStatus::Absent),
            }
        })
        .collect();

    let late_counts = summary
        .by_employee
        .iter()
        .filter(|e| e.counts.count(AttendanceStatus::Late) > 0)
        .map(|e| (e.employee_id, e.counts.count(AttendanceStatus::Late) as f64));
    let top_late = ranking::top_n(late_counts, settings.top_n, |id| employee_name(records, directory, *id));

    let perfect_attendance_count = summary
        .by_employee
        .iter()
        .filter(|e| e.counts.count(AttendanceStatus::Late) == 0 && e.counts.count(AttendanceStatus::Absent) == 0)
        .count();

    AttendanceDetail {
        by_status: aggregate::by_status(records, |r| r.status),
        by_shift,
        by_schedule_status: aggregate::by_status(schedules, |s| s.status),
        top_late,
        perfect_attendance_count,
        monthly_summaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(employee_id: EmployeeId, name: &str, day: u32, status: AttendanceStatus, shift: Option<i32>) -> AttendanceRecord {
        AttendanceRecord {
            employee_id,
            employee_name: name.to_string(),
            employee_code: format!("NV{employee_id:03}"),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            status,
            work_hours: TimeDelta::minutes(450),
            overtime_hours: TimeDelta::zero(),
            work_shift_id: shift,
        }
    }

    #[test]
    fn test_summary_counts_and_rates() {
        let records = vec![
            record(1, "An", 3, AttendanceStatus::Present, Some(1)),
            record(1, "An", 4, AttendanceStatus::Late, Some(1)),
            record(2, "Binh", 3, AttendanceStatus::Present, None),
            record(2, "Binh", 4, AttendanceStatus::Absent, None),
        ];

        let summary = summarize(&records, &Directory::default(), Precision::OneDecimal);
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.total_employees, 2);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.late_rate, 25.0);
        assert_eq!(summary.absence_rate, 25.0);
        assert_eq!(summary.total_work_hours, 30.0);
        assert_eq!(summary.by_employee[0].employee_name, "An");
        assert_eq!(summary.by_employee[0].counts.total(), 2);
    }

    #[test]
    fn test_huge_work_hours_saturate() {
        let records: Vec<AttendanceRecord> = serde_json::from_str(
            r#"[
                {"employeeId": 1, "date": "2025-03-03", "status": "PRESENT", "workHours": "PT2000000000000H"},
                {"employeeId": 1, "date": "2025-03-04", "status": "PRESENT", "workHours": "PT2000000000000H"}
            ]"#,
        )
        .unwrap();

        let summary = summarize(&records, &Directory::default(), Precision::OneDecimal);
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.total_work_hours, rates::round_to(as_hours(TimeDelta::MAX), 1));
        assert_eq!(summary.total_overtime_hours, 0.0);
    }

    #[test]
    fn test_empty_records_yield_zero_metrics() {
        let summary = summarize(&[], &Directory::default(), Precision::Integer);
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.late_rate, 0.0);
        assert!(summary.by_employee.is_empty());
    }

    #[test]
    fn test_detail_breakdowns() {
        let records = vec![
            record(1, "An", 3, AttendanceStatus::Late, Some(1)),
            record(1, "An", 4, AttendanceStatus::Late, Some(1)),
            record(2, "Binh", 3, AttendanceStatus::Late, None),
            record(3, "Chi", 3, AttendanceStatus::Present, Some(1)),
        ];
        let summary = summarize(&records, &Directory::default(), Precision::OneDecimal);
        let detail = detail(&records, &[], Vec::new(), &summary, &Directory::default(), &ReportConfig::default());

        assert_eq!(detail.by_shift.len(), 2);
        assert_eq!(detail.by_shift[0].shift_name, "1");
        assert_eq!(detail.by_shift[0].late, 2);
        assert_eq!(detail.by_shift[1].shift_id, DimensionKey::Unassigned);
        assert_eq!(detail.by_shift[1].shift_name, "unassigned");

        let late: Vec<(EmployeeId, f64)> = detail.top_late.iter().map(|e| (e.key, e.value)).collect();
        assert_eq!(late, vec![(1, 2.0), (2, 1.0)]);
        assert_eq!(detail.top_late[1].display_name, "Binh");

        assert_eq!(detail.perfect_attendance_count, 1);
        assert!(detail.by_schedule_status.is_empty());
    }
}
