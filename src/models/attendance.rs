//! Attendance records and per-employee monthly summaries.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use super::EmployeeId;
use super::duration::iso8601;

/// Daily attendance status reported by the attendance service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    HalfDay,
    EarlyDeparture,
    Overtime,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 6] = [
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
        AttendanceStatus::HalfDay,
        AttendanceStatus::EarlyDeparture,
        AttendanceStatus::Overtime,
    ];
}

/// One attendance day for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub employee_code: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, with = "iso8601")]
    pub work_hours: TimeDelta,
    #[serde(default, with = "iso8601")]
    pub overtime_hours: TimeDelta,
    #[serde(default)]
    pub work_shift_id: Option<i32>,
}

/// Monthly attendance summary for one employee (secondary lookup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAttendanceSummary {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: String,
    pub year: i32,
    pub month: u32,
    pub present_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
    #[serde(default, with = "iso8601")]
    pub total_work_hours: TimeDelta,
    #[serde(default, with = "iso8601")]
    pub total_overtime_hours: TimeDelta,
}
