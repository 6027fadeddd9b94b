//! Cross-domain headline totals for the overview report.

use serde::Serialize;

use super::attendance::AttendanceSummary;
use super::leave::LeaveSummary;
use super::schedule::ScheduleSummary;
use crate::rates::{self, Precision};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewTotals {
    /// Employees with at least one attendance record in the window.
    pub employees: usize,
    pub attendance_records: usize,
    /// Records not marked absent, as a share of all records.
    pub attendance_rate: f64,
    pub leave_requests: usize,
    pub pending_leave_requests: usize,
    pub leave_days: f64,
    pub schedules: usize,
    pub compliance_rate: f64,
}

pub fn totals(
    attendance: &AttendanceSummary,
    leave: &LeaveSummary,
    schedule: &ScheduleSummary,
    precision: Precision,
) -> OverviewTotals {
    let attended = attendance.total_records - attendance.absent;

    OverviewTotals {
        employees: attendance.total_employees,
        attendance_records: attendance.total_records,
        attendance_rate: rates::count_percentage(attended, attendance.total_records, precision),
        leave_requests: leave.total_requests,
        pending_leave_requests: leave.pending,
        leave_days: leave.total_days,
        schedules: schedule.total,
        compliance_rate: schedule.compliance_rate,
    }
}
