//! Schedule compliance and absence tracking.

use serde::Serialize;

use crate::aggregate::{self, DimensionKey, StatusTally};
use crate::config::ReportConfig;
use crate::directory::Directory;
use crate::models::{EmployeeId, ScheduleStatus, WorkSchedule};
use crate::ranking::{self, RankedEntry};
use crate::rates::{self, Precision};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total: usize,
    pub completed: usize,
    pub absent: usize,
    /// Completed share of all schedules.
    pub compliance_rate: f64,
    pub by_status: StatusTally<ScheduleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_metrics: Option<ScheduleDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSchedule {
    pub shift_id: DimensionKey<i32>,
    pub shift_name: String,
    pub total: usize,
    pub completed: usize,
    pub absent: usize,
    pub compliance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSchedule {
    pub department_id: DimensionKey<i32>,
    pub department_name: String,
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDetail {
    pub by_shift: Vec<ShiftSchedule>,
    pub by_department: Vec<DepartmentSchedule>,
    /// Share of schedules not cancelled.
    pub utilization_rate: f64,
    pub chronic_absence: Vec<RankedEntry<EmployeeId>>,
}

pub fn summarize(schedules: &[WorkSchedule], precision: Precision) -> ScheduleSummary {
    let by_status = aggregate::by_status(schedules, |s| s.status);
    let completed = by_status.count(ScheduleStatus::Completed);

    ScheduleSummary {
        total: by_status.total(),
        completed,
        absent: by_status.count(ScheduleStatus::Absent),
        compliance_rate: rates::count_percentage(completed, by_status.total(), precision),
        by_status,
        detailed_metrics: None,
    }
}

fn dimension_name(key: &DimensionKey<i32>, lookup: impl Fn(i32) -> String) -> String {
    match key {
        DimensionKey::Value(id) => lookup(*id),
        DimensionKey::Unassigned => aggregate::UNASSIGNED.to_string(),
    }
}

pub fn detail(schedules: &[WorkSchedule], directory: &Directory, settings: &ReportConfig) -> ScheduleDetail {
    let by_shift = aggregate::by_dimension(schedules, |s| s.work_shift_id)
        .into_iter()
        .map(|group| {
            let tally = aggregate::by_status(&group.records, |s| s.status);
            let completed = tally.count(ScheduleStatus::Completed);
            ShiftSchedule {
                shift_name: dimension_name(&group.key, |id| directory.shift_name(id)),
                shift_id: group.key,
                total: tally.total(),
                completed,
                absent: tally.count(ScheduleStatus::Absent),
                compliance_rate: rates::count_percentage(completed, tally.total(), Precision::OneDecimal),
            }
        })
        .collect();

    let by_department = aggregate::by_dimension(schedules, |s| s.department_id)
        .into_iter()
        .map(|group| {
            let completed = group
                .records
                .iter()
                .filter(|s| s.status == ScheduleStatus::Completed)
                .count();
            DepartmentSchedule {
                department_name: dimension_name(&group.key, |id| directory.department_name(id)),
                department_id: group.key,
                total: group.records.len(),
                completed,
            }
        })
        .collect();

    let cancelled = schedules
        .iter()
        .filter(|s| s.status == ScheduleStatus::Cancelled)
        .count();

    let absences = aggregate::by_employee(schedules, |s| s.employee_id, |s| s.status)
        .into_iter()
        .map(|bucket| (bucket.key, bucket.tally.count(ScheduleStatus::Absent) as f64));
    let chronic_absence = ranking::at_least(absences, settings.chronic_absence_threshold as f64, |id| {
        directory.employee_name(*id)
    });

    ScheduleDetail {
        by_shift,
        by_department,
        utilization_rate: rates::count_percentage(schedules.len() - cancelled, schedules.len(), Precision::OneDecimal),
        chronic_absence,
    }
}
