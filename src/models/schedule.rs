//! Work schedules and shift definitions.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::EmployeeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Scheduled,
    Completed,
    Absent,
    Cancelled,
}

/// One planned shift for one employee on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSchedule {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub department_id: Option<i32>,
    #[serde(default)]
    pub work_shift_id: Option<i32>,
    pub schedule_date: NaiveDate,
    pub status: ScheduleStatus,
}

/// Shift definition from the scheduling service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkShift {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
}
