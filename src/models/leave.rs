//! Leave requests, leave types and balances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// Lifecycle state of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Withdrawn,
}

/// A leave request covering `start_date..=end_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: String,
    pub leave_type_id: i32,
    pub status: LeaveStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Fractional for half-days.
    pub total_days: f64,
}

/// Leave type definition from the leave service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveType {
    pub id: i32,
    pub name: String,
}

/// Remaining entitlement of one leave type for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub employee_id: EmployeeId,
    pub leave_type_id: i32,
    pub year: i32,
    pub entitled_days: f64,
    pub used_days: f64,
    pub remaining_days: f64,
}
