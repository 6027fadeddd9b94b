//! Leave summary: window overlap, status and type breakdowns, balances.

use serde::Serialize;

use crate::aggregate::{self, WeightedTally};
use crate::config::{LeaveDaysPolicy, ReportConfig};
use crate::directory::Directory;
use crate::models::{EmployeeId, LeaveBalance, LeaveRequest, LeaveStatus};
use crate::ranking::{self, RankedEntry};
use crate::rates::{self, Precision};
use crate::time_range::TimeWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveStatusBreakdown {
    pub status: LeaveStatus,
    pub count: usize,
    pub total_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTypeBreakdown {
    pub leave_type_id: i32,
    pub leave_type_name: String,
    pub count: usize,
    pub total_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLeaveBalance {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub balances: Vec<LeaveBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveSummary {
    pub total_requests: usize,
    pub total_days: f64,
    pub pending: usize,
    pub approved: usize,
    pub by_status: Vec<LeaveStatusBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_metrics: Option<LeaveDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDetail {
    pub by_type: Vec<LeaveTypeBreakdown>,
    pub top_requesters: Vec<RankedEntry<EmployeeId>>,
    /// Approved share of decided (approved or rejected) requests.
    pub approval_rate: f64,
    pub balances: Vec<EmployeeLeaveBalance>,
}

/// Requests whose date range intersects the window.
pub fn overlapping(requests: Vec<LeaveRequest>, window: &TimeWindow) -> Vec<LeaveRequest> {
    requests
        .into_iter()
        .filter(|r| window.overlaps(r.start_date, r.end_date))
        .collect()
}

/// Days a request contributes to this window.
pub fn counted_days(request: &LeaveRequest, window: &TimeWindow, policy: LeaveDaysPolicy) -> f64 {
    match policy {
        LeaveDaysPolicy::Full => request.total_days,
        LeaveDaysPolicy::Clipped => {
            let inside = window.overlap_days(request.start_date, request.end_date) as f64;
            request.total_days.min(inside)
        }
    }
}

fn employee_name(requests: &[LeaveRequest], directory: &Directory, id: EmployeeId) -> String {
    let name = ranking::first_match_name(requests, &id, |r| r.employee_id, |r| r.employee_name.as_str());
    if name.is_empty() { directory.employee_name(id) } else { name }
}

fn status_breakdown(tally: &WeightedTally<LeaveStatus>) -> Vec<LeaveStatusBreakdown> {
    tally
        .entries
        .iter()
        .map(|entry| LeaveStatusBreakdown {
            status: entry.key,
            count: entry.count,
            total_days: rates::round_to(entry.amount, 1),
        })
        .collect()
}

/// Status summary over requests already narrowed to the window.
pub fn summarize(requests: &[LeaveRequest], window: &TimeWindow, policy: LeaveDaysPolicy) -> LeaveSummary {
    let tally = aggregate::by_key_weighted(requests, |r| r.status, |r| counted_days(r, window, policy));
    let count_of = |status: LeaveStatus| tally.get(&status).map_or(0, |entry| entry.count);

    LeaveSummary {
        total_requests: tally.total,
        total_days: rates::round_to(tally.total_amount, 1),
        pending: count_of(LeaveStatus::Pending),
        approved: count_of(LeaveStatus::Approved),
        by_status: status_breakdown(&tally),
        detailed_metrics: None,
    }
}

pub fn detail(
    requests: &[LeaveRequest],
    window: &TimeWindow,
    balances: Vec<(EmployeeId, Vec<LeaveBalance>)>,
    directory: &Directory,
    settings: &ReportConfig,
) -> LeaveDetail {
    let policy = settings.leave_days_policy;

    let by_type = aggregate::by_key_weighted(requests, |r| r.leave_type_id, |r| counted_days(r, window, policy))
        .entries
        .into_iter()
        .map(|entry| LeaveTypeBreakdown {
            leave_type_id: entry.key,
            leave_type_name: directory.leave_type_name(entry.key),
            count: entry.count,
            total_days: rates::round_to(entry.amount, 1),
        })
        .collect();

    let days_per_employee = aggregate::by_employee_weighted(
        requests,
        |r| r.employee_id,
        |r| r.status,
        |r| counted_days(r, window, policy),
    )
    .into_iter()
    .map(|bucket| (bucket.key, bucket.tally.total_amount));
    let top_requesters = ranking::top_n(days_per_employee, settings.top_n, |id| {
        employee_name(requests, directory, *id)
    });

    let status = aggregate::by_status(requests, |r| r.status);
    let approved = status.count(LeaveStatus::Approved);
    let decided = approved + status.count(LeaveStatus::Rejected);

    let balances = balances
        .into_iter()
        .map(|(employee_id, balances)| EmployeeLeaveBalance {
            employee_id,
            employee_name: employee_name(requests, directory, employee_id),
            balances,
        })
        .collect();

    LeaveDetail {
        by_type,
        top_requesters,
        approval_rate: rates::count_percentage(approved, decided, Precision::OneDecimal),
        balances,
    }
}
