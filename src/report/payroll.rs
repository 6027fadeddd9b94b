//! Payroll totals, earners leaderboard and allowance usage.

use serde::Serialize;

use crate::aggregate::{self, StatusTally, WeightedTally};
use crate::config::ReportConfig;
use crate::directory::Directory;
use crate::fetch::PayrollData;
use crate::models::{EmployeeId, PayrollLine, PayrollStatus};
use crate::ranking::{self, RankedEntry};
use crate::rates::{self, Precision};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    pub month: u32,
    pub year: i32,
    pub employee_count: usize,
    pub total_base_salary: f64,
    pub total_overtime_pay: f64,
    pub total_allowances: f64,
    pub total_deductions: f64,
    pub total_net_pay: f64,
    pub average_net_pay: f64,
    pub by_status: StatusTally<PayrollStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_metrics: Option<PayrollDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceUsage {
    pub allowance_id: i32,
    pub name: String,
    /// Previews whose breakdown names this allowance.
    pub usage_count: usize,
    pub usage_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollDetail {
    pub top_earners: Vec<RankedEntry<EmployeeId>>,
    pub allowance_usage: Vec<AllowanceUsage>,
}

fn money(lines: &[PayrollLine], field: impl Fn(&PayrollLine) -> f64) -> f64 {
    rates::round_to(lines.iter().map(field).sum(), 2)
}

/// Net pay summed per employee, in first-seen order.
///
/// An employee may have several lines in one month (corrections, split runs).
fn net_pay_by_employee(lines: &[PayrollLine]) -> WeightedTally<EmployeeId> {
    aggregate::by_key_weighted(lines, |l| l.employee_id, |l| l.net_pay)
}

pub fn summarize(lines: &[PayrollLine], month: u32, year: i32) -> PayrollSummary {
    let net_pay = net_pay_by_employee(lines);
    let total_net_pay = net_pay.total_amount;
    let employee_count = net_pay.entries.len();

    PayrollSummary {
        month,
        year,
        employee_count,
        total_base_salary: money(lines, |l| l.base_salary),
        total_overtime_pay: money(lines, |l| l.overtime_pay),
        total_allowances: money(lines, |l| l.allowances),
        total_deductions: money(lines, |l| l.deductions),
        total_net_pay: rates::round_to(total_net_pay, 2),
        average_net_pay: rates::round_to(rates::average_per_entity(total_net_pay, employee_count), 2),
        by_status: aggregate::by_status(lines, |l| l.status),
        detailed_metrics: None,
    }
}

pub fn detail(payroll: &PayrollData, directory: &Directory, settings: &ReportConfig) -> PayrollDetail {
    let lines = &payroll.lines;
    let earners = net_pay_by_employee(lines).entries.into_iter().map(|b| (b.key, b.amount));
    let top_earners = ranking::top_n(earners, settings.top_n, |id| {
        let name = ranking::first_match_name(lines, id, |l| l.employee_id, |l| l.employee_name.as_str());
        if name.is_empty() { directory.employee_name(*id) } else { name }
    });

    let previews = payroll.previews.len();
    let allowance_usage = payroll
        .allowances
        .iter()
        .map(|allowance| {
            let usage_count = payroll
                .previews
                .iter()
                .filter(|p| p.references(&allowance.name))
                .count();
            AllowanceUsage {
                allowance_id: allowance.id,
                name: allowance.name.clone(),
                usage_count,
                usage_rate: rates::count_percentage(usage_count, previews, Precision::OneDecimal),
            }
        })
        .collect();

    PayrollDetail {
        top_earners,
        allowance_usage,
    }
}
