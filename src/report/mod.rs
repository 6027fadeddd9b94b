//! Report assembly.
//!
//! A build runs in fixed order: resolve the window, fetch primaries (with the
//! directory alongside), fetch bounded secondaries, then aggregate, rank and
//! assemble. Everything after the fetches is synchronous and pure.

pub mod attendance;
pub mod leave;
pub mod overview;
pub mod payroll;
pub mod schedule;


use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::directory::Directory;
use crate::error::{AppError, Result};
use crate::fetch::{self, PrimaryData, PrimaryNeeds};
use crate::models::{EmployeeId, LeaveBalance, MonthlyAttendanceSummary};
use crate::rates::Precision;
use crate::source::{DataSources, RangeQuery};
use crate::time_range::{self, TimeWindow};

use attendance::AttendanceSummary;
use leave::LeaveSummary;
use overview::OverviewTotals;
use payroll::PayrollSummary;
use schedule::ScheduleSummary;

/// Report variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Overview,
    Attendance,
    Payroll,
    Leave,
    Schedule,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Overview,
        ReportType::Attendance,
        ReportType::Payroll,
        ReportType::Leave,
        ReportType::Schedule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Overview => "overview",
            ReportType::Attendance => "attendance",
            ReportType::Payroll => "payroll",
            ReportType::Leave => "leave",
            ReportType::Schedule => "schedule",
        }
    }

    /// Primary datasets this variant reads.
    pub fn needs(&self) -> PrimaryNeeds {
        match self {
            ReportType::Overview => PrimaryNeeds {
                attendance: true,
                leave: true,
                schedule: true,
                ..Default::default()
            },
            ReportType::Attendance => PrimaryNeeds {
                attendance: true,
                schedule: true,
                ..Default::default()
            },
            ReportType::Payroll => PrimaryNeeds {
                payroll: true,
                payroll_breakdown: true,
                ..Default::default()
            },
            ReportType::Leave => PrimaryNeeds {
                leave: true,
                ..Default::default()
            },
            ReportType::Schedule => PrimaryNeeds {
                schedule: true,
                ..Default::default()
            },
        }
    }

    /// Overview rates feed progress bars and are whole numbers.
    pub fn precision(&self) -> Precision {
        match self {
            ReportType::Overview => Precision::Integer,
            _ => Precision::OneDecimal,
        }
    }
}

impl FromStr for ReportType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| AppError::validation(format!("Unknown report type '{}'", s.trim())))
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied report filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i32>,
}

impl ReportFilters {
    pub fn new(window: &TimeWindow, department_id: Option<i32>) -> Self {
        Self {
            start_date: window.start_date,
            end_date: window.end_date,
            department_id,
        }
    }

    /// Validated window; fails with [`AppError::InvalidRange`] when reversed.
    pub fn window(&self) -> Result<TimeWindow> {
        time_range::resolve_custom(self.start_date, self.end_date)
    }
}

/// Filters echoed into the output, with display labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFilters {
    #[serde(flatten)]
    pub filters: ReportFilters,
    pub range_label: String,
    pub week_label: String,
}

impl ResolvedFilters {
    fn new(window: &TimeWindow, department_id: Option<i32>) -> Self {
        Self {
            filters: ReportFilters::new(window, department_id),
            range_label: time_range::format_range_label(window),
            week_label: time_range::week_label(window),
        }
    }
}

/// A finished report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    pub report_type: ReportType,
    /// When the report was built, not the business date it covers.
    pub generated_at: DateTime<Utc>,
    pub filters: ResolvedFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<OverviewTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<AttendanceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave: Option<LeaveSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payroll: Option<PayrollSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSummary>,
}

impl ReportContext {
    /// Short headline lines for text generation.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} report, {}",
            capitalize(self.report_type.as_str()),
            self.filters.range_label
        )];

        if let Some(totals) = &self.totals {
            lines.push(format!(
                "{} employees on record, attendance rate {}%",
                totals.employees, totals.attendance_rate
            ));
        }
        if let Some(a) = &self.attendance {
            lines.push(format!(
                "Attendance: {} records across {} employees, late rate {}%, absence rate {}%",
                a.total_records, a.total_employees, a.late_rate, a.absence_rate
            ));
        }
        if let Some(l) = &self.leave {
            lines.push(format!(
                "Leave: {} requests ({} pending), {} days",
                l.total_requests, l.pending, l.total_days
            ));
        }
        if let Some(p) = &self.payroll {
            lines.push(format!(
                "Payroll {}/{}: {} employees, net pay {:.2}, average {:.2}",
                p.month, p.year, p.employee_count, p.total_net_pay, p.average_net_pay
            ));
        }
        if let Some(s) = &self.schedule {
            lines.push(format!(
                "Schedules: {} total, {} completed, compliance {}%",
                s.total, s.completed, s.compliance_rate
            ));
        }

        lines
    }

    /// Serialize the report as JSON, optionally pretty-printed.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Per-employee drill-down data; entries whose lookup failed are absent.
#[derive(Debug, Clone, Default)]
pub struct SecondaryData {
    pub monthly_summaries: Vec<MonthlyAttendanceSummary>,
    pub leave_balances: Vec<(EmployeeId, Vec<LeaveBalance>)>,
}

/// Build a report from the sources.
pub async fn build_report(
    sources: &DataSources,
    settings: &ReportConfig,
    report_type: ReportType,
    filters: &ReportFilters,
) -> Result<ReportContext> {
    build_report_with_progress(sources, settings, report_type, filters, |_, _| {}).await
}

/// [`build_report`] with a progress callback (fraction done, message).
pub async fn build_report_with_progress<F>(
    sources: &DataSources,
    settings: &ReportConfig,
    report_type: ReportType,
    filters: &ReportFilters,
    mut on_progress: F,
) -> Result<ReportContext>
where
    F: FnMut(f32, &str),
{
    let window = filters.window()?;
    let query = RangeQuery::new(&window, filters.department_id);

    info!(
        "Building {report_type} report for {}",
        time_range::format_range_label(&window)
    );
    on_progress(0.0, "Loading report data...");

    let (primary, directory) = tokio::join!(
        fetch::fetch_primary(sources, &query, report_type.needs(), settings.page_size),
        fetch::fetch_directory(sources),
    );
    let mut primary = primary?;

    primary.leave = leave::overlapping(primary.leave, &window);
    on_progress(0.5, "Loading employee details...");

    let secondary = fetch_secondary(sources, settings, report_type, &window, &primary).await;
    on_progress(0.8, "Aggregating...");

    let context = assemble(
        report_type,
        &window,
        filters.department_id,
        primary,
        secondary,
        &directory,
        settings,
        Utc::now(),
    );

    info!("{report_type} report ready");
    on_progress(1.0, "Done");
    Ok(context)
}

async fn fetch_secondary(
    sources: &DataSources,
    settings: &ReportConfig,
    report_type: ReportType,
    window: &TimeWindow,
    primary: &PrimaryData,
) -> SecondaryData {
    let start = window.start_date;

    match report_type {
        ReportType::Attendance => {
            let ids = fetch::distinct_ids(primary.attendance.iter().map(|r| r.employee_id));
            let settled = fetch::fetch_monthly_summaries(
                sources,
                &ids,
                start.year(),
                start.month(),
                settings.attendance_summary_fan_out,
            )
            .await;
            debug!(
                "Monthly summaries: {} of {} employees loaded",
                settled.successes(),
                ids.len()
            );
            SecondaryData {
                monthly_summaries: settled.into_successes(),
                ..Default::default()
            }
        }
        ReportType::Leave => {
            let ids = fetch::distinct_ids(primary.leave.iter().map(|r| r.employee_id));
            let settled =
                fetch::fetch_leave_balances(sources, &ids, start.year(), settings.leave_balance_fan_out).await;
            debug!("Leave balances: {} of {} employees loaded", settled.successes(), ids.len());
            SecondaryData {
                leave_balances: settled.into_successes(),
                ..Default::default()
            }
        }
        _ => SecondaryData::default(),
    }
}

/// Assemble a report from already-fetched data.
///
/// `primary.leave` is expected to be narrowed to the window and department.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    report_type: ReportType,
    window: &TimeWindow,
    department_id: Option<i32>,
    primary: PrimaryData,
    secondary: SecondaryData,
    directory: &Directory,
    settings: &ReportConfig,
    generated_at: DateTime<Utc>,
) -> ReportContext {
    let precision = report_type.precision();
    let mut context = ReportContext {
        report_type,
        generated_at,
        filters: ResolvedFilters::new(window, department_id),
        totals: None,
        attendance: None,
        leave: None,
        payroll: None,
        schedule: None,
    };

    match report_type {
        ReportType::Overview => {
            let attendance = attendance::summarize(&primary.attendance, directory, precision);
            let leave = leave::summarize(&primary.leave, window, settings.leave_days_policy);
            let schedule = schedule::summarize(&primary.schedules, precision);
            context.totals = Some(overview::totals(&attendance, &leave, &schedule, precision));
            context.attendance = Some(attendance);
            context.leave = Some(leave);
            context.schedule = Some(schedule);
        }
        ReportType::Attendance => {
            let mut summary = attendance::summarize(&primary.attendance, directory, precision);
            summary.detailed_metrics = Some(attendance::detail(
                &primary.attendance,
                &primary.schedules,
                secondary.monthly_summaries,
                &summary,
                directory,
                settings,
            ));
            context.attendance = Some(summary);
        }
        ReportType::Payroll => {
            let start = window.start_date;
            let mut summary = payroll::summarize(&primary.payroll.lines, start.month(), start.year());
            summary.detailed_metrics = Some(payroll::detail(&primary.payroll, directory, settings));
            context.payroll = Some(summary);
        }
        ReportType::Leave => {
            let mut summary = leave::summarize(&primary.leave, window, settings.leave_days_policy);
            summary.detailed_metrics = Some(leave::detail(
                &primary.leave,
                window,
                secondary.leave_balances,
                directory,
                settings,
            ));
            context.leave = Some(summary);
        }
        ReportType::Schedule => {
            let mut summary = schedule::summarize(&primary.schedules, precision);
            summary.detailed_metrics = Some(schedule::detail(&primary.schedules, directory, settings));
            context.schedule = Some(summary);
        }
    }

    context
}
