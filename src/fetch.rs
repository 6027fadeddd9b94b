//! Concurrent loading of report inputs.
//!
//! Primary datasets (attendance, leave, payroll, schedules) are fetched
//! concurrently and must all succeed. Per-employee secondary lookups go
//! through [`settle_bounded`]: at most `max_fan_out` are issued, each failure
//! is logged and dropped, and the batch itself never fails. Nothing is retried.

use std::collections::HashSet;
use std::fmt::Debug;
use std::future::Future;

use chrono::Datelike;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::directory::Directory;
use crate::error::{AppError, Result};
use crate::models::{
    AllowanceDefinition, AttendanceRecord, EmployeeId, LeaveBalance, LeaveRequest, MonthlyAttendanceSummary,
    PayrollLine, PayrollPreview, WorkSchedule,
};
use crate::source::{DataSources, Page, RangeQuery, SourceResult};

pub const ATTENDANCE: &str = "attendance";
pub const LEAVE: &str = "leave";
pub const PAYROLL: &str = "payroll";
pub const SCHEDULE: &str = "schedule";

/// Which primary datasets a report variant reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimaryNeeds {
    pub attendance: bool,
    pub leave: bool,
    pub payroll: bool,
    /// Payroll previews and allowance definitions, on top of payroll lines.
    pub payroll_breakdown: bool,
    pub schedule: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PayrollData {
    pub lines: Vec<PayrollLine>,
    pub previews: Vec<PayrollPreview>,
    pub allowances: Vec<AllowanceDefinition>,
}

/// Datasets that were not requested are left empty.
#[derive(Debug, Clone, Default)]
pub struct PrimaryData {
    pub attendance: Vec<AttendanceRecord>,
    pub leave: Vec<LeaveRequest>,
    pub payroll: PayrollData,
    pub schedules: Vec<WorkSchedule>,
}

/// Outcome of a bounded secondary batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<T> {
    /// Lookups actually issued (never more than the fan-out cap).
    pub attempted: usize,
    /// One slot per attempted lookup; `None` where it failed.
    pub results: Vec<Option<T>>,
}

impl<T> Settled<T> {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    pub fn failures(&self) -> usize {
        self.attempted - self.successes()
    }

    /// Successful results in id order, failures removed.
    pub fn into_successes(self) -> Vec<T> {
        self.results.into_iter().flatten().collect()
    }
}

/// Drain a paginated listing, one page at a time, until the last page.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_page: F) -> SourceResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = SourceResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page = 0;

    loop {
        let batch = fetch_page(page).await?;
        let done = batch.is_last() || batch.items.is_empty();
        items.extend(batch.items);
        if done {
            break;
        }
        page += 1;
    }

    Ok(items)
}

/// Fetch the requested primary datasets concurrently.
///
/// The first failure aborts the build with [`AppError::PrimaryFetch`].
pub async fn fetch_primary(
    sources: &DataSources,
    query: &RangeQuery,
    needs: PrimaryNeeds,
    page_size: u32,
) -> Result<PrimaryData> {
    let attendance = async {
        if needs.attendance {
            fetch_all_pages(move |page| sources.attendance.attendance_page(query, page, page_size))
            .await
            .map_err(|e| AppError::primary(ATTENDANCE, e))
        } else {
            Ok(Vec::new())
        }
    };

    let leave = async {
        if needs.leave {
            fetch_leave(sources, query, page_size)
                .await
                .map_err(|e| AppError::primary(LEAVE, e))
        } else {
            Ok(Vec::new())
        }
    };

    let payroll = async {
        if needs.payroll {
            fetch_payroll(sources, query, needs.payroll_breakdown)
                .await
                .map_err(|e| AppError::primary(PAYROLL, e))
        } else {
            Ok(PayrollData::default())
        }
    };

    let schedules = async {
        if needs.schedule {
            fetch_all_pages(move |page| sources.schedule.schedule_page(query, page, page_size))
            .await
            .map_err(|e| AppError::primary(SCHEDULE, e))
        } else {
            Ok(Vec::new())
        }
    };

    let (attendance, leave, payroll, schedules) = tokio::try_join!(attendance, leave, payroll, schedules)?;

    debug!(
        "Primary data: {} attendance, {} leave, {} payroll, {} schedules",
        attendance.len(),
        leave.len(),
        payroll.lines.len(),
        schedules.len()
    );

    Ok(PrimaryData {
        attendance,
        leave,
        payroll,
        schedules,
    })
}

/// Leave listings are not department-aware. With a department selected, its
/// member list is fetched alongside and is part of the leave data: if it
/// cannot be loaded the leave dataset fails too.
async fn fetch_leave(sources: &DataSources, query: &RangeQuery, page_size: u32) -> SourceResult<Vec<LeaveRequest>> {
    let requests = fetch_all_pages(move |page| sources.leave.leave_page(page, page_size));
    let Some(department) = query.department_id else {
        return requests.await;
    };

    let (requests, members) = tokio::try_join!(requests, sources.directory.employees(Some(department)))?;
    let members: HashSet<EmployeeId> = members.iter().map(|e| e.id).collect();
    Ok(requests
        .into_iter()
        .filter(|r| members.contains(&r.employee_id))
        .collect())
}

/// Payroll month and year come from the window's start date.
async fn fetch_payroll(sources: &DataSources, query: &RangeQuery, with_breakdown: bool) -> SourceResult<PayrollData> {
    let month = query.start_date.month();
    let year = query.start_date.year();
    let department = query.department_id;

    if !with_breakdown {
        let lines = sources.payroll.payroll_summary(month, year, department).await?;
        return Ok(PayrollData {
            lines,
            ..Default::default()
        });
    }

    let (lines, previews, allowances) = tokio::try_join!(
        sources.payroll.payroll_summary(month, year, department),
        sources.payroll.payroll_previews(month, year, department),
        sources.payroll.allowance_definitions(),
    )?;

    Ok(PayrollData {
        lines,
        previews,
        allowances,
    })
}

/// Run `fetch_one` for at most `max_fan_out` ids, concurrently.
///
/// Failed lookups become `None`; the batch itself cannot fail.
pub async fn settle_bounded<I, T, F, Fut>(ids: &[I], max_fan_out: usize, fetch_one: F) -> Settled<T>
where
    I: Debug,
    F: Fn(&I) -> Fut,
    Fut: Future<Output = SourceResult<T>>,
{
    let batch = &ids[..ids.len().min(max_fan_out)];
    if batch.len() < ids.len() {
        debug!("Secondary lookups capped at {} of {}", batch.len(), ids.len());
    }

    let results = join_all(batch.iter().map(|id| {
        let lookup = fetch_one(id);
        async move {
            match lookup.await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Secondary lookup for {id:?} failed: {e}");
                    None
                }
            }
        }
    }))
    .await;

    Settled {
        attempted: batch.len(),
        results,
    }
}

/// A single lookup with the same failure semantics as [`settle_bounded`].
pub async fn settle_one<T>(label: &str, lookup: impl Future<Output = SourceResult<T>>) -> Option<T> {
    match lookup.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{label} lookup failed, continuing without it: {e}");
            None
        }
    }
}

/// Employees, departments, work shifts and leave types, each allowed to fail.
pub async fn fetch_directory(sources: &DataSources) -> Directory {
    let (employees, departments, work_shifts, leave_types) = tokio::join!(
        settle_one("Employee", sources.directory.employees(None)),
        settle_one("Department", sources.directory.departments()),
        settle_one("Work shift", sources.schedule.work_shifts()),
        settle_one("Leave type", sources.leave.leave_types()),
    );

    Directory::new(
        employees,
        departments.unwrap_or_default(),
        work_shifts.unwrap_or_default(),
        leave_types.unwrap_or_default(),
    )
}

/// Monthly attendance summaries for up to `max_fan_out` employees.
pub async fn fetch_monthly_summaries(
    sources: &DataSources,
    employee_ids: &[EmployeeId],
    year: i32,
    month: u32,
    max_fan_out: usize,
) -> Settled<MonthlyAttendanceSummary> {
    settle_bounded(employee_ids, max_fan_out, |id| {
        sources.attendance.monthly_summary(*id, year, month)
    })
    .await
}

/// Leave balances for up to `max_fan_out` employees, paired with their id.
pub async fn fetch_leave_balances(
    sources: &DataSources,
    employee_ids: &[EmployeeId],
    year: i32,
    max_fan_out: usize,
) -> Settled<(EmployeeId, Vec<LeaveBalance>)> {
    settle_bounded(employee_ids, max_fan_out, |id| {
        let id = *id;
        async move { sources.leave.leave_balances(id, year).await.map(|b| (id, b)) }
    })
    .await
}

/// Distinct ids in first-seen order.
pub fn distinct_ids(ids: impl IntoIterator<Item = EmployeeId>) -> Vec<EmployeeId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;
    use crate::error::SourceError;
    use crate::models::{AttendanceStatus, Employee, LeaveStatus};
    use crate::source::memory::{Dataset, MemorySource};

    fn query() -> RangeQuery {
        RangeQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            department_id: None,
        }
    }

    fn attendance(employee_id: EmployeeId, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            employee_id,
            employee_name: String::new(),
            employee_code: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            status: AttendanceStatus::Present,
            work_hours: chrono::TimeDelta::hours(8),
            overtime_hours: chrono::TimeDelta::zero(),
            work_shift_id: None,
        }
    }

    fn all_needs() -> PrimaryNeeds {
        PrimaryNeeds {
            attendance: true,
            leave: true,
            payroll: true,
            payroll_breakdown: true,
            schedule: true,
        }
    }

    #[tokio::test]
    async fn test_settle_bounded_caps_fan_out() {
        let ids: Vec<i32> = (1..=25).collect();
        let calls = AtomicUsize::new(0);

        let settled = settle_bounded(&ids, 20, |id| {
            calls.fetch_add(1, Ordering::SeqCst);
            let id = *id;
            async move { Ok::<_, SourceError>(id * 10) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 20);
        assert_eq!(settled.attempted, 20);
        assert_eq!(settled.successes(), 20);
    }

    #[tokio::test]
    async fn test_settle_bounded_drops_failures() {
        let ids: Vec<i32> = (1..=25).collect();

        let settled = settle_bounded(&ids, 20, |id| {
            let id = *id;
            async move {
                if [3, 7, 19].contains(&id) {
                    Err(SourceError::Timeout)
                } else {
                    Ok(id)
                }
            }
        })
        .await;

        assert_eq!(settled.attempted, 20);
        assert_eq!(settled.failures(), 3);
        assert!(settled.results[2].is_none());

        let values = settled.into_successes();
        assert_eq!(values.len(), 17);
        assert!(!values.contains(&3));
        assert_eq!(values[0], 1);
    }

    #[tokio::test]
    async fn test_settle_bounded_fewer_ids_than_cap() {
        let ids = vec![1, 2];
        let settled = settle_bounded(&ids, 50, |id| {
            let id = *id;
            async move { Ok::<_, SourceError>(id) }
        })
        .await;
        assert_eq!(settled.attempted, 2);
    }

    #[tokio::test]
    async fn test_fetch_all_pages_drains_every_page() {
        let data: Vec<i32> = (0..23).collect();
        let pages_requested = AtomicUsize::new(0);

        let items = fetch_all_pages(|page| {
            pages_requested.fetch_add(1, Ordering::SeqCst);
            let batch = Page::slice(data.clone(), page, 5);
            async move { Ok(batch) }
        })
        .await
        .unwrap();

        assert_eq!(items, data);
        assert_eq!(pages_requested.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_fetch_primary_collects_paged_attendance() {
        let dataset = Dataset {
            attendance: (1..=12).map(|day| attendance(1, day)).collect(),
            leave_requests: vec![LeaveRequest {
                employee_id: 1,
                employee_name: String::new(),
                leave_type_id: 1,
                status: LeaveStatus::Approved,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
                total_days: 2.0,
            }],
            ..Default::default()
        };
        let sources = DataSources::from_single(Arc::new(MemorySource::new(dataset)));

        let data = fetch_primary(&sources, &query(), all_needs(), 5).await.unwrap();
        assert_eq!(data.attendance.len(), 12);
        assert_eq!(data.leave.len(), 1);
        assert!(data.schedules.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_primary_fails_when_any_source_fails() {
        let source = MemorySource::new(Dataset::default()).fail_dataset(SCHEDULE);
        let sources = DataSources::from_single(Arc::new(source));

        let err = fetch_primary(&sources, &query(), all_needs(), 100).await.unwrap_err();
        assert!(matches!(err, AppError::PrimaryFetch { dataset: SCHEDULE, .. }));
        assert_eq!(err.to_string(), "Failed to load schedule data");
    }

    #[tokio::test]
    async fn test_fetch_primary_skips_unneeded_sources() {
        let source = MemorySource::new(Dataset::default()).fail_dataset(PAYROLL);
        let sources = DataSources::from_single(Arc::new(source));
        let needs = PrimaryNeeds {
            attendance: true,
            ..Default::default()
        };

        assert!(fetch_primary(&sources, &query(), needs, 100).await.is_ok());
    }

    fn leave_for(employee_id: EmployeeId) -> LeaveRequest {
        LeaveRequest {
            employee_id,
            employee_name: String::new(),
            leave_type_id: 1,
            status: LeaveStatus::Pending,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            total_days: 1.0,
        }
    }

    fn member(id: EmployeeId, department_id: i32) -> Employee {
        Employee {
            id,
            employee_code: String::new(),
            full_name: String::new(),
            department_id: Some(department_id),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_fetch_leave_scoped_to_department_members() {
        let dataset = Dataset {
            leave_requests: vec![leave_for(1), leave_for(2), leave_for(2)],
            employees: vec![member(1, 10), member(2, 20)],
            ..Default::default()
        };
        let sources = DataSources::from_single(Arc::new(MemorySource::new(dataset)));
        let needs = PrimaryNeeds {
            leave: true,
            ..Default::default()
        };
        let scoped = RangeQuery {
            department_id: Some(20),
            ..query()
        };

        let data = fetch_primary(&sources, &scoped, needs, 100).await.unwrap();
        assert_eq!(data.leave.len(), 2);
        assert!(data.leave.iter().all(|r| r.employee_id == 2));
    }

    #[tokio::test]
    async fn test_fetch_leave_fails_without_department_members() {
        let dataset = Dataset {
            leave_requests: vec![leave_for(1), leave_for(2)],
            employees: vec![member(1, 10), member(2, 20)],
            ..Default::default()
        };
        let source = MemorySource::new(dataset).fail_dataset("directory");
        let sources = DataSources::from_single(Arc::new(source));
        let needs = PrimaryNeeds {
            leave: true,
            ..Default::default()
        };

        let unscoped = fetch_primary(&sources, &query(), needs, 100).await.unwrap();
        assert_eq!(unscoped.leave.len(), 2);

        let scoped = RangeQuery {
            department_id: Some(20),
            ..query()
        };
        let err = fetch_primary(&sources, &scoped, needs, 100).await.unwrap_err();
        assert!(matches!(err, AppError::PrimaryFetch { dataset: LEAVE, .. }));
    }

    #[tokio::test]
    async fn test_fetch_directory_degrades() {
        let source = MemorySource::new(Dataset::default()).fail_dataset("directory");
        let sources = DataSources::from_single(Arc::new(source));

        let directory = fetch_directory(&sources).await;
        assert_eq!(directory.employee_name(1), "");
    }

    #[test]
    fn test_distinct_ids_first_seen() {
        assert_eq!(distinct_ids(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
