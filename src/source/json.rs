//! Data source over a directory of JSON exports.
//!
//! Expected files (all optional, a missing file reads as an empty list):
//! `attendance.json`, `attendance_monthly.json`, `leave_requests.json`,
//! `leave_balances.json`, `leave_types.json`, `payroll.json`,
//! `allowances.json`, `schedules.json`, `work_shifts.json`,
//! `employees.json`, `departments.json`.
//!
//! Each file is loaded independently the first time a call needs it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::memory::{self, PayrollPeriod};
use super::{
    AttendanceSource, DirectorySource, LeaveSource, Page, PayrollSource, RangeQuery, ScheduleSource, SourceResult,
};
use crate::error::SourceError;
use crate::models::{
    AllowanceDefinition, AttendanceRecord, Department, Employee, EmployeeId, LeaveBalance, LeaveRequest, LeaveType,
    MonthlyAttendanceSummary, PayrollLine, PayrollPreview, WorkSchedule, WorkShift,
};

/// One export file, read on first use and kept for later calls.
///
/// A file that fails to read or decode is retried on the next call.
struct CachedFile<T> {
    file: &'static str,
    cell: OnceCell<Vec<T>>,
}

impl<T: DeserializeOwned> CachedFile<T> {
    fn new(file: &'static str) -> Self {
        Self {
            file,
            cell: OnceCell::new(),
        }
    }

    async fn get(&self, dir: &Path) -> SourceResult<&[T]> {
        let items = self.cell.get_or_try_init(|| read_list(dir, self.file)).await?;
        Ok(items.as_slice())
    }
}

/// Answers each call from the files it needs, so a broken file only fails
/// the calls that read it.
pub struct JsonDirSource {
    dir: PathBuf,
    attendance: CachedFile<AttendanceRecord>,
    monthly_summaries: CachedFile<MonthlyAttendanceSummary>,
    leave_requests: CachedFile<LeaveRequest>,
    leave_balances: CachedFile<LeaveBalance>,
    leave_types: CachedFile<LeaveType>,
    payroll: CachedFile<PayrollPeriod>,
    allowances: CachedFile<AllowanceDefinition>,
    schedules: CachedFile<WorkSchedule>,
    work_shifts: CachedFile<WorkShift>,
    employees: CachedFile<Employee>,
    departments: CachedFile<Department>,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            attendance: CachedFile::new("attendance.json"),
            monthly_summaries: CachedFile::new("attendance_monthly.json"),
            leave_requests: CachedFile::new("leave_requests.json"),
            leave_balances: CachedFile::new("leave_balances.json"),
            leave_types: CachedFile::new("leave_types.json"),
            payroll: CachedFile::new("payroll.json"),
            allowances: CachedFile::new("allowances.json"),
            schedules: CachedFile::new("schedules.json"),
            work_shifts: CachedFile::new("work_shifts.json"),
            employees: CachedFile::new("employees.json"),
            departments: CachedFile::new("departments.json"),
        }
    }

    /// Employee list needed to apply a department filter; not read otherwise.
    async fn scope(&self, department_id: Option<i32>) -> SourceResult<&[Employee]> {
        match department_id {
            Some(_) => self.employees.get(&self.dir).await,
            None => Ok(&[]),
        }
    }
}

async fn read_list<T: DeserializeOwned>(dir: &Path, file: &str) -> SourceResult<Vec<T>> {
    let path = dir.join(file);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not present, treating as empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(SourceError::transport(format!("{}: {e}", path.display()))),
    };

    let items: Vec<T> = serde_json::from_str(&content).map_err(|e| SourceError::decode(format!("{file}: {e}")))?;
    info!("Loaded {} records from {}", items.len(), path.display());
    Ok(items)
}

#[async_trait]
impl AttendanceSource for JsonDirSource {
    async fn attendance_page(&self, query: &RangeQuery, page: u32, size: u32) -> SourceResult<Page<AttendanceRecord>> {
        let records = self.attendance.get(&self.dir).await?;
        let employees = self.scope(query.department_id).await?;
        Ok(Page::slice(memory::attendance_in(records, employees, query), page, size))
    }

    async fn monthly_summary(
        &self,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> SourceResult<MonthlyAttendanceSummary> {
        let summaries = self.monthly_summaries.get(&self.dir).await?;
        memory::monthly_summary(summaries, employee_id, year, month)
    }
}

#[async_trait]
impl LeaveSource for JsonDirSource {
    async fn leave_page(&self, page: u32, size: u32) -> SourceResult<Page<LeaveRequest>> {
        let requests = self.leave_requests.get(&self.dir).await?;
        Ok(Page::slice(requests.to_vec(), page, size))
    }

    async fn leave_balances(&self, employee_id: EmployeeId, year: i32) -> SourceResult<Vec<LeaveBalance>> {
        let balances = self.leave_balances.get(&self.dir).await?;
        Ok(memory::balances_for(balances, employee_id, year))
    }

    async fn leave_types(&self) -> SourceResult<Vec<LeaveType>> {
        Ok(self.leave_types.get(&self.dir).await?.to_vec())
    }
}

#[async_trait]
impl PayrollSource for JsonDirSource {
    async fn payroll_summary(&self, month: u32, year: i32, department_id: Option<i32>) -> SourceResult<Vec<PayrollLine>> {
        let periods = self.payroll.get(&self.dir).await?;
        let employees = self.scope(department_id).await?;
        Ok(memory::payroll_lines(periods, employees, month, year, department_id))
    }

    async fn payroll_previews(
        &self,
        month: u32,
        year: i32,
        department_id: Option<i32>,
    ) -> SourceResult<Vec<PayrollPreview>> {
        let periods = self.payroll.get(&self.dir).await?;
        let employees = self.scope(department_id).await?;
        Ok(memory::payroll_previews(periods, employees, month, year, department_id))
    }

    async fn allowance_definitions(&self) -> SourceResult<Vec<AllowanceDefinition>> {
        Ok(self.allowances.get(&self.dir).await?.to_vec())
    }
}

#[async_trait]
impl ScheduleSource for JsonDirSource {
    async fn schedule_page(&self, query: &RangeQuery, page: u32, size: u32) -> SourceResult<Page<WorkSchedule>> {
        let schedules = self.schedules.get(&self.dir).await?;
        Ok(Page::slice(memory::schedules_in(schedules, query), page, size))
    }

    async fn work_shifts(&self) -> SourceResult<Vec<WorkShift>> {
        Ok(self.work_shifts.get(&self.dir).await?.to_vec())
    }
}

#[async_trait]
impl DirectorySource for JsonDirSource {
    async fn employees(&self, department_id: Option<i32>) -> SourceResult<Vec<Employee>> {
        let employees = self.employees.get(&self.dir).await?;
        Ok(memory::employees_in(employees, department_id))
    }

    async fn departments(&self) -> SourceResult<Vec<Department>> {
        Ok(self.departments.get(&self.dir).await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ReportConfig;
    use crate::report::{ReportFilters, ReportType, build_report};
    use crate::source::DataSources;
    use chrono::NaiveDate;

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_reads_and_filters_attendance() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "attendance.json",
            r#"[
                {"employeeId": 1, "date": "2025-03-03", "status": "PRESENT", "workHours": "PT8H"},
                {"employeeId": 2, "date": "2025-03-20", "status": "LATE"}
            ]"#,
        );

        let source = JsonDirSource::new(dir.path());
        let query = RangeQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
            department_id: None,
        };

        let page = source.attendance_page(&query, 0, 100).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].employee_id, 1);
    }

    #[tokio::test]
    async fn test_missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDirSource::new(dir.path());

        assert!(source.leave_types().await.unwrap().is_empty());
        assert!(source.payroll_summary(3, 2025, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "leave_requests.json", "{not json");

        let source = JsonDirSource::new(dir.path());
        let err = source.leave_page(0, 10).await.unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[tokio::test]
    async fn test_malformed_employee_file_only_fails_directory_calls() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "schedules.json",
            r#"[{"employeeId": 1, "scheduleDate": "2025-03-04", "status": "COMPLETED"}]"#,
        );
        write(dir.path(), "employees.json", "{oops");

        let source = JsonDirSource::new(dir.path());
        let query = RangeQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            department_id: None,
        };

        let page = source.schedule_page(&query, 0, 10).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(matches!(source.employees(None).await, Err(SourceError::Decode(_))));

        let scoped = RangeQuery {
            department_id: Some(1),
            ..query
        };
        assert!(matches!(
            source.attendance_page(&scoped, 0, 10).await,
            Err(SourceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_schedule_report_builds_with_broken_directory_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "schedules.json",
            r#"[
                {"employeeId": 1, "scheduleDate": "2025-03-04", "status": "COMPLETED"},
                {"employeeId": 2, "scheduleDate": "2025-03-05", "status": "ABSENT"}
            ]"#,
        );
        write(dir.path(), "employees.json", "{oops");

        let sources = DataSources::from_single(Arc::new(JsonDirSource::new(dir.path())));
        let filters = ReportFilters {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            department_id: None,
        };

        let context = build_report(&sources, &ReportConfig::default(), ReportType::Schedule, &filters)
            .await
            .unwrap();
        let summary = context.schedule.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed, 1);
    }
}
