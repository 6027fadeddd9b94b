//! External data sources consumed by the report engine.
//!
//! Each service (attendance, leave, payroll, scheduling, directory) is a trait
//! returning already-deserialized records. Transport is up to the
//! implementation; [`json::JsonDirSource`] reads JSON exports from disk and
//! [`memory::MemorySource`] serves fixtures held in memory.

pub mod json;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::models::{
    AllowanceDefinition, AttendanceRecord, Department, Employee, EmployeeId, LeaveBalance, LeaveRequest, LeaveType,
    MonthlyAttendanceSummary, PayrollLine, PayrollPreview, WorkSchedule, WorkShift,
};
use crate::time_range::TimeWindow;

pub use json::JsonDirSource;
pub use memory::MemorySource;

/// Result of a source call.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Date range and organizational scope for a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub department_id: Option<i32>,
}

impl RangeQuery {
    pub fn new(window: &TimeWindow, department_id: Option<i32>) -> Self {
        Self {
            start_date: window.start_date,
            end_date: window.end_date,
            department_id,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// One page of a paginated listing. Pages are zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Slice `items` into page `page` of `size` records.
    pub fn slice(items: Vec<T>, page: u32, size: u32) -> Self {
        let size = size.max(1) as usize;
        let total_pages = items.len().div_ceil(size) as u32;
        let items = items.into_iter().skip(page as usize * size).take(size).collect();
        Self {
            items,
            page,
            total_pages,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page + 1 >= self.total_pages
    }
}

#[async_trait]
pub trait AttendanceSource: Send + Sync {
    /// Attendance records in a date range, optionally for one department.
    async fn attendance_page(&self, query: &RangeQuery, page: u32, size: u32) -> SourceResult<Page<AttendanceRecord>>;

    /// Monthly summary for one employee.
    async fn monthly_summary(
        &self,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> SourceResult<MonthlyAttendanceSummary>;
}

#[async_trait]
pub trait LeaveSource: Send + Sync {
    /// All leave requests, unscoped.
    async fn leave_page(&self, page: u32, size: u32) -> SourceResult<Page<LeaveRequest>>;

    /// Balances of every leave type for one employee and year.
    async fn leave_balances(&self, employee_id: EmployeeId, year: i32) -> SourceResult<Vec<LeaveBalance>>;

    async fn leave_types(&self) -> SourceResult<Vec<LeaveType>>;
}

#[async_trait]
pub trait PayrollSource: Send + Sync {
    /// Payroll lines for a month.
    async fn payroll_summary(&self, month: u32, year: i32, department_id: Option<i32>) -> SourceResult<Vec<PayrollLine>>;

    /// Calculated previews with their allowance/deduction breakdowns.
    async fn payroll_previews(
        &self,
        month: u32,
        year: i32,
        department_id: Option<i32>,
    ) -> SourceResult<Vec<PayrollPreview>>;

    async fn allowance_definitions(&self) -> SourceResult<Vec<AllowanceDefinition>>;
}

#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn schedule_page(&self, query: &RangeQuery, page: u32, size: u32) -> SourceResult<Page<WorkSchedule>>;

    async fn work_shifts(&self) -> SourceResult<Vec<WorkShift>>;
}

#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn employees(&self, department_id: Option<i32>) -> SourceResult<Vec<Employee>>;

    async fn departments(&self) -> SourceResult<Vec<Department>>;
}

/// The set of services a report build reads from.
#[derive(Clone)]
pub struct DataSources {
    pub attendance: Arc<dyn AttendanceSource>,
    pub leave: Arc<dyn LeaveSource>,
    pub payroll: Arc<dyn PayrollSource>,
    pub schedule: Arc<dyn ScheduleSource>,
    pub directory: Arc<dyn DirectorySource>,
}

impl DataSources {
    /// Use one implementation for every service.
    pub fn from_single<S>(source: Arc<S>) -> Self
    where
        S: AttendanceSource + LeaveSource + PayrollSource + ScheduleSource + DirectorySource + 'static,
    {
        Self {
            attendance: source.clone(),
            leave: source.clone(),
            payroll: source.clone(),
            schedule: source.clone(),
            directory: source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slice() {
        let items: Vec<i32> = (0..25).collect();

        let first = Page::slice(items.clone(), 0, 10);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert!(!first.is_last());

        let last = Page::slice(items, 2, 10);
        assert_eq!(last.items, vec![20, 21, 22, 23, 24]);
        assert!(last.is_last());
    }

    #[test]
    fn test_page_slice_empty() {
        let page = Page::slice(Vec::<i32>::new(), 0, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(page.is_last());
    }
}
