//! In-memory data source over a fixed [`Dataset`].

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    AttendanceSource, DirectorySource, LeaveSource, Page, PayrollSource, RangeQuery, ScheduleSource, SourceResult,
};
use crate::error::SourceError;
use crate::models::{
    AllowanceDefinition, AttendanceRecord, Department, Employee, EmployeeId, LeaveBalance, LeaveRequest, LeaveType,
    MonthlyAttendanceSummary, PayrollLine, PayrollPreview, WorkSchedule, WorkShift,
};

/// Payroll lines and previews of one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollPeriod {
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub lines: Vec<PayrollLine>,
    #[serde(default)]
    pub previews: Vec<PayrollPreview>,
}

/// Every record the services can serve, with the query semantics applied
/// locally (date range, department scope, pagination).
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub attendance: Vec<AttendanceRecord>,
    pub monthly_summaries: Vec<MonthlyAttendanceSummary>,
    pub leave_requests: Vec<LeaveRequest>,
    pub leave_balances: Vec<LeaveBalance>,
    pub leave_types: Vec<LeaveType>,
    pub payroll: Vec<PayrollPeriod>,
    pub allowances: Vec<AllowanceDefinition>,
    pub schedules: Vec<WorkSchedule>,
    pub work_shifts: Vec<WorkShift>,
    pub employees: Vec<Employee>,
    pub departments: Vec<Department>,
}

impl Dataset {
    pub fn attendance_in(&self, query: &RangeQuery) -> Vec<AttendanceRecord> {
        attendance_in(&self.attendance, &self.employees, query)
    }

    pub fn monthly_summary(
        &self,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> SourceResult<MonthlyAttendanceSummary> {
        monthly_summary(&self.monthly_summaries, employee_id, year, month)
    }

    pub fn balances_for(&self, employee_id: EmployeeId, year: i32) -> Vec<LeaveBalance> {
        balances_for(&self.leave_balances, employee_id, year)
    }

    pub fn payroll_lines(&self, month: u32, year: i32, department_id: Option<i32>) -> Vec<PayrollLine> {
        payroll_lines(&self.payroll, &self.employees, month, year, department_id)
    }

    pub fn payroll_previews(&self, month: u32, year: i32, department_id: Option<i32>) -> Vec<PayrollPreview> {
        payroll_previews(&self.payroll, &self.employees, month, year, department_id)
    }

    pub fn schedules_in(&self, query: &RangeQuery) -> Vec<WorkSchedule> {
        schedules_in(&self.schedules, query)
    }

    pub fn employees_in(&self, department_id: Option<i32>) -> Vec<Employee> {
        employees_in(&self.employees, department_id)
    }
}

// Query semantics over plain slices, shared with the JSON source which keeps
// each file separately.

fn in_department(employees: &[Employee], employee_id: EmployeeId, department_id: Option<i32>) -> bool {
    match department_id {
        None => true,
        Some(dept) => employees
            .iter()
            .any(|e| e.id == employee_id && e.department_id == Some(dept)),
    }
}

pub(crate) fn attendance_in(
    records: &[AttendanceRecord],
    employees: &[Employee],
    query: &RangeQuery,
) -> Vec<AttendanceRecord> {
    let window = query.window();
    records
        .iter()
        .filter(|r| window.contains(r.date) && in_department(employees, r.employee_id, query.department_id))
        .cloned()
        .collect()
}

pub(crate) fn monthly_summary(
    summaries: &[MonthlyAttendanceSummary],
    employee_id: EmployeeId,
    year: i32,
    month: u32,
) -> SourceResult<MonthlyAttendanceSummary> {
    summaries
        .iter()
        .find(|s| s.employee_id == employee_id && s.year == year && s.month == month)
        .cloned()
        .ok_or_else(|| SourceError::NotFound(format!("monthly summary {employee_id} {year}-{month:02}")))
}

pub(crate) fn balances_for(balances: &[LeaveBalance], employee_id: EmployeeId, year: i32) -> Vec<LeaveBalance> {
    balances
        .iter()
        .filter(|b| b.employee_id == employee_id && b.year == year)
        .cloned()
        .collect()
}

fn period(periods: &[PayrollPeriod], month: u32, year: i32) -> Option<&PayrollPeriod> {
    periods.iter().find(|p| p.month == month && p.year == year)
}

pub(crate) fn payroll_lines(
    periods: &[PayrollPeriod],
    employees: &[Employee],
    month: u32,
    year: i32,
    department_id: Option<i32>,
) -> Vec<PayrollLine> {
    period(periods, month, year)
        .map(|p| {
            p.lines
                .iter()
                .filter(|l| in_department(employees, l.employee_id, department_id))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn payroll_previews(
    periods: &[PayrollPeriod],
    employees: &[Employee],
    month: u32,
    year: i32,
    department_id: Option<i32>,
) -> Vec<PayrollPreview> {
    period(periods, month, year)
        .map(|p| {
            p.previews
                .iter()
                .filter(|pv| in_department(employees, pv.employee_id, department_id))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn schedules_in(schedules: &[WorkSchedule], query: &RangeQuery) -> Vec<WorkSchedule> {
    let window = query.window();
    schedules
        .iter()
        .filter(|s| window.contains(s.schedule_date))
        .filter(|s| query.department_id.is_none() || s.department_id == query.department_id)
        .cloned()
        .collect()
}

pub(crate) fn employees_in(employees: &[Employee], department_id: Option<i32>) -> Vec<Employee> {
    employees
        .iter()
        .filter(|e| department_id.is_none() || e.department_id == department_id)
        .cloned()
        .collect()
}

/// Dataset-backed source with injectable failures, for tests and demos.
#[derive(Debug, Default)]
pub struct MemorySource {
    data: Dataset,
    failing_datasets: HashSet<&'static str>,
    failing_employees: HashSet<EmployeeId>,
    secondary_calls: AtomicUsize,
    looked_up: Mutex<Vec<EmployeeId>>,
}

impl MemorySource {
    pub fn new(data: Dataset) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// Make every call for `dataset` fail ("attendance", "leave", "payroll",
    /// "schedule", "directory").
    pub fn fail_dataset(mut self, dataset: &'static str) -> Self {
        self.failing_datasets.insert(dataset);
        self
    }

    /// Make per-employee lookups (monthly summary, leave balance) fail for `ids`.
    pub fn fail_employees(mut self, ids: impl IntoIterator<Item = EmployeeId>) -> Self {
        self.failing_employees.extend(ids);
        self
    }

    /// Number of per-employee lookups attempted so far.
    pub fn secondary_calls(&self) -> usize {
        self.secondary_calls.load(Ordering::SeqCst)
    }

    /// Employee ids looked up so far, in call order.
    pub fn looked_up(&self) -> Vec<EmployeeId> {
        self.looked_up.lock().map(|ids| ids.clone()).unwrap_or_default()
    }

    fn check(&self, dataset: &'static str) -> SourceResult<()> {
        if self.failing_datasets.contains(dataset) {
            return Err(SourceError::transport(format!("{dataset} service unavailable")));
        }
        Ok(())
    }

    fn check_employee(&self, employee_id: EmployeeId) -> SourceResult<()> {
        self.secondary_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut ids) = self.looked_up.lock() {
            ids.push(employee_id);
        }
        if self.failing_employees.contains(&employee_id) {
            return Err(SourceError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceSource for MemorySource {
    async fn attendance_page(&self, query: &RangeQuery, page: u32, size: u32) -> SourceResult<Page<AttendanceRecord>> {
        self.check("attendance")?;
        Ok(Page::slice(self.data.attendance_in(query), page, size))
    }

    async fn monthly_summary(
        &self,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> SourceResult<MonthlyAttendanceSummary> {
        self.check_employee(employee_id)?;
        self.data.monthly_summary(employee_id, year, month)
    }
}

#[async_trait]
impl LeaveSource for MemorySource {
    async fn leave_page(&self, page: u32, size: u32) -> SourceResult<Page<LeaveRequest>> {
        self.check("leave")?;
        Ok(Page::slice(self.data.leave_requests.clone(), page, size))
    }

    async fn leave_balances(&self, employee_id: EmployeeId, year: i32) -> SourceResult<Vec<LeaveBalance>> {
        self.check_employee(employee_id)?;
        Ok(self.data.balances_for(employee_id, year))
    }

    async fn leave_types(&self) -> SourceResult<Vec<LeaveType>> {
        self.check("directory")?;
        Ok(self.data.leave_types.clone())
    }
}

#[async_trait]
impl PayrollSource for MemorySource {
    async fn payroll_summary(&self, month: u32, year: i32, department_id: Option<i32>) -> SourceResult<Vec<PayrollLine>> {
        self.check("payroll")?;
        Ok(self.data.payroll_lines(month, year, department_id))
    }

    async fn payroll_previews(
        &self,
        month: u32,
        year: i32,
        department_id: Option<i32>,
    ) -> SourceResult<Vec<PayrollPreview>> {
        self.check("payroll")?;
        Ok(self.data.payroll_previews(month, year, department_id))
    }

    async fn allowance_definitions(&self) -> SourceResult<Vec<AllowanceDefinition>> {
        self.check("payroll")?;
        Ok(self.data.allowances.clone())
    }
}

#[async_trait]
impl ScheduleSource for MemorySource {
    async fn schedule_page(&self, query: &RangeQuery, page: u32, size: u32) -> SourceResult<Page<WorkSchedule>> {
        self.check("schedule")?;
        Ok(Page::slice(self.data.schedules_in(query), page, size))
    }

    async fn work_shifts(&self) -> SourceResult<Vec<WorkShift>> {
        self.check("directory")?;
        Ok(self.data.work_shifts.clone())
    }
}

#[async_trait]
impl DirectorySource for MemorySource {
    async fn employees(&self, department_id: Option<i32>) -> SourceResult<Vec<Employee>> {
        self.check("directory")?;
        Ok(self.data.employees_in(department_id))
    }

    async fn departments(&self) -> SourceResult<Vec<Department>> {
        self.check("directory")?;
        Ok(self.data.departments.clone())
    }
}
