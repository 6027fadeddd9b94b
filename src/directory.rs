//! Id → name resolution for employees, departments, shifts and leave types.

use std::collections::HashMap;

use crate::models::{Department, Employee, EmployeeId, LeaveType, WorkShift};

/// Reference data loaded alongside a report's primary datasets.
///
/// Any part may be empty when its lookup failed; accessors then fall back to
/// an empty name or the raw id.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    employees: HashMap<EmployeeId, Employee>,
    departments: HashMap<i32, String>,
    work_shifts: HashMap<i32, String>,
    leave_types: HashMap<i32, String>,
}

impl Directory {
    pub fn new(
        employees: Option<Vec<Employee>>,
        departments: Vec<Department>,
        work_shifts: Vec<WorkShift>,
        leave_types: Vec<LeaveType>,
    ) -> Self {
        Self {
            employees: employees.unwrap_or_default().into_iter().map(|e| (e.id, e)).collect(),
            departments: departments.into_iter().map(|d| (d.id, d.name)).collect(),
            work_shifts: work_shifts.into_iter().map(|s| (s.id, s.name)).collect(),
            leave_types: leave_types.into_iter().map(|t| (t.id, t.name)).collect(),
        }
    }

    pub fn employee_name(&self, id: EmployeeId) -> String {
        self.employees.get(&id).map(|e| e.full_name.clone()).unwrap_or_default()
    }

    pub fn department_name(&self, id: i32) -> String {
        self.departments.get(&id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn shift_name(&self, id: i32) -> String {
        self.work_shifts.get(&id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn leave_type_name(&self, id: i32) -> String {
        self.leave_types.get(&id).cloned().unwrap_or_else(|| id.to_string())
    }
}
