//! Payroll lines, previews and allowance definitions.

use serde::{Deserialize, Serialize};

use super::EmployeeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    Draft,
    Processed,
    Paid,
}

/// One employee's payroll for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollLine {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub employee_name: String,
    pub base_salary: f64,
    #[serde(default)]
    pub overtime_pay: f64,
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub deductions: f64,
    pub net_pay: f64,
    pub status: PayrollStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollItemKind {
    Allowance,
    Deduction,
}

/// A named line in a payroll preview breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollItem {
    pub name: String,
    pub kind: PayrollItemKind,
    pub amount: f64,
}

/// Calculated (not yet processed) payroll for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollPreview {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub items: Vec<PayrollItem>,
}

impl PayrollPreview {
    /// Whether any allowance or deduction line carries `name`.
    pub fn references(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceDefinition {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub amount: f64,
}
