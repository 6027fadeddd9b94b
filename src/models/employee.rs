//! Employee directory entries.

use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// Employee as returned by the organization directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default)]
    pub employee_code: String,
    pub full_name: String,
    #[serde(default)]
    pub department_id: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
