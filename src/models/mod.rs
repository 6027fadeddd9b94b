//! Records consumed from the attendance, leave, payroll, scheduling and
//! directory services.

pub mod attendance;
pub mod department;
pub mod duration;
pub mod employee;
pub mod leave;
pub mod payroll;
pub mod schedule;

/// Employee identity shared by every dataset.
pub type EmployeeId = i32;

pub use attendance::{AttendanceRecord, AttendanceStatus, MonthlyAttendanceSummary};
pub use department::Department;
pub use employee::Employee;
pub use leave::{LeaveBalance, LeaveRequest, LeaveStatus, LeaveType};
pub use payroll::{AllowanceDefinition, PayrollItem, PayrollItemKind, PayrollLine, PayrollPreview, PayrollStatus};
pub use schedule::{ScheduleStatus, WorkSchedule, WorkShift};
