use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::erp::Doctype;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveApplication {
    #[serde(default)]
    pub name: String,
    pub employee: Option<String>,
    pub employee_name: Option<String>,
    pub leave_type: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub total_leave_days: Option<f64>,
    pub half_day: Option<u8>,
    pub description: Option<String>,
    pub leave_approver: Option<String>,
    pub status: Option<String>,
    /// 0 = draft, 1 = submitted, 2 = cancelled.
    pub docstatus: Option<u8>,
}

impl Doctype for LeaveApplication {
    const DOCTYPE: &'static str = "Leave Application";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "employee",
        "employee_name",
        "leave_type",
        "from_date",
        "to_date",
        "total_leave_days",
        "half_day",
        "description",
        "leave_approver",
        "status",
        "docstatus",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveType {
    #[serde(default)]
    pub name: String,
    pub max_leaves_allowed: Option<f64>,
    pub is_lwp: Option<u8>,
    pub is_carry_forward: Option<u8>,
}

impl Doctype for LeaveType {
    const DOCTYPE: &'static str = "Leave Type";
    const LIST_FIELDS: &'static [&'static str] =
        &["name", "max_leaves_allowed", "is_lwp", "is_carry_forward"];
}
