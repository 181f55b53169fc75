use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::erp::Doctype;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub name: String,
    pub employee_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_joining: Option<NaiveDate>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    /// Manager's employee id.
    pub reports_to: Option<String>,
    pub holiday_list: Option<String>,
    pub company: Option<String>,
    pub user_id: Option<String>,
    pub company_email: Option<String>,
    pub cell_number: Option<String>,
}

impl Doctype for Employee {
    const DOCTYPE: &'static str = "Employee";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "employee_name",
        "first_name",
        "last_name",
        "gender",
        "date_of_joining",
        "designation",
        "department",
        "status",
        "reports_to",
        "holiday_list",
        "company",
        "user_id",
        "company_email",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Designation {
    #[serde(default)]
    pub name: String,
    pub designation_name: Option<String>,
    /// Template used when an appraisal cycle pulls in employees of this designation.
    pub appraisal_template: Option<String>,
}

impl Doctype for Designation {
    const DOCTYPE: &'static str = "Designation";
    const LIST_FIELDS: &'static [&'static str] =
        &["name", "designation_name", "appraisal_template"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(default)]
    pub name: String,
    pub department_name: Option<String>,
    pub company: Option<String>,
    pub parent_department: Option<String>,
}

impl Doctype for Department {
    const DOCTYPE: &'static str = "Department";
    const LIST_FIELDS: &'static [&'static str] =
        &["name", "department_name", "company", "parent_department"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(default)]
    pub name: String,
    pub bank_name: Option<String>,
}

impl Doctype for Bank {
    const DOCTYPE: &'static str = "Bank";
    const LIST_FIELDS: &'static [&'static str] = &["name", "bank_name"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    #[serde(default)]
    pub name: String,
    pub account_name: Option<String>,
    pub bank: Option<String>,
    pub bank_account_no: Option<String>,
    pub branch_code: Option<String>,
    pub party_type: Option<String>,
    pub party: Option<String>,
    pub is_default: Option<u8>,
    pub is_company_account: Option<u8>,
}

impl Doctype for BankAccount {
    const DOCTYPE: &'static str = "Bank Account";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "account_name",
        "bank",
        "bank_account_no",
        "branch_code",
        "party_type",
        "party",
        "is_default",
        "is_company_account",
    ];
}
