use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::erp::Doctype;

/// Key Result Area. The document name is its title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kra {
    #[serde(default)]
    pub name: String,
    pub title: Option<String>,
}

impl Doctype for Kra {
    const DOCTYPE: &'static str = "KRA";
    const LIST_FIELDS: &'static [&'static str] = &["name", "title"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeFeedbackCriteria {
    #[serde(default)]
    pub name: String,
    pub criteria: Option<String>,
}

impl Doctype for EmployeeFeedbackCriteria {
    const DOCTYPE: &'static str = "Employee Feedback Criteria";
    const LIST_FIELDS: &'static [&'static str] = &["name", "criteria"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppraisalTemplate {
    #[serde(default)]
    pub name: String,
    pub template_title: Option<String>,
}

impl Doctype for AppraisalTemplate {
    const DOCTYPE: &'static str = "Appraisal Template";
    const LIST_FIELDS: &'static [&'static str] = &["name", "template_title"];
}

/// Appraisee row of an appraisal cycle. Unknown columns are carried through
/// so the row can be written back unchanged apart from its template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppraisalCycleEmployee {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub appraisal_template: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppraisalCycle {
    #[serde(default)]
    pub name: String,
    pub cycle_name: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub kra_evaluation_method: Option<String>,
    #[serde(default)]
    pub appraisees: Vec<AppraisalCycleEmployee>,
    pub modified: Option<String>,
}

impl Doctype for AppraisalCycle {
    const DOCTYPE: &'static str = "Appraisal Cycle";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "cycle_name",
        "company",
        "start_date",
        "end_date",
        "status",
        "kra_evaluation_method",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    #[serde(default)]
    pub name: String,
    pub employee: Option<String>,
    pub employee_name: Option<String>,
    pub appraisal_cycle: Option<String>,
    pub appraisal_template: Option<String>,
    pub status: Option<String>,
    pub final_score: Option<f64>,
    pub docstatus: Option<u8>,
}

impl Doctype for Appraisal {
    const DOCTYPE: &'static str = "Appraisal";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "employee",
        "employee_name",
        "appraisal_cycle",
        "appraisal_template",
        "status",
        "final_score",
        "docstatus",
    ];
}
