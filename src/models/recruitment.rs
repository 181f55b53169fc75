use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::erp::Doctype;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOpening {
    #[serde(default)]
    pub name: String,
    pub job_title: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub vacancies: Option<u32>,
    pub posted_on: Option<String>,
    pub closes_on: Option<NaiveDate>,
    pub company: Option<String>,
    pub description: Option<String>,
}

impl Doctype for JobOpening {
    const DOCTYPE: &'static str = "Job Opening";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "job_title",
        "designation",
        "department",
        "status",
        "vacancies",
        "posted_on",
        "closes_on",
        "company",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobApplicant {
    #[serde(default)]
    pub name: String,
    pub applicant_name: Option<String>,
    pub email_id: Option<String>,
    pub phone_number: Option<String>,
    /// Job Opening this applicant applied to.
    pub job_title: Option<String>,
    pub designation: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
}

impl Doctype for JobApplicant {
    const DOCTYPE: &'static str = "Job Applicant";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "applicant_name",
        "email_id",
        "phone_number",
        "job_title",
        "designation",
        "status",
        "source",
    ];
}
