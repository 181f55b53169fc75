use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::erp::Doctype;

/// One earning or deduction row on a salary slip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryDetail {
    #[serde(default)]
    pub salary_component: String,
    pub abbr: Option<String>,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalarySlip {
    #[serde(default)]
    pub name: String,
    pub employee: Option<String>,
    pub employee_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub posting_date: Option<NaiveDate>,
    pub payroll_entry: Option<String>,
    pub status: Option<String>,
    pub docstatus: Option<u8>,
    #[serde(default)]
    pub earnings: Vec<SalaryDetail>,
    #[serde(default)]
    pub deductions: Vec<SalaryDetail>,
    pub gross_pay: Option<f64>,
    pub total_deduction: Option<f64>,
    pub net_pay: Option<f64>,
    /// Site-specific fields (custom PF columns and the like).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Doctype for SalarySlip {
    const DOCTYPE: &'static str = "Salary Slip";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "employee",
        "employee_name",
        "start_date",
        "end_date",
        "posting_date",
        "payroll_entry",
        "status",
        "docstatus",
        "gross_pay",
        "total_deduction",
        "net_pay",
    ];
}

impl SalarySlip {
    /// Sum of the deduction rows booked against `component`.
    pub fn deduction(&self, component: &str) -> Option<f64> {
        let matching: Vec<f64> = self
            .deductions
            .iter()
            .filter(|d| d.salary_component == component || d.abbr.as_deref() == Some(component))
            .map(|d| d.amount)
            .collect();
        if matching.is_empty() {
            None
        } else {
            Some(matching.iter().sum())
        }
    }

    /// Numeric value of a custom field; numbers sent as strings are accepted.
    pub fn numeric_field(&self, field: &str) -> Option<f64> {
        match self.extra.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollEntry {
    #[serde(default)]
    pub name: String,
    pub posting_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub payroll_frequency: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub docstatus: Option<u8>,
}

impl Doctype for PayrollEntry {
    const DOCTYPE: &'static str = "Payroll Entry";
    const LIST_FIELDS: &'static [&'static str] = &[
        "name",
        "posting_date",
        "start_date",
        "end_date",
        "payroll_frequency",
        "company",
        "status",
        "docstatus",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slip() -> SalarySlip {
        serde_json::from_value(json!({
            "name": "SS-0001",
            "employee": "EMP-1",
            "gross_pay": 50000.0,
            "deductions": [
                { "salary_component": "Provident Fund", "abbr": "PF", "amount": 1800.0 },
                { "salary_component": "Professional Tax", "abbr": "PT", "amount": 200.0 }
            ],
            "employer_pf": "1950.5",
            "custom_flag": true
        }))
        .unwrap()
    }

    #[test]
    fn deduction_matches_component_or_abbreviation() {
        let slip = slip();
        assert_eq!(slip.deduction("Provident Fund"), Some(1800.0));
        assert_eq!(slip.deduction("PT"), Some(200.0));
        assert_eq!(slip.deduction("ESI"), None);
    }

    #[test]
    fn custom_numeric_fields_come_from_extra() {
        let slip = slip();
        assert_eq!(slip.numeric_field("employer_pf"), Some(1950.5));
        assert_eq!(slip.numeric_field("custom_flag"), None);
        assert_eq!(slip.numeric_field("absent"), None);
    }
}
