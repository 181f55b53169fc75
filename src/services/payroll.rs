use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{non_blank, parse_date};
use crate::{
    config::PayrollConfig,
    erp::{Doctype, ErpClient, ErpError, ErpResult, ListQuery},
    errors::ServiceError,
    models::{Employee, PayrollEntry, SalarySlip},
};

#[derive(Debug, Default, Deserialize)]
pub struct SalarySlipFilter {
    pub employee: Option<String>,
    pub payroll_entry: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct NewSalarySlip {
    #[serde(default)]
    #[validate(length(min = 1, message = "employee is required"))]
    pub employee: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "start_date is required"))]
    pub start_date: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "end_date is required"))]
    pub end_date: String,
    pub posting_date: Option<String>,
    pub payroll_frequency: Option<String>,
    pub salary_structure: Option<String>,
}

/// One employee's Provident Fund line in a payroll run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PfReportRow {
    pub salary_slip: String,
    pub employee: String,
    pub employee_name: Option<String>,
    pub uan: Option<String>,
    pub gross_pay: f64,
    pub employee_pf: f64,
    pub employer_pf: f64,
    pub total_pf: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PfTotals {
    pub gross_pay: f64,
    pub employee_pf: f64,
    pub employer_pf: f64,
    pub total_pf: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PfReport {
    pub payroll_entry: String,
    pub rows: Vec<PfReportRow>,
    pub totals: PfTotals,
    /// Slips that could not be loaded and were left out.
    pub skipped: usize,
}

#[derive(Clone)]
pub struct PayrollService {
    erp: ErpClient,
    config: PayrollConfig,
}

impl PayrollService {
    pub fn new(erp: ErpClient, config: PayrollConfig) -> Self {
        Self { erp, config }
    }

    #[instrument(skip(self))]
    pub async fn list_slips(
        &self,
        filter: &SalarySlipFilter,
    ) -> Result<Vec<SalarySlip>, ServiceError> {
        let query = ListQuery::new()
            .eq_opt("employee", non_blank(filter.employee.as_deref()))
            .eq_opt("payroll_entry", non_blank(filter.payroll_entry.as_deref()))
            .eq_opt("status", non_blank(filter.status.as_deref()))
            .order_by("start_date desc")
            .all();
        Ok(self.erp.get_list(query).await?)
    }

    pub async fn get_slip(&self, id: &str) -> Result<SalarySlip, ServiceError> {
        self.erp
            .find_doc(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Salary slip {} not found", id)))
    }

    /// Creates a draft slip. The ERP refuses a second slip for the same
    /// employee and period; that refusal is reported as a conflict.
    #[instrument(skip(self, input), fields(employee = %input.employee))]
    pub async fn create_slip(&self, input: NewSalarySlip) -> Result<SalarySlip, ServiceError> {
        let start = parse_date("start_date", &input.start_date)?;
        let end = parse_date("end_date", &input.end_date)?;
        if start > end {
            return Err(ServiceError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }

        let employee = input.employee.trim();
        let mut body = json!({
            "employee": employee,
            "start_date": start,
            "end_date": end,
        });
        if let Some(posting) = non_blank(input.posting_date.as_deref()) {
            body["posting_date"] = json!(parse_date("posting_date", posting)?);
        }
        if let Some(frequency) = non_blank(input.payroll_frequency.as_deref()) {
            body["payroll_frequency"] = json!(frequency);
        }
        if let Some(structure) = non_blank(input.salary_structure.as_deref()) {
            body["salary_structure"] = json!(structure);
        }

        let slip: SalarySlip = self
            .erp
            .insert::<SalarySlip, _>(&body)
            .await
            .map_err(|err| {
                ServiceError::from(err).conflict_on_duplicate(format!(
                    "Salary slip for {} already exists for {} to {}",
                    employee, start, end
                ))
            })?;
        info!(slip = %slip.name, "salary slip created");
        Ok(slip)
    }

    #[instrument(skip(self))]
    pub async fn submit_slip(&self, id: &str) -> Result<SalarySlip, ServiceError> {
        let slip = self
            .erp
            .update::<SalarySlip, _>(id, &json!({ "docstatus": 1 }))
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    ServiceError::NotFound(format!("Salary slip {} not found", id))
                } else {
                    err.into()
                }
            })?;
        info!(slip = %id, "salary slip submitted");
        Ok(slip)
    }

    pub async fn entries(&self) -> Result<Vec<PayrollEntry>, ServiceError> {
        Ok(self
            .erp
            .get_list(ListQuery::new().order_by("posting_date desc").all())
            .await?)
    }

    /// Builds the Provident Fund report for a payroll run.
    ///
    /// Slips are loaded concurrently. A slip whose detail or employee record
    /// cannot be fetched is skipped with a warning; if every slip fails the
    /// report is an error rather than an empty list.
    #[instrument(skip(self))]
    pub async fn pf_report(&self, payroll_entry: &str) -> Result<PfReport, ServiceError> {
        let payroll_entry = payroll_entry.trim();
        if payroll_entry.is_empty() {
            return Err(ServiceError::BadRequest(
                "payroll_entry is required".to_string(),
            ));
        }

        let slips: Vec<SalarySlip> = self
            .erp
            .get_list(
                ListQuery::new()
                    .eq("payroll_entry", payroll_entry)
                    .fields(&["name", "employee"])
                    .all(),
            )
            .await?;
        if slips.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No salary slips found for payroll entry {}",
                payroll_entry
            )));
        }

        let results = join_all(slips.iter().map(|slip| self.pf_row(slip))).await;
        let total = results.len();
        let rows: Vec<PfReportRow> = results
            .into_iter()
            .zip(&slips)
            .filter_map(|(result, slip)| match result {
                Ok(row) => Some(row),
                Err(err) => {
                    warn!(slip = %slip.name, error = %err, "salary slip left out of PF report");
                    None
                }
            })
            .collect();

        if rows.is_empty() {
            return Err(ServiceError::InternalError(format!(
                "PF report failed: none of the {} salary slips in {} could be loaded",
                total, payroll_entry
            )));
        }

        let totals = rows.iter().fold(PfTotals::default(), |mut acc, row| {
            acc.gross_pay += row.gross_pay;
            acc.employee_pf += row.employee_pf;
            acc.employer_pf += row.employer_pf;
            acc.total_pf += row.total_pf;
            acc
        });

        Ok(PfReport {
            payroll_entry: payroll_entry.to_string(),
            skipped: total - rows.len(),
            rows,
            totals,
        })
    }

    async fn pf_row(&self, summary: &SalarySlip) -> ErpResult<PfReportRow> {
        let employee = summary
            .employee
            .clone()
            .ok_or_else(|| ErpError::Decode(format!("slip {} has no employee", summary.name)))?;

        let (slip, uan) = futures::try_join!(
            self.erp.get_doc::<SalarySlip>(&summary.name),
            self.employee_uan(&employee)
        )?;

        let employee_pf = slip.deduction(&self.config.pf_component).unwrap_or_default();
        let employer_pf = slip
            .numeric_field(&self.config.employer_pf_field)
            .unwrap_or_default();

        Ok(PfReportRow {
            salary_slip: slip.name,
            employee,
            employee_name: slip.employee_name,
            uan,
            gross_pay: slip.gross_pay.unwrap_or_default(),
            employee_pf,
            employer_pf,
            total_pf: employee_pf + employer_pf,
        })
    }

    async fn employee_uan(&self, employee: &str) -> ErpResult<Option<String>> {
        let values: Map<String, Value> = self
            .erp
            .get_method(
                "frappe.client.get_value",
                &[
                    ("doctype", Employee::DOCTYPE.to_string()),
                    ("filters", employee.to_string()),
                    ("fieldname", self.config.uan_field.clone()),
                ],
            )
            .await?;
        Ok(match values.get(&self.config.uan_field) {
            Some(Value::String(uan)) if !uan.trim().is_empty() => Some(uan.trim().to_string()),
            Some(Value::Number(uan)) => Some(uan.to_string()),
            _ => None,
        })
    }
}
