use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};
use validator::Validate;

use super::{non_blank, parse_date};
use crate::{
    erp::{Doctype, ErpClient, ErpError, ListQuery},
    errors::ServiceError,
    models::{LeaveApplication, LeaveType},
};

const LEAVE_BALANCE_METHOD: &str =
    "hrms.hr.doctype.leave_application.leave_application.get_leave_balance_on";

#[derive(Debug, Default, Deserialize)]
pub struct LeaveFilter {
    pub employee: Option<String>,
    pub status: Option<String>,
    pub leave_type: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct NewLeaveApplication {
    #[serde(default)]
    #[validate(length(min = 1, message = "employee is required"))]
    pub employee: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "leave_type is required"))]
    pub leave_type: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "from_date is required"))]
    pub from_date: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "to_date is required"))]
    pub to_date: String,
    #[serde(default)]
    pub half_day: bool,
    pub description: Option<String>,
    pub leave_approver: Option<String>,
}

/// Approval decision on a leave application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

impl LeaveDecision {
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.trim() {
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(ServiceError::BadRequest(format!(
                "status must be Approved or Rejected, got {:?}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaveBalanceQuery {
    pub employee: Option<String>,
    pub leave_type: Option<String>,
    /// Defaults to today.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveBalance {
    pub employee: String,
    pub leave_type: String,
    pub date: NaiveDate,
    pub balance: f64,
}

#[derive(Clone)]
pub struct LeaveService {
    erp: ErpClient,
}

impl LeaveService {
    pub fn new(erp: ErpClient) -> Self {
        Self { erp }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &LeaveFilter) -> Result<Vec<LeaveApplication>, ServiceError> {
        let query = ListQuery::new()
            .eq_opt("employee", non_blank(filter.employee.as_deref()))
            .eq_opt("status", non_blank(filter.status.as_deref()))
            .eq_opt("leave_type", non_blank(filter.leave_type.as_deref()))
            .order_by("from_date desc")
            .all();
        Ok(self.erp.get_list(query).await?)
    }

    #[instrument(skip(self, input), fields(employee = %input.employee))]
    pub async fn create(
        &self,
        input: NewLeaveApplication,
    ) -> Result<LeaveApplication, ServiceError> {
        let from = parse_date("from_date", &input.from_date)?;
        let to = parse_date("to_date", &input.to_date)?;
        if from > to {
            return Err(ServiceError::BadRequest(
                "from_date must not be after to_date".to_string(),
            ));
        }

        let mut body = json!({
            "employee": input.employee.trim(),
            "leave_type": input.leave_type.trim(),
            "from_date": from,
            "to_date": to,
            "half_day": u8::from(input.half_day),
            "status": "Open",
            "posting_date": Utc::now().date_naive(),
        });
        if input.half_day {
            body["half_day_date"] = json!(from);
        }
        if let Some(description) = non_blank(input.description.as_deref()) {
            body["description"] = json!(description);
        }
        if let Some(approver) = non_blank(input.leave_approver.as_deref()) {
            body["leave_approver"] = json!(approver);
        }

        let leave: LeaveApplication = self.erp.insert::<LeaveApplication, _>(&body).await?;
        info!(leave = %leave.name, "leave application created");
        Ok(leave)
    }

    /// Records the decision and submits the application.
    #[instrument(skip(self))]
    pub async fn decide(
        &self,
        id: &str,
        decision: LeaveDecision,
    ) -> Result<LeaveApplication, ServiceError> {
        let leave = self
            .erp
            .update::<LeaveApplication, _>(
                id,
                &json!({ "status": decision.as_str(), "docstatus": 1 }),
            )
            .await
            .map_err(|err| not_found_or(err, id))?;
        info!(leave = %id, status = decision.as_str(), "leave application decided");
        Ok(leave)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.erp
            .delete(LeaveApplication::DOCTYPE, id)
            .await
            .map_err(|err| not_found_or(err, id))
    }

    pub async fn types(&self) -> Result<Vec<LeaveType>, ServiceError> {
        Ok(self
            .erp
            .get_list(ListQuery::new().order_by("name asc").all())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn balance(&self, query: &LeaveBalanceQuery) -> Result<LeaveBalance, ServiceError> {
        let employee = non_blank(query.employee.as_deref())
            .ok_or_else(|| ServiceError::BadRequest("employee is required".to_string()))?;
        let leave_type = non_blank(query.leave_type.as_deref())
            .ok_or_else(|| ServiceError::BadRequest("leave_type is required".to_string()))?;
        let date = match non_blank(query.date.as_deref()) {
            Some(date) => parse_date("date", date)?,
            None => Utc::now().date_naive(),
        };

        let balance: Value = self
            .erp
            .get_method(
                LEAVE_BALANCE_METHOD,
                &[
                    ("employee", employee.to_string()),
                    ("leave_type", leave_type.to_string()),
                    ("date", date.to_string()),
                ],
            )
            .await?;

        Ok(LeaveBalance {
            employee: employee.to_string(),
            leave_type: leave_type.to_string(),
            date,
            balance: balance.as_f64().unwrap_or_default(),
        })
    }
}

fn not_found_or(err: ErpError, id: &str) -> ServiceError {
    if err.is_not_found() {
        ServiceError::NotFound(format!("Leave application {} not found", id))
    } else {
        err.into()
    }
}
