use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};
use validator::Validate;

use super::{non_blank, parse_date};
use crate::{
    erp::{ErpClient, ErpResult, ListQuery},
    errors::ServiceError,
    models::{ExpenseClaim, InvoiceKind, InvoiceSummary, PurchaseInvoice, SalesInvoice},
};

const RECENT_INVOICES: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    /// Defaults to sales.
    pub kind: Option<InvoiceKind>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InvoiceItem {
    #[serde(default)]
    pub item_code: String,
    pub qty: f64,
    pub rate: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewInvoice {
    /// Customer for sales invoices, supplier for purchase invoices.
    #[serde(default)]
    #[validate(length(min = 1, message = "party is required"))]
    pub party: String,
    pub posting_date: Option<String>,
    pub due_date: Option<String>,
    pub company: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<InvoiceItem>,
}

/// One side (receivable or payable) of the accounting dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSide {
    pub invoice_count: usize,
    pub total_invoiced: f64,
    pub outstanding: f64,
    pub status_counts: BTreeMap<String, usize>,
    pub recent: Vec<InvoiceSummary>,
}

impl LedgerSide {
    /// Aggregates invoices already ordered newest first.
    fn from_invoices(invoices: Vec<InvoiceSummary>) -> Self {
        let mut side = LedgerSide {
            invoice_count: invoices.len(),
            ..Default::default()
        };
        for invoice in &invoices {
            side.total_invoiced += invoice.grand_total;
            side.outstanding += invoice.outstanding_amount;
            let status = invoice.status.clone().unwrap_or_else(|| "Unknown".to_string());
            *side.status_counts.entry(status).or_default() += 1;
        }
        side.recent = invoices.into_iter().take(RECENT_INVOICES).collect();
        side
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountingDashboard {
    pub receivables: LedgerSide,
    pub payables: LedgerSide,
    /// Receivable minus payable outstanding.
    pub net_position: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseClaimFilter {
    pub employee: Option<String>,
    pub status: Option<String>,
    pub approval_status: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExpenseItem {
    #[serde(default)]
    pub expense_type: String,
    pub expense_date: Option<String>,
    pub description: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewExpenseClaim {
    #[serde(default)]
    #[validate(length(min = 1, message = "employee is required"))]
    pub employee: String,
    pub expense_approver: Option<String>,
    pub posting_date: Option<String>,
    pub company: Option<String>,
    /// Forwarded as `total_amount`; defaults to the sum of the rows.
    pub total_claimed_amount: Option<f64>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one expense is required"))]
    pub expenses: Vec<ExpenseItem>,
}

#[derive(Clone)]
pub struct AccountingService {
    erp: ErpClient,
    default_company: Option<String>,
}

impl AccountingService {
    pub fn new(erp: ErpClient, default_company: Option<String>) -> Self {
        Self {
            erp,
            default_company,
        }
    }

    fn company<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        non_blank(requested).or(self.default_company.as_deref())
    }

    async fn fetch_invoices(
        &self,
        kind: InvoiceKind,
        status: Option<&str>,
    ) -> ErpResult<Vec<InvoiceSummary>> {
        let query = ListQuery::new()
            .filter("docstatus", "!=", 2)
            .eq_opt("status", status)
            .order_by("posting_date desc")
            .all();
        Ok(match kind {
            InvoiceKind::Sales => self
                .erp
                .get_list::<SalesInvoice>(query)
                .await?
                .into_iter()
                .map(InvoiceSummary::from)
                .collect(),
            InvoiceKind::Purchase => self
                .erp
                .get_list::<PurchaseInvoice>(query)
                .await?
                .into_iter()
                .map(InvoiceSummary::from)
                .collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> Result<Vec<InvoiceSummary>, ServiceError> {
        let kind = filter.kind.unwrap_or(InvoiceKind::Sales);
        Ok(self
            .fetch_invoices(kind, non_blank(filter.status.as_deref()))
            .await?)
    }

    #[instrument(skip(self, input), fields(party = %input.party))]
    pub async fn create_invoice(
        &self,
        kind: InvoiceKind,
        input: NewInvoice,
    ) -> Result<InvoiceSummary, ServiceError> {
        let posting_date = optional_date("posting_date", input.posting_date.as_deref())?
            .unwrap_or_else(|| Utc::now().date_naive());
        let due_date = optional_date("due_date", input.due_date.as_deref())?;
        if due_date.map_or(false, |due| due < posting_date) {
            return Err(ServiceError::BadRequest(
                "due_date must not be before posting_date".to_string(),
            ));
        }

        for (idx, item) in input.items.iter().enumerate() {
            if item.item_code.trim().is_empty() || item.qty <= 0.0 {
                return Err(ServiceError::BadRequest(format!(
                    "items[{}] needs an item_code and a positive qty",
                    idx
                )));
            }
        }

        let mut body = json!({
            "posting_date": posting_date,
            "items": input.items,
        });
        body[kind.party_field()] = json!(input.party.trim());
        if let Some(due) = due_date {
            body["due_date"] = json!(due);
        }
        if let Some(company) = self.company(input.company.as_deref()) {
            body["company"] = json!(company);
        }

        let summary = match kind {
            InvoiceKind::Sales => {
                InvoiceSummary::from(self.erp.insert::<SalesInvoice, _>(&body).await?)
            }
            InvoiceKind::Purchase => {
                InvoiceSummary::from(self.erp.insert::<PurchaseInvoice, _>(&body).await?)
            }
        };
        info!(invoice = %summary.id, doctype = kind.doctype(), "invoice created");
        Ok(summary)
    }

    /// Receivable and payable summaries, fetched concurrently.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<AccountingDashboard, ServiceError> {
        let (sales, purchases) = futures::try_join!(
            self.fetch_invoices(InvoiceKind::Sales, None),
            self.fetch_invoices(InvoiceKind::Purchase, None)
        )?;
        let receivables = LedgerSide::from_invoices(sales);
        let payables = LedgerSide::from_invoices(purchases);
        Ok(AccountingDashboard {
            net_position: receivables.outstanding - payables.outstanding,
            receivables,
            payables,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_expense_claims(
        &self,
        filter: &ExpenseClaimFilter,
    ) -> Result<Vec<ExpenseClaim>, ServiceError> {
        let query = ListQuery::new()
            .eq_opt("employee", non_blank(filter.employee.as_deref()))
            .eq_opt("status", non_blank(filter.status.as_deref()))
            .eq_opt("approval_status", non_blank(filter.approval_status.as_deref()))
            .order_by("posting_date desc")
            .all();
        Ok(self.erp.get_list(query).await?)
    }

    #[instrument(skip(self, input), fields(employee = %input.employee))]
    pub async fn create_expense_claim(
        &self,
        input: NewExpenseClaim,
    ) -> Result<ExpenseClaim, ServiceError> {
        let posting_date = optional_date("posting_date", input.posting_date.as_deref())?
            .unwrap_or_else(|| Utc::now().date_naive());

        let mut rows = Vec::with_capacity(input.expenses.len());
        for (idx, expense) in input.expenses.iter().enumerate() {
            if expense.expense_type.trim().is_empty() || expense.amount < 0.0 {
                return Err(ServiceError::BadRequest(format!(
                    "expenses[{}] needs an expense_type and a non-negative amount",
                    idx
                )));
            }
            let date = optional_date("expense_date", expense.expense_date.as_deref())?
                .unwrap_or(posting_date);
            rows.push(json!({
                "expense_date": date,
                "expense_type": expense.expense_type.trim(),
                "description": non_blank(expense.description.as_deref()),
                "amount": expense.amount,
                "sanctioned_amount": expense.amount,
            }));
        }
        let total = input
            .total_claimed_amount
            .unwrap_or_else(|| input.expenses.iter().map(|e| e.amount).sum());

        let mut body = json!({
            "employee": input.employee.trim(),
            "posting_date": posting_date,
            "expenses": rows,
            "total_amount": total,
        });
        if let Some(approver) = non_blank(input.expense_approver.as_deref()) {
            body["expense_approver"] = json!(approver);
        }
        if let Some(company) = self.company(input.company.as_deref()) {
            body["company"] = json!(company);
        }

        let claim: ExpenseClaim = self.erp.insert::<ExpenseClaim, _>(&body).await?;
        info!(claim = %claim.name, "expense claim created");
        Ok(claim)
    }
}

fn optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ServiceError> {
    non_blank(value).map(|v| parse_date(field, v)).transpose()
}

/// Expense claims as returned to clients: the claimed total is exposed as
/// `total_amount`.
pub fn expense_claim_view(claim: &ExpenseClaim) -> Value {
    let mut value = serde_json::to_value(claim).unwrap_or(Value::Null);
    if let Some(map) = value.as_object_mut() {
        if let Some(total) = map.remove("total_claimed_amount") {
            map.insert("total_amount".to_string(), total);
        }
    }
    value
}
